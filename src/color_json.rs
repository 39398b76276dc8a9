//! Purpose: Pretty-print CLI JSON output, optionally with ANSI colors.
//! Exports: colorize_json.
//! Role: Pure formatter behind `emit_json` when stdout is a terminal.
//! Invariants: Without color the text is byte-identical to `serde_json::to_string_pretty`.
use serde_json::{Map, Value};

const INDENT: &str = "  ";

#[derive(Copy, Clone)]
enum Tone {
    Key,
    Text,
    Number,
    Literal,
    Plain,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Key => "36",
            Tone::Text => "32",
            Tone::Number => "33",
            Tone::Literal => "35",
            Tone::Plain => "39",
        }
    }
}

struct Painter {
    out: String,
    use_color: bool,
}

pub fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut painter = Painter {
        out: String::new(),
        use_color,
    };
    painter.value(value, 0);
    painter.out
}

impl Painter {
    fn value(&mut self, value: &Value, depth: usize) {
        match value {
            Value::Null => self.paint("null", Tone::Plain),
            Value::Bool(flag) => self.paint(if *flag { "true" } else { "false" }, Tone::Literal),
            Value::Number(number) => self.paint(&number.to_string(), Tone::Number),
            Value::String(text) => self.quoted(text, Tone::Text),
            Value::Array(items) => {
                self.sequence(("[", "]"), items.len(), depth, |painter, idx| {
                    painter.value(&items[idx], depth + 1);
                });
            }
            Value::Object(map) => self.object(map, depth),
        }
    }

    fn object(&mut self, map: &Map<String, Value>, depth: usize) {
        let entries: Vec<(&String, &Value)> = map.iter().collect();
        self.sequence(("{", "}"), entries.len(), depth, |painter, idx| {
            let (key, value) = entries[idx];
            painter.quoted(key, Tone::Key);
            painter.paint(":", Tone::Plain);
            painter.out.push(' ');
            painter.value(value, depth + 1);
        });
    }

    fn sequence<F>(&mut self, (open, close): (&str, &str), len: usize, depth: usize, mut item: F)
    where
        F: FnMut(&mut Self, usize),
    {
        if len == 0 {
            self.paint(&format!("{open}{close}"), Tone::Plain);
            return;
        }
        self.paint(open, Tone::Plain);
        for idx in 0..len {
            self.out.push('\n');
            self.out.push_str(&INDENT.repeat(depth + 1));
            item(self, idx);
            if idx + 1 < len {
                self.paint(",", Tone::Plain);
            }
        }
        self.out.push('\n');
        self.out.push_str(&INDENT.repeat(depth));
        self.paint(close, Tone::Plain);
    }

    fn quoted(&mut self, text: &str, tone: Tone) {
        let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
        self.paint(&encoded, tone);
    }

    fn paint(&mut self, text: &str, tone: Tone) {
        if self.use_color {
            self.out.push_str(&format!("\u{1b}[{}m{text}\u{1b}[0m", tone.code()));
        } else {
            self.out.push_str(text);
        }
    }
}
