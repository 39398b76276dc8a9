// Named collection of uniquely named tables, kept in creation order.
// Creation order is also the order tables are written by the codec.
use tracing::debug;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::schema::Schema;
use crate::core::table::Table;

#[derive(Clone, Debug, PartialEq)]
pub struct Database {
    name: String,
    tables: Vec<Table>,
}

impl Database {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_table(&mut self, name: impl Into<String>, schema: Schema) -> Result<&mut Table> {
        let name = name.into();
        if self.contains_table(&name) {
            return Err(Error::new(ErrorKind::DuplicateTable)
                .with_message(format!("table '{name}' already exists"))
                .with_table(name));
        }
        debug!(database = %self.name, table = %name, schema = %schema, "table created");
        self.tables.push(Table::new(name, schema));
        let created = self.tables.len() - 1;
        Ok(&mut self.tables[created])
    }

    /// Parses `declaration` and creates the table; nothing is created on a schema error.
    pub fn create_table_from_declaration(
        &mut self,
        name: impl Into<String>,
        declaration: &str,
    ) -> Result<&mut Table> {
        let name = name.into();
        let schema = Schema::parse(declaration).map_err(|err| err.with_table(name.clone()))?;
        self.create_table(name, schema)
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name() == name)
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|table| table.name() == name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(Table::name).collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    // Used by the codec, which has already rejected duplicate names.
    pub(crate) fn from_tables(name: impl Into<String>, tables: Vec<Table>) -> Self {
        Self {
            name: name.into(),
            tables,
        }
    }
}
