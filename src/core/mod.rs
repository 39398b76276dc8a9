// Core modules implementing the typed table store, its codec, and error modeling.
pub mod codec;
pub mod database;
pub mod error;
pub mod field_type;
pub mod row;
pub mod schema;
pub mod table;
pub mod value;
