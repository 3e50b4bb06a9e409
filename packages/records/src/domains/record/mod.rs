// Generic active record: one table row, schema-driven CRUD

pub mod models;

pub use models::Record;
