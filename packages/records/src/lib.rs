// Trade Records - schema-driven active records
//
// A `Record` maps one table row to text fields and generates its own
// SELECT/INSERT/UPDATE/DELETE from table metadata. Concrete tables for the
// buy/sell feature live in domains/trade.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use common::{ColumnDef, ColumnType, RecordError, Statement, TableSchema};
pub use config::*;
pub use domains::record::Record;
pub use kernel::{BaseDatabase, MockDatabase, PgDatabase};
