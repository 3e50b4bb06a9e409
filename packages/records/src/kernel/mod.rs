// Kernel - infrastructure the records run on
//
// BaseDatabase is the seam; PgDatabase is production, MockDatabase is for tests.

pub mod postgres;
pub mod test_dependencies;
pub mod traits;

pub use postgres::PgDatabase;
pub use test_dependencies::MockDatabase;
pub use traits::{BaseDatabase, Row};
