//! Trade domain - buy/sell listings and the offers made on them

pub mod models;

use std::sync::Arc;

use crate::common::TableSchema;

// Re-export commonly used types
pub use models::{Listing, ListingSide, OfferStatus, TradeOffer};

/// Every table the trade feature persists.
pub fn tables() -> Vec<Arc<TableSchema>> {
    vec![Listing::schema(), TradeOffer::schema()]
}

/// Look up a trade table schema by name.
pub fn schema_for(table: &str) -> Option<Arc<TableSchema>> {
    tables().into_iter().find(|schema| schema.table() == table)
}
