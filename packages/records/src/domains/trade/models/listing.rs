use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use uuid::Uuid;

use crate::common::{ColumnDef, ColumnType, RecordError, TableSchema};
use crate::domains::record::Record;
use crate::kernel::BaseDatabase;

lazy_static! {
    static ref LISTING_SCHEMA: Arc<TableSchema> = Arc::new(
        TableSchema::new(
            "listings",
            vec![
                ColumnDef::new("id", ColumnType::BigInt),
                ColumnDef::new("seller_id", ColumnType::Uuid),
                ColumnDef::new("side", ColumnType::Text).with_default("sell"),
                ColumnDef::new("title", ColumnType::Text),
                ColumnDef::new("description", ColumnType::Text),
                ColumnDef::new("price", ColumnType::Numeric),
                ColumnDef::new("quantity", ColumnType::Integer).with_default("1"),
                ColumnDef::new("active", ColumnType::Boolean).with_default("true"),
                ColumnDef::new("created_at", ColumnType::Timestamp),
            ],
            &["id"],
            &["id", "created_at"],
        )
        .unwrap()
    );
}

/// Whether a listing offers to buy or to sell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingSide {
    Buy,
    Sell,
}

impl std::fmt::Display for ListingSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingSide::Buy => write!(f, "buy"),
            ListingSide::Sell => write!(f, "sell"),
        }
    }
}

impl std::str::FromStr for ListingSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "buy" => Ok(ListingSide::Buy),
            "sell" => Ok(ListingSide::Sell),
            _ => Err(anyhow::anyhow!("Invalid listing side: {}", s)),
        }
    }
}

/// Listing record - one buy or sell post on the trade board
///
/// Typed accessors over the generic record; `Deref` exposes the record's
/// CRUD operations and raw field access.
#[derive(Debug, Clone)]
pub struct Listing {
    record: Record,
}

impl Listing {
    pub fn schema() -> Arc<TableSchema> {
        LISTING_SCHEMA.clone()
    }

    pub fn new(db: Arc<dyn BaseDatabase>) -> Self {
        Self {
            record: Record::new(Self::schema(), db),
        }
    }

    /// Load a listing by ID
    pub async fn find_by_id(id: i64, db: Arc<dyn BaseDatabase>) -> Result<Self, RecordError> {
        let mut listing = Self::new(db);
        listing.record.set("id", id.to_string())?;
        listing.record.read_record().await?;
        Ok(listing)
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    /// Database-assigned ID; `None` until the row has been read back
    pub fn id(&self) -> Result<Option<i64>, RecordError> {
        self.record.get_as("id")
    }

    pub fn set_id(&mut self, id: i64) -> Result<(), RecordError> {
        self.record.set("id", id.to_string())
    }

    pub fn seller_id(&self) -> Result<Option<Uuid>, RecordError> {
        self.record.get_as("seller_id")
    }

    pub fn set_seller_id(&mut self, seller_id: Uuid) -> Result<(), RecordError> {
        self.record.set("seller_id", seller_id.to_string())
    }

    pub fn side(&self) -> Result<ListingSide, RecordError> {
        self.record
            .get_as::<ListingSide>("side")?
            .ok_or_else(|| RecordError::InvalidValue {
                column: "side".to_string(),
                ty: ColumnType::Text.to_string(),
                reason: "side is empty".to_string(),
            })
    }

    pub fn set_side(&mut self, side: ListingSide) -> Result<(), RecordError> {
        self.record.set("side", side.to_string())
    }

    pub fn title(&self) -> Result<&str, RecordError> {
        self.record.get("title")
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), RecordError> {
        self.record.set("title", title)
    }

    pub fn description(&self) -> Result<&str, RecordError> {
        self.record.get("description")
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), RecordError> {
        self.record.set("description", description)
    }

    pub fn price(&self) -> Result<Option<Decimal>, RecordError> {
        self.record.get_as("price")
    }

    pub fn set_price(&mut self, price: Decimal) -> Result<(), RecordError> {
        self.record.set("price", price.to_string())
    }

    pub fn quantity(&self) -> Result<Option<i32>, RecordError> {
        self.record.get_as("quantity")
    }

    pub fn set_quantity(&mut self, quantity: i32) -> Result<(), RecordError> {
        self.record.set("quantity", quantity.to_string())
    }

    pub fn active(&self) -> Result<bool, RecordError> {
        Ok(self.record.get_as("active")?.unwrap_or(false))
    }

    pub fn set_active(&mut self, active: bool) -> Result<(), RecordError> {
        self.record.set("active", active.to_string())
    }

    pub fn created_at(&self) -> Result<Option<DateTime<Utc>>, RecordError> {
        self.record.get_as("created_at")
    }

    /// Take the listing off the board
    pub async fn deactivate(&mut self) -> Result<(), RecordError> {
        self.set_active(false)?;
        self.record.write_record().await
    }
}

impl Deref for Listing {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.record
    }
}

impl DerefMut for Listing {
    fn deref_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
