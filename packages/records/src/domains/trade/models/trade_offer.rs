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
    // One offer per buyer per listing
    static ref TRADE_OFFER_SCHEMA: Arc<TableSchema> = Arc::new(
        TableSchema::new(
            "trade_offers",
            vec![
                ColumnDef::new("listing_id", ColumnType::BigInt),
                ColumnDef::new("buyer_id", ColumnType::Uuid),
                ColumnDef::new("amount", ColumnType::Numeric),
                ColumnDef::new("status", ColumnType::Text).with_default("pending"),
                ColumnDef::new("created_at", ColumnType::Timestamp),
            ],
            &["listing_id", "buyer_id"],
            &["created_at"],
        )
        .unwrap()
    );
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Pending => write!(f, "pending"),
            OfferStatus::Accepted => write!(f, "accepted"),
            OfferStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid offer status: {}", s)),
        }
    }
}

/// Trade offer record - a buyer's bid on a listing
#[derive(Debug, Clone)]
pub struct TradeOffer {
    record: Record,
}

impl TradeOffer {
    pub fn schema() -> Arc<TableSchema> {
        TRADE_OFFER_SCHEMA.clone()
    }

    pub fn new(db: Arc<dyn BaseDatabase>) -> Self {
        Self {
            record: Record::new(Self::schema(), db),
        }
    }

    pub async fn find(
        listing_id: i64,
        buyer_id: Uuid,
        db: Arc<dyn BaseDatabase>,
    ) -> Result<Self, RecordError> {
        let mut offer = Self::new(db);
        offer.set_listing_id(listing_id)?;
        offer.set_buyer_id(buyer_id)?;
        offer.record.read_record().await?;
        Ok(offer)
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    pub fn listing_id(&self) -> Result<Option<i64>, RecordError> {
        self.record.get_as("listing_id")
    }

    pub fn set_listing_id(&mut self, listing_id: i64) -> Result<(), RecordError> {
        self.record.set("listing_id", listing_id.to_string())
    }

    pub fn buyer_id(&self) -> Result<Option<Uuid>, RecordError> {
        self.record.get_as("buyer_id")
    }

    pub fn set_buyer_id(&mut self, buyer_id: Uuid) -> Result<(), RecordError> {
        self.record.set("buyer_id", buyer_id.to_string())
    }

    pub fn amount(&self) -> Result<Option<Decimal>, RecordError> {
        self.record.get_as("amount")
    }

    pub fn set_amount(&mut self, amount: Decimal) -> Result<(), RecordError> {
        self.record.set("amount", amount.to_string())
    }

    pub fn status(&self) -> Result<OfferStatus, RecordError> {
        self.record
            .get_as::<OfferStatus>("status")?
            .ok_or_else(|| RecordError::InvalidValue {
                column: "status".to_string(),
                ty: ColumnType::Text.to_string(),
                reason: "status is empty".to_string(),
            })
    }

    pub fn set_status(&mut self, status: OfferStatus) -> Result<(), RecordError> {
        self.record.set("status", status.to_string())
    }

    pub fn created_at(&self) -> Result<Option<DateTime<Utc>>, RecordError> {
        self.record.get_as("created_at")
    }

    /// Mark the offer accepted and persist it
    pub async fn accept(&mut self) -> Result<(), RecordError> {
        self.set_status(OfferStatus::Accepted)?;
        self.record.write_record().await
    }

    /// Mark the offer rejected and persist it
    pub async fn reject(&mut self) -> Result<(), RecordError> {
        self.set_status(OfferStatus::Rejected)?;
        self.record.write_record().await
    }
}

impl Deref for TradeOffer {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.record
    }
}

impl DerefMut for TradeOffer {
    fn deref_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
