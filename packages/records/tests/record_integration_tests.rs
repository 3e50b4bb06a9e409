//! Integration tests for records against a real Postgres.
//!
//! Covers the full CRUD cycle through `PgDatabase`, typed binding and
//! decoding, composite keys, and failure reporting.

mod common;

use crate::common::TestHarness;
use records::domains::trade::{Listing, ListingSide, OfferStatus, TradeOffer};
use records::RecordError;
use rust_decimal::Decimal;
use test_context::test_context;
use uuid::Uuid;

/// Create a listing for a fresh seller and return (listing id, seller id).
async fn create_listing(ctx: &TestHarness, title: &str) -> (i64, Uuid) {
    let seller = Uuid::new_v4();
    let mut listing = Listing::new(ctx.db());
    listing.set_seller_id(seller).unwrap();
    listing.set_side(ListingSide::Sell).unwrap();
    listing.set_title(title).unwrap();
    listing.set_price(Decimal::new(1250, 2)).unwrap();
    listing.set_quantity(3).unwrap();

    listing.create_record().await.expect("Failed to create listing");

    // Auto columns are not returned by an insert
    let id: i64 = sqlx::query_scalar("SELECT id FROM listings WHERE seller_id = $1")
        .bind(seller)
        .fetch_one(&ctx.db_pool)
        .await
        .expect("Failed to look up listing id");

    (id, seller)
}

// =============================================================================
// Listing CRUD
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn create_then_read_listing_round_trips_typed_values(ctx: &TestHarness) {
    let (id, seller) = create_listing(ctx, "Brass lamp").await;

    let listing = Listing::find_by_id(id, ctx.db()).await.unwrap();

    assert_eq!(listing.id().unwrap(), Some(id));
    assert_eq!(listing.seller_id().unwrap(), Some(seller));
    assert_eq!(listing.side().unwrap(), ListingSide::Sell);
    assert_eq!(listing.title().unwrap(), "Brass lamp");
    assert_eq!(listing.price().unwrap(), Some(Decimal::new(1250, 2)));
    assert_eq!(listing.quantity().unwrap(), Some(3));
    assert!(listing.active().unwrap());
    assert!(listing.created_at().unwrap().is_some());
    assert!(listing.last_error().is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn write_listing_updates_row(ctx: &TestHarness) {
    let (id, _) = create_listing(ctx, "Old title").await;
    let mut listing = Listing::find_by_id(id, ctx.db()).await.unwrap();

    listing.set_title("New title").unwrap();
    listing.set_price(Decimal::new(999, 2)).unwrap();
    listing.write_record().await.unwrap();

    let reloaded = Listing::find_by_id(id, ctx.db()).await.unwrap();
    assert_eq!(reloaded.title().unwrap(), "New title");
    assert_eq!(reloaded.price().unwrap(), Some(Decimal::new(999, 2)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deactivate_listing_persists(ctx: &TestHarness) {
    let (id, _) = create_listing(ctx, "Bike").await;
    let mut listing = Listing::find_by_id(id, ctx.db()).await.unwrap();

    listing.deactivate().await.unwrap();

    let active: bool = sqlx::query_scalar("SELECT active FROM listings WHERE id = $1")
        .bind(id)
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert!(!active);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn delete_listing_then_read_reports_not_found(ctx: &TestHarness) {
    let (id, _) = create_listing(ctx, "Chair").await;
    let mut listing = Listing::find_by_id(id, ctx.db()).await.unwrap();

    listing.delete_record().await.unwrap();

    let err = listing.read_record().await.unwrap_err();
    assert!(matches!(err, RecordError::NotFound(_)));
    assert!(listing.last_error().is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn write_missing_listing_affects_no_rows(ctx: &TestHarness) {
    let mut listing = Listing::new(ctx.db());
    listing.set_id(i64::MAX).unwrap();
    listing.set_title("Ghost").unwrap();

    let err = listing.write_record().await.unwrap_err();

    assert!(matches!(err, RecordError::NoRowsAffected(_)));
    assert_eq!(listing.last_error(), Some("No rows affected in 'listings'"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn malformed_value_is_rejected_before_reaching_database(ctx: &TestHarness) {
    let mut listing = Listing::new(ctx.db());
    listing.set("price", "twelve").unwrap();

    let err = listing.create_record().await.unwrap_err();

    assert!(matches!(err, RecordError::InvalidValue { .. }));
    assert!(listing.last_error().unwrap().contains("price"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn constraint_violation_is_recorded_as_database_error(ctx: &TestHarness) {
    let mut listing = Listing::new(ctx.db());
    listing.set("side", "swap").unwrap();

    let err = listing.create_record().await.unwrap_err();

    assert!(matches!(err, RecordError::Database(_)));
    assert!(listing.last_error().is_some());
}

// =============================================================================
// Trade offers (composite key)
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn offer_lifecycle_with_composite_key(ctx: &TestHarness) {
    let (listing_id, _) = create_listing(ctx, "Guitar").await;
    let buyer = Uuid::new_v4();

    let mut offer = TradeOffer::new(ctx.db());
    offer.set_listing_id(listing_id).unwrap();
    offer.set_buyer_id(buyer).unwrap();
    offer.set_amount(Decimal::new(11000, 2)).unwrap();
    offer.create_record().await.unwrap();

    let mut offer = TradeOffer::find(listing_id, buyer, ctx.db()).await.unwrap();
    assert_eq!(offer.status().unwrap(), OfferStatus::Pending);
    assert_eq!(offer.amount().unwrap(), Some(Decimal::new(11000, 2)));

    offer.accept().await.unwrap();
    let reloaded = TradeOffer::find(listing_id, buyer, ctx.db()).await.unwrap();
    assert_eq!(reloaded.status().unwrap(), OfferStatus::Accepted);

    // A different buyer on the same listing is a different row
    let err = TradeOffer::find(listing_id, Uuid::new_v4(), ctx.db())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::NotFound(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn duplicate_offer_fails(ctx: &TestHarness) {
    let (listing_id, _) = create_listing(ctx, "Desk").await;
    let buyer = Uuid::new_v4();

    let mut offer = TradeOffer::new(ctx.db());
    offer.set_listing_id(listing_id).unwrap();
    offer.set_buyer_id(buyer).unwrap();
    offer.create_record().await.unwrap();

    let err = offer.create_record().await.unwrap_err();
    assert!(matches!(err, RecordError::Database(_)));
}
