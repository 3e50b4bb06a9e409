pub mod listing;
pub mod trade_offer;

pub use listing::{Listing, ListingSide};
pub use trade_offer::{OfferStatus, TradeOffer};
