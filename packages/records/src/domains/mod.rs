// Business domains
pub mod record;
pub mod trade;
