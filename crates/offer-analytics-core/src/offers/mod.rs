pub mod affordability;
pub mod analytics;
pub mod comparison;
pub mod offer;
pub mod record;
pub mod scoring;
pub mod selection;
pub mod summary;

#[cfg(feature = "narrative")]
pub mod narrative;

#[cfg(feature = "market")]
pub mod market;

#[cfg(all(feature = "narrative", feature = "market"))]
pub mod engine;

pub use offer::{FeeStructure, Offer, OfferStatus};
