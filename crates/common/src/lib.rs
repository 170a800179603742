//! FlightPath Common Library
//!
//! Pure journey rules shared by the runner: the route catalog, trip
//! validation, injectable randomness, price checks, synthetic purchase data
//! and configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod price;
pub mod purchase;
pub mod random;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use catalog::RouteCatalog;
pub use config::FlowConfig;
pub use error::{Error, ErrorKind, Result};
pub use price::{parse_price, PricePolicy};
pub use purchase::PurchaseRecord;
pub use random::Randomizer;
pub use types::*;
pub use validate::{resolve, select_flight, validate};

/// FlightPath version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
