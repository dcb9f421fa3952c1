pub mod client;
pub mod error;
pub mod types;

pub use client::ShopwareClient;
pub use error::ShopwareError;
pub use types::TaxRate;
