pub mod client;
pub mod error;
mod join;
pub mod types;

pub use client::GeocoderClient;
pub use error::GeocodeError;
