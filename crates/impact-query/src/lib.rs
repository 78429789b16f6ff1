pub mod client;
pub mod error;
pub mod poll;
mod retry;
pub mod types;
pub mod wire;

pub use client::QueryClient;
pub use error::{Phase, QueryError};
pub use poll::{Backoff, PollConfig};
pub use types::QueryResponse;
