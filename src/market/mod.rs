//! Exchange access: live CLOB client, the [`Exchange`] seam, and a mock.

pub mod client;
pub mod exchange;
pub mod mock;
pub mod types;

pub use client::ClobClient;
pub use exchange::{DryRunExchange, Exchange};
pub use mock::MockExchange;
pub use types::{Market, Outcome};
