//! Order types, execution against the API, and the fill log.

pub mod execution;
pub mod order;
pub mod trade_log;

pub use order::{OrderParams, OrderState, OrderStatus, Side};
pub use trade_log::{FillRecord, TradeLog};
