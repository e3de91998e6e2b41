//! The quoting strategy: fill classification, the per-market order lifecycle
//! state machine, and the worker task that drives it.

pub mod fill;
pub mod monitor;
pub mod worker;

pub use fill::{classify, FillVerdict, FILL_EPSILON};
pub use monitor::{
    AdjustTrigger, ManagedOrder, MonitorState, OrderLifecycleMonitor, ProtectionConfig, TickEvent,
};
pub use worker::MarketWorker;
