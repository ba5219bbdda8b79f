pub mod action_reconciler;
pub mod connection_manager;
pub mod notification_store;

pub use action_reconciler::*;
pub use connection_manager::*;
pub use notification_store::*;
