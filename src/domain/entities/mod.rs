pub mod connection;
pub mod credentials;
pub mod notification;
pub mod pending_action;

pub use connection::*;
pub use credentials::*;
pub use notification::*;
pub use pending_action::*;
