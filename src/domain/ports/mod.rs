pub mod notification_api;
pub mod notification_stream;
pub mod time_service;
pub mod view_binding;

pub use notification_api::*;
pub use notification_stream::*;
pub use time_service::*;
pub use view_binding::*;
