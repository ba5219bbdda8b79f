pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod shared;

pub use bootstrap::*;
pub use config::*;
pub use domain::*;
pub use services::*;
