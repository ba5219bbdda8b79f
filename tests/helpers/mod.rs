#![allow(dead_code)]
#![allow(unused_imports)]
pub mod fake_api;
pub mod fake_stream;
pub mod fixtures;

pub use fake_api::*;
pub use fake_stream::*;
pub use fixtures::*;

use std::time::Duration;

/// Let every spawned task run until it blocks. Under paused time this also
/// nudges the clock forward by a few milliseconds.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
