pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use config::Config;
pub use error::{RequestError, Result};
pub use http::{Executor, RetryPolicy};
pub use types::VideoItem;
