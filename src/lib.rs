pub mod article;
pub mod config;
pub mod error;
pub mod http;

pub use error::{RestError, Result};
