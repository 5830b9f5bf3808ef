pub mod cache;
pub mod error;
pub mod parser;
pub mod render;
pub mod service;
pub mod types;

pub use cache::ArticleCache;
pub use error::ArticleError;
pub use parser::{ArticleParser, ParseOutcome};
pub use render::{MarkdownRenderer, Rendered, Renderer};
pub use service::{ArticleService, RefreshReport};
pub use types::*;
