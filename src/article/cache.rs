use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::article::types::Article;

/// Holds the current generation of published articles.
///
/// The whole collection is swapped at once; readers take their own `Arc` to
/// the current generation and keep working on it after later swaps.
#[derive(Debug)]
pub struct ArticleCache {
    snapshot: ArcSwap<Vec<Article>>,
}

impl Default for ArticleCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ArticleCache {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::new(Arc::new(Vec::new())),
        }
    }

    /// Installs `articles` as the current generation.
    pub fn replace(&self, articles: Vec<Article>) {
        self.snapshot.store(Arc::new(articles));
    }

    pub fn snapshot(&self) -> Arc<Vec<Article>> {
        self.snapshot.load_full()
    }
}
