use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::article::{
    cache::ArticleCache,
    error::ArticleError,
    parser::{ArticleParser, ParseOutcome},
    types::{Article, ArticleListResponse, ArticleSummary, Pagination},
};

pub const SOURCE_FILE: &str = "index.md";

/// Tally of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RefreshReport {
    pub published: usize,
    pub drafts: usize,
    pub failed: usize,
}

/// Scans the articles root into an [`ArticleCache`] and answers reads from it.
///
/// Reads never touch the filesystem. `page`/`limit` and slugs are trusted
/// as-is: clamping and path validation belong to the HTTP layer.
pub struct ArticleService {
    articles_dir: PathBuf,
    parser: ArticleParser,
    cache: ArticleCache,
    refresh_lock: Mutex<()>,
}

impl ArticleService {
    /// Creates a service with an empty cache. Call
    /// [`refresh_cache`](Self::refresh_cache) to populate it.
    pub fn new(articles_dir: impl Into<PathBuf>) -> Self {
        Self::with_parser(articles_dir, ArticleParser::default())
    }

    pub fn with_parser(articles_dir: impl Into<PathBuf>, parser: ArticleParser) -> Self {
        Self {
            articles_dir: articles_dir.into(),
            parser,
            cache: ArticleCache::new(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn articles_dir(&self) -> &Path {
        &self.articles_dir
    }

    /// Rescans every article directory and swaps in the result.
    ///
    /// Only a failure to list the root is an error, in which case the cache
    /// keeps its previous contents. Unreadable or unparseable articles and
    /// drafts are left out. Concurrent calls run one at a time.
    pub fn refresh_cache(&self) -> Result<RefreshReport, ArticleError> {
        let _guard = self.refresh_lock.lock();

        let entries = fs::read_dir(&self.articles_dir).map_err(|source| ArticleError::ListDir {
            path: self.articles_dir.clone(),
            source,
        })?;

        let (mut articles, report) = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .map(|slug| {
                let result = self.load_article(&slug);
                (slug, result)
            })
            .fold(
                (Vec::new(), RefreshReport::default()),
                |(mut articles, mut report), (slug, result)| {
                    match result {
                        Ok(ParseOutcome::Published(article)) => {
                            report.published += 1;
                            articles.push(article);
                        }
                        Ok(ParseOutcome::Draft) => report.drafts += 1,
                        Err(e) => {
                            warn!("skipping article '{slug}': {e}");
                            report.failed += 1;
                        }
                    }
                    (articles, report)
                },
            );

        sort_newest_first(&mut articles);

        self.cache.replace(articles);

        info!(
            "article cache refreshed (published: {}, drafts: {}, skipped: {})",
            report.published, report.drafts, report.failed,
        );

        Ok(report)
    }

    fn load_article(&self, slug: &str) -> Result<ParseOutcome, ArticleError> {
        let path = self.articles_dir.join(slug).join(SOURCE_FILE);
        debug!("reading {}", path.display());

        let content = fs::read(&path).map_err(|source| ArticleError::ReadSource { path, source })?;
        self.parser.parse(slug, &content)
    }

    /// One page of article summaries, newest first.
    ///
    /// Expects `page >= 1` and `limit >= 1`.
    pub fn get_articles(&self, page: usize, limit: usize) -> ArticleListResponse {
        let snapshot = self.cache.snapshot();
        let (pagination, range) = Pagination::compute(page, limit, snapshot.len());

        let articles = snapshot[range].iter().map(ArticleSummary::from).collect();

        ArticleListResponse {
            articles,
            pagination,
        }
    }

    pub fn get_article(&self, slug: &str) -> Option<Article> {
        self.cache
            .snapshot()
            .iter()
            .find(|article| article.slug == slug)
            .cloned()
    }

    /// `articles_dir/slug/filename`, with no validation whatsoever.
    ///
    /// Callers handling untrusted input must go through
    /// [`crate::http::image::resolve_image_path`] instead.
    pub fn get_image_path(&self, slug: &str, filename: &str) -> PathBuf {
        self.articles_dir.join(slug).join(filename)
    }

    pub fn snapshot(&self) -> Arc<Vec<Article>> {
        self.cache.snapshot()
    }
}

/// Orders by `published_at`, newest first. The sort is stable, so articles
/// with equal dates keep their discovery order.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
