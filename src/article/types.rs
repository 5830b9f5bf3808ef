use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A published article, fully rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    pub published_at: DateTime<Utc>,
    pub reading_time: u32,
}

/// Listing view of an [`Article`], without the rendered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub cover_image: String,
    pub published_at: DateTime<Utc>,
    pub reading_time: u32,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            slug: article.slug.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            cover_image: article.cover_image.clone(),
            published_at: article.published_at,
            reading_time: article.reading_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// Computes the page window for `total` items.
    ///
    /// Returns the descriptor together with the `start..end` index range of
    /// the page. The range is empty when `page` lies past the last page;
    /// the descriptor is still filled in. `page` and `limit` must already be
    /// normalized (`page >= 1`, `limit >= 1`).
    pub fn compute(page: usize, limit: usize, total: usize) -> (Self, Range<usize>) {
        let total_pages = total.div_ceil(limit);
        let start = page.saturating_sub(1).saturating_mul(limit);
        let end = start.saturating_add(limit).min(total);

        let range = if start >= total { 0..0 } else { start..end };

        let pagination = Self {
            page,
            limit,
            total,
            total_pages,
            has_next: end < total,
            has_prev: page > 1,
        };

        (pagination, range)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub article: Article,
}

/// Metadata block at the top of an article source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Frontmatter {
    pub title: String,
    pub excerpt: String,
    pub cover_image: String,
    pub published_at: String,
    pub draft: bool,
}

pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date at midnight UTC.
///
/// Anything else maps to January 1st of year 1, which sorts after every
/// real date under newest-first ordering.
pub fn parse_published_at(raw: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(raw, PUBLISHED_AT_FORMAT)
        .unwrap_or_else(|_| earliest_date())
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}

fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}
