use std::sync::Arc;

use tracing::debug;
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::article::{
    error::ArticleError,
    render::{MarkdownRenderer, Renderer},
    types::{parse_published_at, Article},
};

pub const WORDS_PER_MINUTE: usize = 200;

/// What came out of parsing one article source.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Published(Article),
    Draft,
}

#[derive(Clone)]
pub struct ArticleParser {
    renderer: Arc<dyn Renderer + Send + Sync>,
}

impl Default for ArticleParser {
    fn default() -> Self {
        Self::new(Arc::new(MarkdownRenderer::new()))
    }
}

impl ArticleParser {
    pub fn new(renderer: Arc<dyn Renderer + Send + Sync>) -> Self {
        Self { renderer }
    }

    /// Builds the article stored under `slug` from its raw source.
    ///
    /// Drafts come back as [`ParseOutcome::Draft`]; only a renderer failure
    /// is an error.
    pub fn parse(&self, slug: &str, content: &[u8]) -> Result<ParseOutcome, ArticleError> {
        let rendered = self.renderer.render(content)?;
        let meta = rendered.frontmatter;

        if meta.draft {
            debug!("skipping draft article '{slug}'");
            return Ok(ParseOutcome::Draft);
        }

        let article = Article {
            slug: slug.to_string(),
            title: meta.title,
            excerpt: meta.excerpt,
            content: rendered.html,
            cover_image: cover_image_url(slug, &meta.cover_image),
            published_at: parse_published_at(&meta.published_at),
            reading_time: reading_time(content),
        };

        debug!(
            "parsed article '{}' ({} min read)",
            article.slug, article.reading_time
        );

        Ok(ParseOutcome::Published(article))
    }
}

pub fn cover_image_url(slug: &str, cover_image: &str) -> String {
    if cover_image.is_empty() {
        String::new()
    } else {
        format!("/api/articles/{slug}/image/{cover_image}")
    }
}

/// Counts maximal runs of letters and numbers across the whole source,
/// frontmatter and markup included.
///
/// Word characters are the Unicode general categories `L*` and `N*`. Combining
/// marks (`M*`) and symbols such as Ⓐ (`So`) split words.
pub fn word_count(content: &[u8]) -> usize {
    let text = String::from_utf8_lossy(content);

    text.chars()
        .fold((0, false), |(words, in_word), c| match (is_word_char(c), in_word) {
            (true, false) => (words + 1, true),
            (true, true) => (words, true),
            (false, _) => (words, false),
        })
        .0
}

fn is_word_char(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::DecimalNumber
            | GeneralCategory::LetterNumber
            | GeneralCategory::OtherNumber
    )
}

/// Minutes to read `content` at [`WORDS_PER_MINUTE`], never below one.
pub fn reading_time(content: &[u8]) -> u32 {
    let minutes = word_count(content) / WORDS_PER_MINUTE;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}
