use std::{collections::HashSet, sync::LazyLock};

use pulldown_cmark::{
    html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;
use tracing::debug;

use crate::article::{error::ArticleError, types::Frontmatter};

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)[^\s<]+").expect("bare url pattern is valid")
});

// trimmed from the end of a bare url, as in "see https://example.com."
const URL_TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ':', ';', '!', '?', '*', '_', '~', '\'', '"',
];

/// Output of rendering one article source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub frontmatter: Frontmatter,
}

/// Turns raw article source bytes into HTML plus decoded metadata.
pub trait Renderer {
    fn render(&self, source: &[u8]) -> Result<Rendered, ArticleError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FrontmatterFormat {
    Yaml,
    Toml,
}

impl FrontmatterFormat {
    fn delimiter(self) -> &'static str {
        match self {
            FrontmatterFormat::Yaml => "---",
            FrontmatterFormat::Toml => "+++",
        }
    }

    fn from_line(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(FrontmatterFormat::Yaml),
            "+++" => Some(FrontmatterFormat::Toml),
            _ => None,
        }
    }
}

/// CommonMark renderer with tables, strikethrough, task lists, smart
/// punctuation, hard line breaks, bare-URL links and generated heading
/// anchors.
///
/// Raw HTML in the source is passed through untouched.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: Options,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;

        Self { options }
    }

    fn render_body(&self, body: &str) -> String {
        let events: Vec<Event> = TextMergeStream::new(Parser::new_ext(body, self.options))
            .map(|event| match event {
                Event::SoftBreak => Event::HardBreak,
                other => other,
            })
            .collect();

        let events = assign_heading_ids(linkify(events));

        let mut out = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        out
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &[u8]) -> Result<Rendered, ArticleError> {
        let source = String::from_utf8_lossy(source);
        let (block, body) = split_frontmatter(&source)?;

        let frontmatter = match block {
            Some((FrontmatterFormat::Yaml, raw)) if !raw.trim().is_empty() => {
                serde_yaml::from_str(raw)?
            }
            Some((FrontmatterFormat::Toml, raw)) => toml::from_str(raw)?,
            _ => Frontmatter::default(),
        };

        debug!("rendering {} bytes of markdown", body.len());

        Ok(Rendered {
            html: self.render_body(body),
            frontmatter,
        })
    }
}

/// Splits a leading `---` (YAML) or `+++` (TOML) block from the body.
///
/// The opening delimiter must be the very first line. A source without one
/// is all body.
type Split<'a> = (Option<(FrontmatterFormat, &'a str)>, &'a str);

fn split_frontmatter(source: &str) -> Result<Split<'_>, ArticleError> {
    let mut lines = source.split_inclusive('\n');

    let format = match lines.next().and_then(FrontmatterFormat::from_line) {
        Some(format) => format,
        None => return Ok((None, source)),
    };

    let block_start = source.find('\n').map_or(source.len(), |i| i + 1);
    let mut offset = block_start;

    for line in lines {
        if line.trim_end() == format.delimiter() {
            let block = &source[block_start..offset];
            let body = &source[offset + line.len()..];
            return Ok((Some((format, block)), body));
        }
        offset += line.len();
    }

    Err(ArticleError::UnterminatedFrontmatter(format.delimiter()))
}

/// Turns bare `http://`, `https://` and `www.` URLs in text into links.
///
/// Text already inside a link, an image or a code block is left alone.
fn linkify(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out = Vec::with_capacity(events.len());
    let mut nested = 0usize;

    for event in events {
        match &event {
            Event::Start(Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_)) => nested += 1,
            Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock) => {
                nested = nested.saturating_sub(1)
            }
            Event::Text(text) if nested == 0 && BARE_URL.is_match(text) => {
                push_linked_text(text, &mut out);
                continue;
            }
            _ => {}
        }
        out.push(event);
    }

    out
}

fn push_linked_text<'a>(text: &str, out: &mut Vec<Event<'a>>) {
    let mut last = 0;

    for found in BARE_URL.find_iter(text) {
        let url = trim_url(found.as_str());
        let scheme_len = if url.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("www.")) {
            4
        } else {
            url.find("://").map_or(0, |i| i + 3)
        };
        if url.len() <= scheme_len {
            continue;
        }

        if found.start() > last {
            out.push(Event::Text(CowStr::from(text[last..found.start()].to_string())));
        }

        let dest_url = if scheme_len == 4 {
            format!("http://{url}")
        } else {
            url.to_string()
        };

        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(dest_url),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));

        last = found.start() + url.len();
    }

    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drops trailing punctuation and any unbalanced closing parentheses.
fn trim_url(url: &str) -> &str {
    let mut url = url;

    loop {
        let trimmed = url.trim_end_matches(URL_TRAILING_PUNCTUATION);
        let trimmed = match trimmed.strip_suffix(')') {
            Some(inner) if trimmed.matches(')').count() > trimmed.matches('(').count() => inner,
            _ => trimmed,
        };

        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

/// Gives every heading without an explicit `{#id}` an anchor derived from
/// its text. Duplicates get `-1`, `-2`, ... suffixes.
fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut seen: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    for i in 0..events.len() {
        let needs_id = matches!(&events[i], Event::Start(Tag::Heading { id: None, .. }));
        if !needs_id {
            continue;
        }

        let text: String = events[i + 1..]
            .iter()
            .take_while(|event| !matches!(event, Event::End(TagEnd::Heading(_))))
            .filter_map(|event| match event {
                Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
                _ => None,
            })
            .collect();

        let generated = unique_heading_id(&text, &mut seen);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(generated));
        }
    }

    events
}

fn unique_heading_id(text: &str, seen: &mut HashSet<String>) -> String {
    let mut base: String = text
        .trim()
        .chars()
        .filter(char::is_ascii)
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else if c.is_ascii_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect();

    if base.is_empty() {
        base.push_str("heading");
    }

    if seen.insert(base.clone()) {
        return base;
    }

    (1..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| seen.insert(candidate.clone()))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(source: &str) -> Rendered {
        MarkdownRenderer::new().render(source.as_bytes()).unwrap()
    }

    #[test]
    fn test_yaml_frontmatter() {
        let rendered = render(
            "---\ntitle: Hello\nexcerpt: First post\ncoverImage: cover.png\npublishedAt: 2024-06-01\n---\n\nBody text.\n",
        );

        assert_eq!(
            rendered.frontmatter,
            Frontmatter {
                title: "Hello".to_string(),
                excerpt: "First post".to_string(),
                cover_image: "cover.png".to_string(),
                published_at: "2024-06-01".to_string(),
                draft: false,
            }
        );
        assert_eq!(rendered.html, "<p>Body text.</p>\n");
    }

    #[test]
    fn test_toml_frontmatter() {
        let rendered = render("+++\ntitle = \"Hello\"\ndraft = true\n+++\nBody\n");

        assert_eq!(rendered.frontmatter.title, "Hello");
        assert!(rendered.frontmatter.draft);
        assert_eq!(rendered.html, "<p>Body</p>\n");
    }

    #[test]
    fn test_no_frontmatter() {
        let rendered = render("Just text\n");

        assert_eq!(rendered.frontmatter, Frontmatter::default());
        assert_eq!(rendered.html, "<p>Just text</p>\n");
    }

    #[test]
    fn test_empty_frontmatter_block() {
        let rendered = render("---\n---\nBody\n");

        assert_eq!(rendered.frontmatter, Frontmatter::default());
        assert_eq!(rendered.html, "<p>Body</p>\n");
    }

    #[test]
    fn test_unterminated_frontmatter() {
        let result = MarkdownRenderer::new().render(b"---\ntitle: Hello\n\nBody\n");

        assert!(matches!(
            result,
            Err(ArticleError::UnterminatedFrontmatter("---"))
        ));
    }

    #[test]
    fn test_invalid_yaml_frontmatter() {
        let result = MarkdownRenderer::new().render(b"---\ntitle: [unclosed\n---\nBody\n");

        assert!(matches!(result, Err(ArticleError::YamlFrontmatter(_))));
    }

    #[test]
    fn test_soft_breaks_become_hard() {
        let rendered = render("line one\nline two\n");

        assert_eq!(rendered.html, "<p>line one<br />\nline two</p>\n");
    }

    #[test]
    fn test_heading_ids() {
        let rendered = render("# Hello World\n\n## Hello World\n\n## Café & Co\n\n### 100%\n\n#### ???\n");

        assert!(rendered.html.contains(r#"<h1 id="hello-world">"#));
        assert!(rendered.html.contains(r#"<h2 id="hello-world-1">"#));
        assert!(rendered.html.contains(r#"<h2 id="caf--co">"#));
        assert!(rendered.html.contains(r#"<h3 id="100">"#));
        assert!(rendered.html.contains(r#"<h4 id="heading">"#));
    }

    #[test]
    fn test_explicit_heading_id_is_kept() {
        let rendered = render("# Intro {#custom}\n\n# Custom\n");

        assert!(rendered.html.contains(r#"<h1 id="custom">"#));
        assert!(rendered.html.contains(r#"<h1 id="custom-1">"#));
    }

    #[test]
    fn test_raw_html_passes_through() {
        let rendered = render("<div class=\"note\">hi</div>\n");

        assert_eq!(rendered.html, "<div class=\"note\">hi</div>\n");
    }

    #[test]
    fn test_bare_urls_become_links() {
        let rendered = render("See https://example.com/docs. Or www.example.org, maybe.\n");

        assert_eq!(
            rendered.html,
            "<p>See <a href=\"https://example.com/docs\">https://example.com/docs</a>. \
             Or <a href=\"http://www.example.org\">www.example.org</a>, maybe.</p>\n"
        );
    }

    #[test]
    fn test_bare_url_parentheses() {
        let rendered = render("(see https://en.wikipedia.org/wiki/Rust_(language))\n");

        assert_eq!(
            rendered.html,
            "<p>(see <a href=\"https://en.wikipedia.org/wiki/Rust_(language)\">\
             https://en.wikipedia.org/wiki/Rust_(language)</a>)</p>\n"
        );
    }

    #[test]
    fn test_urls_in_links_and_code_are_untouched() {
        let rendered = render(
            "[https://a.example](https://b.example) and `https://c.example`\n\n```\nhttps://d.example\n```\n",
        );

        assert_eq!(
            rendered.html,
            "<p><a href=\"https://b.example\">https://a.example</a> and <code>https://c.example</code></p>\n\
             <pre><code>https://d.example\n</code></pre>\n"
        );
    }

    #[test]
    fn test_bare_scheme_is_not_a_link() {
        let rendered = render("just http:// here\n");

        assert_eq!(rendered.html, "<p>just http:// here</p>\n");
    }

    #[test]
    fn test_tables_render() {
        let rendered = render("| a | b |\n|---|---|\n| 1 | 2 |\n");

        assert!(rendered.html.contains("<table>"));
        assert!(rendered.html.contains("<td>1</td>"));
    }
}
