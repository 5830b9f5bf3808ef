use std::{
    path::{Component, Path, PathBuf},
    sync::LazyLock,
};

use mime_guess::from_path;
use regex::Regex;

static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$|^[a-z0-9]$").expect("slug pattern is valid")
});

pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000";

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Maps an untrusted `(slug, filename)` pair to a file under `articles_dir`.
///
/// The filename is cut down to its last component, the slug must be
/// lowercase alphanumerics and inner hyphens, and the joined path must stay
/// strictly inside the articles root after normalization. Existence is not
/// checked here.
pub fn resolve_image_path(articles_dir: &Path, slug: &str, filename: &str) -> Option<PathBuf> {
    let slug = slug.strip_suffix('/').unwrap_or(slug);
    if !is_valid_slug(slug) {
        return None;
    }

    let filename = Path::new(filename).file_name()?;

    let root = normalize(&std::path::absolute(articles_dir).ok()?);
    let candidate = normalize(&root.join(slug).join(filename));

    (candidate.starts_with(&root) && candidate != root).then_some(candidate)
}

/// Lexically resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut out, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    out.pop();
                }
                other => out.push(other),
            }
            out
        })
}

pub fn content_type_for(filename: &str) -> String {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "png" => "image/png".to_string(),
        "gif" => "image/gif".to_string(),
        "webp" => "image/webp".to_string(),
        "svg" => "image/svg+xml".to_string(),
        _ => from_path(filename).first_or_octet_stream().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("a"));
        assert!(is_valid_slug("hello-world"));
        assert!(is_valid_slug("2024-recap"));

        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("Upper"));
        assert!(!is_valid_slug(".."));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("a_b"));
        assert!(!is_valid_slug("hello\n"));
    }

    #[test]
    fn test_resolve_plain_image() {
        let root = Path::new("/srv/articles");

        assert_eq!(
            resolve_image_path(root, "my-post", "cover.png"),
            Some(PathBuf::from("/srv/articles/my-post/cover.png"))
        );
        assert_eq!(
            resolve_image_path(root, "my-post/", "cover.png"),
            Some(PathBuf::from("/srv/articles/my-post/cover.png"))
        );
    }

    #[test]
    fn test_resolve_strips_directories_from_filename() {
        let root = Path::new("/srv/articles");

        assert_eq!(
            resolve_image_path(root, "my-post", "../../etc/passwd"),
            Some(PathBuf::from("/srv/articles/my-post/passwd"))
        );
        assert_eq!(
            resolve_image_path(root, "my-post", "/etc/passwd"),
            Some(PathBuf::from("/srv/articles/my-post/passwd"))
        );
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv/articles");

        assert_eq!(resolve_image_path(root, "..", "passwd"), None);
        assert_eq!(resolve_image_path(root, "../etc", "passwd"), None);
        assert_eq!(resolve_image_path(root, "/etc", "passwd"), None);
        assert_eq!(resolve_image_path(root, "my-post", ".."), None);
        assert_eq!(resolve_image_path(root, "my-post", "."), None);
        assert_eq!(resolve_image_path(root, "my-post", ""), None);
    }

    #[test]
    fn test_resolve_relative_root_stays_inside() {
        let root = Path::new("content/../articles");
        let resolved = resolve_image_path(root, "post", "a.jpg").unwrap();

        let expected_root = normalize(&std::path::absolute("articles").unwrap());
        assert!(resolved.starts_with(&expected_root));
        assert!(resolved.ends_with("post/a.jpg"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.jpg"), "image/jpeg");
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.png"), "image/png");
        assert_eq!(content_type_for("a.gif"), "image/gif");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.svg"), "image/svg+xml");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }
}
