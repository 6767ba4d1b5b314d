//! Utility functions for text normalization, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - HTML-to-text normalization for scraped titles and descriptions
//! - Hostname extraction for resource attribution
//! - String truncation for logging
//! - File system validation for the data directory

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Element rewrite passes, in the order they are applied.
///
/// An element rewritten by one pass is flattened to text, so only passes
/// with a lower rank still apply inside it.
const PASS_HEADING: u8 = 1;
const PASS_BLOCK: u8 = 2;
const PASS_BREAK: u8 = 3;
const PASS_LIST_ITEM: u8 = 4;
const ALL_PASSES: u8 = 5;

/// Flatten HTML markup into clean, human-readable plain text.
///
/// Headings become their text plus a newline, `p`/`div`/`span` their text
/// plus a space, `br` a newline and `li` a bulleted line. The resulting text
/// has whitespace collapsed and trimmed, and the common named entities
/// (`&nbsp;`, `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&#39;`) decoded.
///
/// Never fails: malformed markup is parsed on a best-effort basis.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_html("<p>Hello <b>World</b></p>"), "Hello World");
/// assert_eq!(clean_html("A &amp; B"), "A & B");
/// ```
pub fn clean_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut text = String::with_capacity(raw.len());
    render_children(fragment.root_element(), ALL_PASSES, &mut text);

    let text = WHITESPACE.replace_all(&text, " ");

    text.trim()
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn pass_rank(tag: &str) -> Option<u8> {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(PASS_HEADING),
        "p" | "div" | "span" => Some(PASS_BLOCK),
        "br" => Some(PASS_BREAK),
        "li" => Some(PASS_LIST_ITEM),
        _ => None,
    }
}

fn render_children(element: ElementRef<'_>, active_below: u8, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            render_element(child_element, active_below, out);
        }
    }
}

fn render_element(element: ElementRef<'_>, active_below: u8, out: &mut String) {
    let rank = match pass_rank(element.value().name()) {
        Some(rank) if rank < active_below => rank,
        _ => return render_children(element, active_below, out),
    };

    match rank {
        PASS_HEADING => {
            render_children(element, rank, out);
            out.push('\n');
        }
        PASS_BLOCK => {
            render_children(element, rank, out);
            out.push(' ');
        }
        PASS_BREAK => out.push('\n'),
        _ => {
            out.push_str("• ");
            render_children(element, rank, out);
            out.push('\n');
        }
    }
}

/// Hostname of a URL, e.g. `"https://devrel.net/feed"` -> `"devrel.net"`.
///
/// # Errors
///
/// Returns an error if `raw` is not an absolute URL with a host.
pub fn hostname(raw: &str) -> Result<String, Box<dyn Error>> {
    let parsed = Url::parse(raw)?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| format!("URL has no host: {raw}").into())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary)
/// with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Data directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_tags() {
        assert_eq!(clean_html("<p>Hello <b>World</b></p>"), "Hello World");
    }

    #[test]
    fn test_clean_html_decodes_entities() {
        assert_eq!(clean_html("A &amp; B"), "A & B");
        assert_eq!(clean_html("&lt;tag&gt; &quot;quoted&quot; it&#39;s"), "<tag> \"quoted\" it's");
        assert_eq!(clean_html("a&nbsp;&nbsp;b"), "a b");
    }

    #[test]
    fn test_clean_html_double_encoded_entities() {
        assert_eq!(clean_html("Tom &amp;amp; Jerry"), "Tom & Jerry");
    }

    #[test]
    fn test_clean_html_plain_text_passthrough() {
        assert_eq!(clean_html("Untitled"), "Untitled");
        assert_eq!(clean_html("   spaced    out \n\n text "), "spaced out text");
        assert_eq!(clean_html(""), "");
    }

    #[test]
    fn test_clean_html_block_elements_get_separators() {
        assert_eq!(clean_html("<h2>Intro</h2><p>First</p><p>Second</p>"), "Intro First Second");
        assert_eq!(clean_html("<div>one</div><div>two</div>"), "one two");
        assert_eq!(clean_html("line<br>break"), "line break");
    }

    #[test]
    fn test_clean_html_list_items_get_bullets() {
        assert_eq!(
            clean_html("<ul><li>alpha</li><li>beta</li></ul>"),
            "• alpha • beta"
        );
    }

    #[test]
    fn test_clean_html_list_inside_div_is_flattened() {
        // The div is rewritten before list items are, so no bullets survive.
        assert_eq!(clean_html("<div><li>x</li><li>y</li></div>"), "xy");
    }

    #[test]
    fn test_clean_html_malformed_markup() {
        assert_eq!(clean_html("<p>unclosed <b>bold"), "unclosed bold");
        assert_eq!(clean_html("broken <a href=\"x\">link"), "broken link");
        assert!(!clean_html("<div><span>nested</div></span>").contains('<'));
    }

    #[test]
    fn test_clean_html_drops_comments() {
        assert_eq!(clean_html("keep<!-- drop -->this"), "keepthis");
    }

    #[test]
    fn test_hostname() {
        assert_eq!(hostname("https://devrel.net/feed").unwrap(), "devrel.net");
        assert_eq!(
            hostname("https://medium.com/feed/tag/developer-relations").unwrap(),
            "medium.com"
        );
        assert!(hostname("not a url").is_err());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with('é'));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
