//! Blog feed scraper for RSS 2.0, RSS 1.0 and Atom feeds.
//!
//! Each `<item>` (RSS) or `<entry>` (Atom) becomes one `blog_post`
//! [`Resource`]. The feed's hostname is recorded as the resource source.
//!
//! # Field Mapping
//!
//! | Resource field | Taken from |
//! |----------------|------------|
//! | `title` | `title`, cleaned; `"Untitled"` when missing |
//! | `url` | `link` text, or the `href` of an Atom `<link>`; empty when missing |
//! | `description` | `description`, `content` or `summary`, else `content:encoded`, cleaned |
//! | `author` | `dc:creator`, else `author` (Atom: `author/name`) |
//! | `published_date` | `pubDate`, `published`, `updated` or `dc:date`, verbatim |

use crate::fetch::PageFetcher;
use crate::models::{BLOG_POST, Resource, now_timestamp};
use crate::scrapers::SourceOutcome;
use crate::utils::{clean_html, hostname, truncate_for_log};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::error::Error;
use tracing::{debug, error, info, instrument};

/// Fetch and parse one feed.
///
/// Never fails: fetch and parse errors are logged and reported as
/// [`SourceOutcome::Failed`].
#[instrument(level = "info", skip(fetcher))]
pub async fn scrape_rss_feed<F: PageFetcher>(fetcher: &F, feed_url: &str) -> SourceOutcome {
    match fetch_feed(fetcher, feed_url).await {
        Ok(resources) => {
            info!(count = resources.len(), "Scraped RSS feed");
            SourceOutcome::Fetched(resources)
        }
        Err(e) => {
            error!(error = %e, "Error scraping RSS feed");
            SourceOutcome::Failed {
                source: feed_url.to_string(),
                error: e.to_string(),
            }
        }
    }
}

async fn fetch_feed<F: PageFetcher>(
    fetcher: &F,
    feed_url: &str,
) -> Result<Vec<Resource>, Box<dyn Error>> {
    let xml = fetcher.fetch_text(feed_url).await?;
    parse_feed(&xml, feed_url, &now_timestamp()).inspect_err(|e| {
        debug!(
            error = %e,
            body_preview = %truncate_for_log(&xml, 300),
            "Feed body did not parse"
        )
    })
}

/// Parse a feed document into blog-post resources stamped with `added_at`.
///
/// # Errors
///
/// Returns an error if `feed_url` has no hostname, the document is not
/// well-formed XML, or its root element is not `rss`, `rdf:RDF` or `feed`.
pub fn parse_feed(
    xml: &str,
    feed_url: &str,
    added_at: &str,
) -> Result<Vec<Resource>, Box<dyn Error>> {
    let source = hostname(feed_url)?;
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    let decoder = reader.decoder();

    let mut depth = 0usize;
    let mut root_seen = false;
    let mut entry: Option<(usize, FeedEntry)> = None;
    let mut capture: Option<Capture> = None;
    let mut entries = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                depth += 1;
                let name = e.name();
                if depth == 1 {
                    if !matches!(name.as_ref(), b"rss" | b"rdf:RDF" | b"feed") {
                        return Err(format!(
                            "not an RSS or Atom feed (root element <{}>)",
                            decoder.decode(name.as_ref())?
                        )
                        .into());
                    }
                    root_seen = true;
                }

                match entry.as_mut() {
                    None => {
                        if matches!(name.as_ref(), b"item" | b"entry") {
                            entry = Some((depth, FeedEntry::default()));
                        }
                    }
                    Some((entry_depth, item)) => {
                        if depth == *entry_depth + 1 {
                            if name.as_ref() == b"link" {
                                item.take_link(&e)?;
                            }
                            capture = Some(Capture::new(name.as_ref()));
                        } else if depth == *entry_depth + 2 && name.as_ref() == b"name" {
                            if let Some(cap) = capture.as_mut() {
                                cap.start_author_name();
                            }
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if let Some((entry_depth, item)) = entry.as_mut() {
                    if depth == *entry_depth && e.name().as_ref() == b"link" {
                        item.take_link(&e)?;
                    }
                }
            }
            Event::End(e) => {
                let closing = depth;
                depth = depth.saturating_sub(1);
                let Some(entry_depth) = entry.as_ref().map(|(d, _)| *d) else {
                    continue;
                };

                if closing == entry_depth + 1 {
                    if let (Some(cap), Some((_, item))) = (capture.take(), entry.as_mut()) {
                        item.assign(&cap.name, cap.text);
                    }
                } else if closing == entry_depth + 2 && e.name().as_ref() == b"name" {
                    if let Some(cap) = capture.as_mut() {
                        cap.end_author_name();
                    }
                } else if closing == entry_depth {
                    if let Some((_, item)) = entry.take() {
                        entries.push(item);
                    }
                }
            }
            Event::Text(t) => {
                if let Some(cap) = capture.as_mut() {
                    cap.push(&decoder.decode(&t)?);
                }
            }
            Event::CData(c) => {
                if let Some(cap) = capture.as_mut() {
                    cap.push(&decoder.decode(&c)?);
                }
            }
            Event::GeneralRef(r) => {
                if let Some(cap) = capture.as_mut() {
                    cap.push(&resolve_reference(&decoder.decode(&r)?));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !root_seen {
        return Err("empty feed document".into());
    }

    debug!(entries = entries.len(), %source, "Parsed feed entries");
    Ok(entries
        .into_iter()
        .map(|item| item.into_resource(&source, added_at))
        .collect())
}

/// Resolve an XML reference body (`amp`, `#38`, `#x26`) to its text.
///
/// Unknown named references are kept verbatim so HTML cleaning can handle them.
fn resolve_reference(name: &str) -> String {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => name.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };
    match resolved {
        Some(c) => c.to_string(),
        None => format!("&{name};"),
    }
}

/// Text being collected for one direct child of an entry.
struct Capture {
    name: Vec<u8>,
    text: String,
    sealed: bool,
}

impl Capture {
    fn new(name: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            text: String::new(),
            sealed: false,
        }
    }

    fn push(&mut self, text: &str) {
        if !self.sealed {
            self.text.push_str(text);
        }
    }

    // Atom `<author>` wraps `<name>`, `<email>` and `<uri>`; keep only the name.
    fn start_author_name(&mut self) {
        if self.name == b"author" {
            self.text.clear();
        }
    }

    fn end_author_name(&mut self) {
        if self.name == b"author" {
            self.sealed = true;
        }
    }
}

#[derive(Debug, Default)]
struct FeedEntry {
    title: Option<String>,
    link: Option<String>,
    other_link: Option<String>,
    content_encoded: Option<String>,
    description: Option<String>,
    content: Option<String>,
    summary: Option<String>,
    creator: Option<String>,
    author: Option<String>,
    pub_date: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    dc_date: Option<String>,
}

impl FeedEntry {
    /// Record the `href` of an Atom link, preferring `rel="alternate"`.
    fn take_link(&mut self, e: &BytesStart<'_>) -> Result<(), Box<dyn Error>> {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"href" => href = Some(attr.unescape_value()?.trim().to_string()),
                b"rel" => rel = Some(attr.unescape_value()?.to_string()),
                _ => {}
            }
        }

        let Some(href) = href.filter(|h| !h.is_empty()) else {
            return Ok(());
        };
        if rel.as_deref().is_none_or(|r| r == "alternate") {
            if self.link.is_none() {
                self.link = Some(href);
            }
        } else if self.other_link.is_none() {
            self.other_link = Some(href);
        }
        Ok(())
    }

    fn assign(&mut self, name: &[u8], text: String) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match name {
            b"title" => &mut self.title,
            b"link" => &mut self.link,
            b"content:encoded" => &mut self.content_encoded,
            b"description" => &mut self.description,
            b"content" => &mut self.content,
            b"summary" => &mut self.summary,
            b"dc:creator" => &mut self.creator,
            b"author" => &mut self.author,
            b"pubDate" => &mut self.pub_date,
            b"published" => &mut self.published,
            b"updated" => &mut self.updated,
            b"dc:date" => &mut self.dc_date,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    fn into_resource(self, source: &str, added_at: &str) -> Resource {
        let body = self
            .description
            .or(self.content)
            .or(self.summary)
            .or(self.content_encoded);

        Resource {
            title: clean_html(self.title.as_deref().unwrap_or("Untitled")),
            url: self.link.or(self.other_link).unwrap_or_default(),
            description: body.as_deref().map(clean_html),
            author: self.creator.or(self.author),
            published_date: self
                .pub_date
                .or(self.published)
                .or(self.updated)
                .or(self.dc_date),
            kind: BLOG_POST.to_string(),
            source: Some(source.to_string()),
            added_at: added_at.to_string(),
            ..Default::default()
        }
    }
}
