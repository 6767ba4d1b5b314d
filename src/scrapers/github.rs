//! GitHub topic page scraper.
//!
//! This module scrapes the public topic listing at
//! `https://github.com/topics/<topic>` and turns each repository card into a
//! `github_program` [`Resource`].
//!
//! # Page Structure
//!
//! Repository cards are `article.border` elements. The repository link is the
//! last anchor under `h3`, relative to the site root (e.g.
//! `/owner/repo`); the description lives in `div.px-3 > p`.

use crate::fetch::PageFetcher;
use crate::models::{GITHUB_PROGRAM, Resource, now_timestamp};
use crate::scrapers::SourceOutcome;
use crate::utils::clean_html;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Source label recorded on every scraped repository.
pub const GITHUB_SOURCE: &str = "github.com";

/// Topic listing URL for `topic`, e.g. `https://github.com/topics/devrel`.
pub fn topic_url(base_url: &str, topic: &str) -> String {
    format!(
        "{}/topics/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(topic)
    )
}

/// Fetch and parse one topic page.
///
/// Never fails: fetch and parse errors are logged and reported as
/// [`SourceOutcome::Failed`].
#[instrument(level = "info", skip(fetcher))]
pub async fn scrape_github_repos<F: PageFetcher>(
    fetcher: &F,
    base_url: &str,
    topic: &str,
) -> SourceOutcome {
    match fetch_topic(fetcher, base_url, topic).await {
        Ok(repos) => {
            info!(count = repos.len(), "Scraped GitHub topic");
            SourceOutcome::Fetched(repos)
        }
        Err(e) => {
            error!(error = %e, "Error scraping GitHub repos for topic");
            SourceOutcome::Failed {
                source: topic.to_string(),
                error: e.to_string(),
            }
        }
    }
}

async fn fetch_topic<F: PageFetcher>(
    fetcher: &F,
    base_url: &str,
    topic: &str,
) -> Result<Vec<Resource>, Box<dyn Error>> {
    let base = Url::parse(base_url)?;
    let html = fetcher.fetch_text(&topic_url(base_url, topic)).await?;
    parse_topic_page(&html, &base, &now_timestamp())
}

/// Extract repository cards from a topic page.
///
/// Cards without a usable repository link are skipped.
pub fn parse_topic_page(
    html: &str,
    base: &Url,
    added_at: &str,
) -> Result<Vec<Resource>, Box<dyn Error>> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse("article.border")?;
    let title_selector = Selector::parse("h3 a")?;
    let description_selector = Selector::parse("div.px-3 > p")?;

    let mut repos = Vec::new();
    for card in document.select(&card_selector) {
        let links: Vec<ElementRef<'_>> = card.select(&title_selector).collect();
        let Some(href) = links
            .last()
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.trim().is_empty())
        else {
            debug!("Skipping card without repository link");
            continue;
        };
        let url = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!(%href, error = %e, "Skipping card with unresolvable link");
                continue;
            }
        };

        let title_text: String = links.iter().flat_map(|a| a.text()).collect();
        let description_text: String = card
            .select(&description_selector)
            .flat_map(|p| p.text())
            .collect();
        let description = if description_text.is_empty() {
            None
        } else {
            Some(clean_html(description_text.trim()))
        };

        repos.push(Resource {
            title: clean_html(title_text.trim()),
            url: url.to_string(),
            description,
            kind: GITHUB_PROGRAM.to_string(),
            source: Some(GITHUB_SOURCE.to_string()),
            added_at: added_at.to_string(),
            ..Default::default()
        });
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDED_AT: &str = "2025-05-06T12:00:00.000Z";

    const TOPIC_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<article class="border rounded color-shadow-small my-4">
  <div class="px-3">
    <div class="d-flex">
      <h3 class="f3">
        <a href="/devrel-collective">
          devrel-collective
        </a> /
        <a class="text-bold" href="/devrel-collective/awesome-devrel">
          awesome-devrel
        </a>
      </h3>
    </div>
  </div>
  <div class="px-3 pt-3">
    <p class="color-fg-muted mb-0">A curated list of talks &amp; <em>guides</em></p>
  </div>
</article>
<article class="border rounded my-4">
  <div class="px-3"><h3><a href="/acme/dx-kit">dx-kit</a></h3></div>
</article>
<article class="border">
  <h3>Card without any link</h3>
</article>
<article class="border">
  <h3><a name="anchor-only">No href</a></h3>
</article>
<article class="border">
  <h3><a href="">ghost</a></h3>
</article>
<article class="border">
  <h3><a href="   ">blank</a></h3>
</article>
<article class="sidebar">
  <h3><a href="/not/a-card">ignored</a></h3>
</article>
</body></html>"#;

    fn base() -> Url {
        Url::parse("https://github.com").unwrap()
    }

    #[test]
    fn test_parse_topic_page_cards() {
        let repos = parse_topic_page(TOPIC_PAGE, &base(), ADDED_AT).unwrap();
        assert_eq!(repos.len(), 2);

        let first = &repos[0];
        assert_eq!(first.title, "devrel-collective awesome-devrel");
        assert_eq!(first.url, "https://github.com/devrel-collective/awesome-devrel");
        assert_eq!(
            first.description.as_deref(),
            Some("A curated list of talks & guides")
        );
        assert_eq!(first.kind, "github_program");
        assert_eq!(first.source.as_deref(), Some("github.com"));
        assert_eq!(first.added_at, ADDED_AT);
        assert!(first.author.is_none());
    }

    #[test]
    fn test_card_without_description() {
        let repos = parse_topic_page(TOPIC_PAGE, &base(), ADDED_AT).unwrap();
        assert_eq!(repos[1].title, "dx-kit");
        assert_eq!(repos[1].url, "https://github.com/acme/dx-kit");
        assert!(repos[1].description.is_none());
    }

    #[test]
    fn test_empty_href_is_skipped() {
        let repos = parse_topic_page(TOPIC_PAGE, &base(), ADDED_AT).unwrap();
        assert!(repos.iter().all(|r| r.url != "https://github.com/"));
        assert!(repos.iter().all(|r| r.title != "ghost" && r.title != "blank"));

        let only_empty = r#"<article class="border"><h3><a href="">ghost</a></h3></article>"#;
        assert!(parse_topic_page(only_empty, &base(), ADDED_AT).unwrap().is_empty());
    }

    #[test]
    fn test_page_without_cards() {
        let repos = parse_topic_page("<html><body>rate limited</body></html>", &base(), ADDED_AT)
            .unwrap();
        assert!(repos.is_empty());
    }

    #[test]
    fn test_topic_url_encodes_topic() {
        assert_eq!(
            topic_url("https://github.com/", "developer-relations"),
            "https://github.com/topics/developer-relations"
        );
        assert_eq!(
            topic_url("https://github.com", "dev rel"),
            "https://github.com/topics/dev%20rel"
        );
    }

    struct PageByUrl;

    impl PageFetcher for PageByUrl {
        async fn fetch_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
            if url == "https://github.com/topics/devrel" {
                Ok(TOPIC_PAGE.to_string())
            } else {
                Err(format!("404 for {url}").into())
            }
        }
    }

    #[tokio::test]
    async fn test_scrape_github_repos_uses_topic_url() {
        let outcome = scrape_github_repos(&PageByUrl, "https://github.com", "devrel").await;
        assert_eq!(outcome.into_resources().len(), 2);
    }

    #[tokio::test]
    async fn test_scrape_github_repos_failure_is_contained() {
        let outcome = scrape_github_repos(&PageByUrl, "https://github.com", "missing").await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.source, "missing");
        assert!(failure.error.contains("404"));
    }
}
