//! On-page SEO probe
//!
//! Fetches the page once and reads the served HTML (no JavaScript runs).
//! Missing elements produce empty strings or zero counts, never errors; only
//! a failed fetch fails the check.

use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::debug;

use super::PageFetcher;
use crate::error::CheckError;
use crate::models::{NormalizedUrl, SeoResult};

struct SeoSelectors {
    title: Selector,
    meta: Selector,
    h1: Selector,
    img: Selector,
}

fn selectors() -> &'static SeoSelectors {
    static SELECTORS: OnceLock<SeoSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| SeoSelectors {
        title: Selector::parse("title").expect("valid selector"),
        meta: Selector::parse(r#"meta[name="description"]"#).expect("valid selector"),
        h1: Selector::parse("h1").expect("valid selector"),
        img: Selector::parse("img").expect("valid selector"),
    })
}

/// Run the SEO check.
pub async fn check<F: PageFetcher>(fetcher: &F, url: &NormalizedUrl) -> Result<SeoResult, CheckError> {
    let page = fetcher.fetch(url).await?;
    let result = extract(&page.body);
    debug!(
        "SEO: {} title={:?} h1={} images_missing_alt={}",
        url, result.title, result.h1_count, result.images_missing_alt
    );
    Ok(result)
}

/// Extract SEO signals from an HTML document.
pub fn extract(html: &str) -> SeoResult {
    let document = Html::parse_document(html);
    let sel = selectors();

    let title = document
        .select(&sel.title)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    // content is taken verbatim
    let meta_description = document
        .select(&sel.meta)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .unwrap_or_default();

    let h1_count = document.select(&sel.h1).count() as u64;

    let images_missing_alt = document
        .select(&sel.img)
        .filter(|img| img.value().attr("alt").is_none())
        .count() as u64;

    SeoResult {
        title,
        meta_description,
        h1_count,
        images_missing_alt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fakes::FakeFetcher;

    #[test]
    fn test_extracts_all_signals() {
        let html = r#"<!doctype html>
<html><head>
  <title>
     Example Store
  </title>
  <meta name="viewport" content="width=device-width">
  <meta name="description" content="Shoes and more">
</head><body>
  <h1>Welcome</h1>
  <section><h1>Deals</h1></section>
  <img src="a.png" alt="Logo">
  <img src="b.png">
  <img src="c.png" alt="">
  <img src="d.png">
</body></html>"#;
        let result = extract(html);
        assert_eq!(result.title, "Example Store");
        assert_eq!(result.meta_description, "Shoes and more");
        assert_eq!(result.h1_count, 2);
        // empty alt counts as present
        assert_eq!(result.images_missing_alt, 2);
    }

    #[test]
    fn test_missing_elements_yield_defaults() {
        let result = extract("<html><body><p>hi</p></body></html>");
        assert_eq!(result, SeoResult::default());
    }

    #[test]
    fn test_only_first_title_and_description_used() {
        let html = r#"<title>First</title><title>Second</title>
<meta name="description" content="one"><meta name="description" content="two">"#;
        let result = extract(html);
        assert_eq!(result.title, "First");
        assert_eq!(result.meta_description, "one");
    }

    #[test]
    fn test_description_matches_exact_name_and_keeps_content() {
        let html = r#"<meta name="Description" content="wrong case">
<meta name="description" content="  ">"#;
        let result = extract(html);
        assert_eq!(result.meta_description, "  ");
    }

    #[test]
    fn test_description_without_content_is_empty() {
        let result = extract(r#"<meta name="description">"#);
        assert_eq!(result.meta_description, "");
    }

    #[test]
    fn test_not_html_is_tolerated() {
        let result = extract("{\"json\": true}");
        assert_eq!(result.h1_count, 0);
        assert!(result.title.is_empty());
    }

    #[tokio::test]
    async fn test_check_propagates_fetch_failure() {
        let fetcher = FakeFetcher::unreachable();
        let url = NormalizedUrl::parse("example.com").unwrap();
        assert!(check(&fetcher, &url).await.is_err());
    }

    #[tokio::test]
    async fn test_check_reads_fetched_body() {
        let fetcher = FakeFetcher::serving(
            "https://example.com/",
            &[],
            "<title>Hi</title><h1>x</h1>",
        );
        let url = NormalizedUrl::parse("example.com").unwrap();
        let result = check(&fetcher, &url).await.unwrap();
        assert_eq!(result.title, "Hi");
        assert_eq!(result.h1_count, 1);
    }
}
