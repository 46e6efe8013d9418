//! CiNii Research search client.
//!
//! CiNii has no JSON API for this kind of free-text lookup, so the public
//! search page is scraped. The first listed entry is taken as the match and
//! its detail page is read for the Highwire-style `citation_*` meta tags.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::models::{BibliographicRecord, ExtractedGuess, SearchHit};
use crate::sources::{BibliographicSearch, ResolveError};
use crate::utils::{with_rate_limit_retry, HttpClient, RetryConfig};

const RESULT_ITEM_SELECTOR: &str = "div.listitem.xfolkentry";
const RESULT_LINK_SELECTOR: &str = "a.taggedlink";
const RESULT_TITLE_SELECTOR: &str = "dl.paper_class > dt.item_mainTitle.item_title > a";
const CITATION_META_SELECTOR: &str = r#"meta[name^="citation_"]"#;

/// Search client for CiNii Research (`https://cir.nii.ac.jp`)
#[derive(Debug, Clone)]
pub struct CiniiSearchClient {
    client: HttpClient,
    base_url: String,
    retry: RetryConfig,
    min_title_similarity: Option<f64>,
}

impl CiniiSearchClient {
    pub fn new(config: &SearchConfig, client: HttpClient) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry_config(),
            min_title_similarity: config.min_title_similarity,
        }
    }

    /// Build the search URL for a guess.
    ///
    /// The title is always sent as `q`; the author is added as `creator` only
    /// when known.
    pub fn search_url(&self, guess: &ExtractedGuess) -> String {
        let mut url = format!("{}/all?q={}", self.base_url, urlencoding::encode(&guess.title));
        if !guess.author.is_empty() {
            url.push_str("&creator=");
            url.push_str(&urlencoding::encode(&guess.author));
        }
        url
    }

    /// Run the search and return the first listed entry, if any
    pub async fn search(&self, guess: &ExtractedGuess) -> Result<Option<SearchHit>, ResolveError> {
        let url = self.search_url(guess);
        let html = self.fetch_html(&url).await?;
        parse_first_hit(&html, &self.base_url)
    }

    /// Fetch a detail page and read its citation metadata
    pub async fn fetch_record(&self, detail_url: &str) -> Result<BibliographicRecord, ResolveError> {
        let html = self.fetch_html(detail_url).await?;
        let record = parse_citation_meta(&html);

        if record.is_empty() {
            return Err(ResolveError::Parse(format!(
                "No citation metadata on detail page {}",
                detail_url
            )));
        }
        Ok(record)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ResolveError> {
        with_rate_limit_retry(self.retry, || async move {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ResolveError::RateLimited {
                    url: url.to_string(),
                    attempts: 1,
                });
            }

            if !status.is_success() {
                tracing::error!("Request failed with status code: {}", status);
                tracing::error!("Request URL: {}", url);
                return Err(ResolveError::Upstream {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| ResolveError::Parse(format!("Failed to read response: {}", e)))
        })
        .await
    }

    fn accepts(&self, guess: &ExtractedGuess, hit: &SearchHit) -> bool {
        let Some(threshold) = self.min_title_similarity else {
            return true;
        };
        if guess.title.trim().is_empty() || hit.display_title.is_empty() {
            return true;
        }

        let score = title_similarity(&guess.title, &hit.display_title);
        tracing::debug!(
            "Title similarity {:.3} between {:?} and {:?}",
            score,
            guess.title,
            hit.display_title
        );
        score >= threshold
    }
}

#[async_trait]
impl BibliographicSearch for CiniiSearchClient {
    async fn resolve(&self, guess: &ExtractedGuess) -> Result<BibliographicRecord, ResolveError> {
        let not_found = || ResolveError::NotFound {
            title: guess.title.clone(),
            author: guess.author.clone(),
        };

        let hit = self.search(guess).await?.ok_or_else(not_found)?;

        if !self.accepts(guess, &hit) {
            tracing::warn!(
                "First hit {:?} does not match guessed title {:?}",
                hit.display_title,
                guess.title
            );
            return Err(not_found());
        }

        let mut record = self.fetch_record(&hit.detail_url).await?;
        if record.title.is_empty() {
            record.title = hit.display_title;
        }
        Ok(record)
    }
}

/// Case-folded Jaro-Winkler similarity of two titles
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

/// Pick the first result entry of a search page.
///
/// `Ok(None)` means the page listed nothing. An entry without a link is a
/// structural change on the service side and reported as a parse error.
pub(crate) fn parse_first_hit(html: &str, base_url: &str) -> Result<Option<SearchHit>, ResolveError> {
    let document = Html::parse_document(html);
    let item_selector = selector(RESULT_ITEM_SELECTOR)?;
    let link_selector = selector(RESULT_LINK_SELECTOR)?;
    let title_selector = selector(RESULT_TITLE_SELECTOR)?;

    let Some(item) = document.select(&item_selector).next() else {
        return Ok(None);
    };

    let href = item
        .select(&link_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .ok_or_else(|| ResolveError::Parse("Search result entry has no detail link".to_string()))?;

    let detail_url = Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map_err(|e| ResolveError::Parse(format!("Invalid detail link {:?}: {}", href, e)))?;

    let display_title = item
        .select(&title_selector)
        .next()
        .map(|a| a.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    Ok(Some(SearchHit {
        detail_url: detail_url.to_string(),
        display_title,
    }))
}

/// Collect every `citation_*` meta tag into a record
pub(crate) fn parse_citation_meta(html: &str) -> BibliographicRecord {
    let document = Html::parse_document(html);
    let Ok(meta_selector) = selector(CITATION_META_SELECTOR) else {
        return BibliographicRecord::default();
    };

    let pairs = document.select(&meta_selector).filter_map(|meta| {
        let name = meta.value().attr("name")?;
        let content = meta.value().attr("content")?;
        Some((name.to_string(), content.to_string()))
    });

    BibliographicRecord::from_meta_pairs(pairs)
}

fn selector(css: &str) -> Result<Selector, ResolveError> {
    Selector::parse(css).map_err(|e| ResolveError::Parse(format!("Invalid selector {}: {:?}", css, e)))
}
