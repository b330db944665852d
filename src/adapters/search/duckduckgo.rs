//! DuckDuckGo search - instant-answer API with retry and jitter.
//!
//! DuckDuckGo throttles aggressively, so the adapter retries throttled and
//! failed requests a bounded number of times with exponential backoff plus
//! random jitter to avoid synchronized retry storms.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::ports::{SearchError, SearchHit, WebSearch};

/// Configuration for the DuckDuckGo adapter.
#[derive(Debug, Clone)]
pub struct DuckDuckGoConfig {
    /// Base URL of the instant-answer API.
    pub endpoint: String,
    /// Maximum retry attempts after the first request.
    pub max_retries: u32,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for DuckDuckGoConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.duckduckgo.com".to_string(),
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Web search backed by DuckDuckGo.
pub struct DuckDuckGoSearch {
    config: DuckDuckGoConfig,
    client: Client,
}

impl DuckDuckGoSearch {
    /// Creates a new DuckDuckGo search adapter.
    pub fn new(config: DuckDuckGoConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    async fn fetch(&self, query: &str) -> Result<DdgResponse, SearchError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("q", query), ("format", "json"), ("no_html", "1")])
            .send()
            .await
            .map_err(|e| SearchError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::unavailable(format!(
                "search returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    /// Backoff for attempt `n`: 1s, 2s, 4s, ... plus up to 500ms of jitter.
    fn backoff(attempt: u32) -> Duration {
        let base = Duration::from_secs(1 << attempt);
        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
        base + jitter
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut attempt: u32 = 0;
        let response = loop {
            match self.fetch(query).await {
                Ok(response) => break response,
                Err(SearchError::InvalidResponse(message)) => {
                    return Err(SearchError::InvalidResponse(message));
                }
                Err(error) if attempt < self.config.max_retries => {
                    let delay = Self::backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "search attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        };

        Ok(collect_hits(response, max_results))
    }
}

fn collect_hits(response: DdgResponse, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    if !response.abstract_text.is_empty() && !response.abstract_url.is_empty() {
        hits.push(SearchHit {
            title: if response.heading.is_empty() {
                response.abstract_url.clone()
            } else {
                response.heading.clone()
            },
            snippet: response.abstract_text,
            url: response.abstract_url,
        });
    }

    for topic in response.related_topics {
        if hits.len() >= max_results {
            break;
        }
        let (Some(url), Some(text)) = (topic.first_url, topic.text) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        // The text runs "Title - snippet"; split on the first dash when present.
        let (title, snippet) = match text.split_once(" - ") {
            Some((title, snippet)) => (title.to_string(), snippet.to_string()),
            None => (text.clone(), text),
        };
        hits.push(SearchHit {
            title,
            snippet,
            url,
        });
    }

    hits.truncate(max_results);
    hits
}

// ----- Wire Types -----

#[derive(Debug, Default, Deserialize)]
struct DdgResponse {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<DdgTopic>,
}

#[derive(Debug, Deserialize)]
struct DdgTopic {
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
    #[serde(rename = "Text")]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> DdgResponse {
        serde_json::from_str(
            r#"{
                "Heading": "Ghent",
                "AbstractText": "Ghent is a city in the Flemish Region of Belgium.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Ghent",
                "RelatedTopics": [
                    {"FirstURL": "https://duckduckgo.com/Ghent_University", "Text": "Ghent University - public research university"},
                    {"FirstURL": null, "Text": "category page"},
                    {"FirstURL": "https://duckduckgo.com/Gravensteen", "Text": "Gravensteen - medieval castle in Ghent"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn collect_hits_leads_with_abstract() {
        let hits = collect_hits(sample_response(), 5);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Ghent");
        assert_eq!(hits[0].url, "https://en.wikipedia.org/wiki/Ghent");
    }

    #[test]
    fn collect_hits_splits_topic_titles() {
        let hits = collect_hits(sample_response(), 5);
        assert_eq!(hits[1].title, "Ghent University");
        assert_eq!(hits[1].snippet, "public research university");
    }

    #[test]
    fn collect_hits_respects_max_results() {
        let hits = collect_hits(sample_response(), 1);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn backoff_grows_with_attempts() {
        assert!(DuckDuckGoSearch::backoff(0) >= Duration::from_secs(1));
        assert!(DuckDuckGoSearch::backoff(2) >= Duration::from_secs(4));
        assert!(DuckDuckGoSearch::backoff(2) < Duration::from_secs(5));
    }
}
