use rand::Rng;
use serde::Deserialize;
use tokio::time::Duration;

use crate::models::TweetSentiment;
use crate::Result;

const TWITTER_API_BASE: &str = "https://api.twitter.com";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_QUERY: &str = "bitcoin OR BTC";
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Client for the Twitter v2 recent-search API.
///
/// Fetches recent tweets for a query and scores each one with a small
/// polarity lexicon; averaging happens downstream in the feature merge.
#[derive(Clone)]
pub struct TwitterClient {
    client: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
}

impl TwitterClient {
    pub fn new(bearer_token: String) -> Self {
        Self::with_base_url(bearer_token, TWITTER_API_BASE.to_string())
    }

    pub fn with_base_url(bearer_token: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
            base_url,
            bearer_token,
        }
    }

    /// Fetch recent tweets and score their polarity.
    /// Endpoint: GET /2/tweets/search/recent
    ///
    /// An empty result set is not an error; the feature merge treats it
    /// as neutral sentiment.
    pub async fn fetch_sentiment(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<TweetSentiment>> {
        let url = format!(
            "{}/2/tweets/search/recent?query={}&max_results={}",
            self.base_url,
            urlencode(query),
            max_results
        );

        let response = self.request_with_retry(&url).await?;
        let parsed: SearchResponse = response.json().await?;

        let scored: Vec<TweetSentiment> = parsed
            .data
            .into_iter()
            .map(|tweet| TweetSentiment {
                score: polarity(&tweet.text),
                text: tweet.text,
            })
            .collect();

        tracing::debug!("Scored {} tweets for sentiment", scored.len());
        Ok(scored)
    }

    async fn request_with_retry(&self, url: &str) -> Result<reqwest::Response> {
        for attempt in 1..=MAX_RETRIES {
            let result = self
                .client
                .get(url)
                .bearer_auth(&self.bearer_token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if attempt < MAX_RETRIES => {
                    let backoff = backoff_with_jitter(attempt);
                    tracing::warn!(
                        "Twitter returned {}, retrying in {:?} (attempt {}/{})",
                        response.status(),
                        backoff,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
                Ok(response) => {
                    return Err(format!("Twitter API error: {}", response.status()).into())
                }
                Err(e) if attempt < MAX_RETRIES => {
                    let backoff = backoff_with_jitter(attempt);
                    tracing::warn!(
                        "Network error: {}, retrying in {:?} (attempt {}/{})",
                        e,
                        backoff,
                        attempt,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    return Err(format!("Network error after {} retries: {}", MAX_RETRIES, e).into())
                }
            }
        }

        Err(format!("Failed after {} retries", MAX_RETRIES).into())
    }
}

// Exponential backoff (2s, 4s, ...) plus 0-1s of random jitter
fn backoff_with_jitter(attempt: u32) -> Duration {
    let base_ms = 2000u64 * 2u64.pow(attempt.saturating_sub(1));
    let jitter_ms = rand::thread_rng().gen_range(0..1000);
    Duration::from_millis(base_ms + jitter_ms)
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '#' => "%23".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

const BULLISH: &[&str] = &[
    "bull", "bullish", "pump", "pumping", "moon", "mooning", "buy", "buying", "long", "breakout",
    "rally", "surge", "gain", "gains", "profit", "ath", "green", "up",
];

const BEARISH: &[&str] = &[
    "bear", "bearish", "dump", "dumping", "crash", "crashing", "sell", "selling", "short", "drop",
    "fall", "falling", "loss", "losses", "red", "fear", "liquidated", "down", "scam",
];

/// Score a tweet's polarity in [-1.0, 1.0] from bullish/bearish word
/// counts. No matches at all reads as neutral.
pub fn polarity(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let bullish = words.iter().filter(|w| BULLISH.contains(*w)).count() as f64;
    let bearish = words.iter().filter(|w| BEARISH.contains(*w)).count() as f64;

    let total = bullish + bearish;
    if total == 0.0 {
        return 0.0;
    }
    (bullish - bearish) / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_scoring() {
        assert!(polarity("BTC breakout incoming, time to buy the rally") > 0.5);
        assert!(polarity("bitcoin crash, everyone selling in fear") < -0.5);
        assert_eq!(polarity("the weather is nice today"), 0.0);
    }

    #[test]
    fn test_polarity_mixed_text() {
        let score = polarity("pump then dump");
        assert_eq!(score, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_sentiment_scores_tweets() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "data": [
                {"id": "1", "text": "BTC to the moon, huge pump"},
                {"id": "2", "text": "bear market, dump everything"}
            ]
        })
        .to_string();

        let mock = server
            .mock("GET", "/2/tweets/search/recent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = TwitterClient::with_base_url("token".to_string(), server.url());
        let tweets = client.fetch_sentiment(DEFAULT_QUERY, 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(tweets.len(), 2);
        assert!(tweets[0].score > 0.0);
        assert!(tweets[1].score < 0.0);
    }

    #[tokio::test]
    async fn test_empty_result_set_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/2/tweets/search/recent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = TwitterClient::with_base_url("token".to_string(), server.url());
        let tweets = client.fetch_sentiment(DEFAULT_QUERY, 10).await.unwrap();

        mock.assert_async().await;
        assert!(tweets.is_empty());
    }
}
