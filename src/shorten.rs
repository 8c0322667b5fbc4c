use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::AppError;

#[async_trait]
pub trait UrlShortener: Send + Sync {
    /// Best effort: returns a short URL, or `long_url` unchanged when every
    /// configured service fails.
    async fn shorten(&self, long_url: &str) -> String;
}

pub struct HttpShortener {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl HttpShortener {
    pub fn new(endpoints: Vec<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { endpoints, client })
    }
}

fn looks_like_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl UrlShortener for HttpShortener {
    async fn shorten(&self, long_url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(long_url.as_bytes()).collect();

        for endpoint in &self.endpoints {
            let request_url = endpoint.replace("{url}", &encoded);
            log::debug!("Trying shortener endpoint: {}", request_url);

            match self.client.get(&request_url).send().await {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(body) => {
                        let candidate = body.trim();
                        if looks_like_url(candidate) {
                            log::info!("Shortened {} -> {}", long_url, candidate);
                            return candidate.to_string();
                        }
                        log::debug!("Shortener returned a non-URL body, moving on");
                    }
                    Err(e) => log::debug!("Failed to read shortener response: {}", e),
                },
                Ok(resp) => log::debug!("Shortener responded with status {}", resp.status()),
                Err(e) => log::debug!("Shortener request failed: {}", e),
            }
        }

        log::warn!("All shortening services failed, falling back to the original URL");
        long_url.to_string()
    }
}
