use crate::parser::{parse_election_detail_html, parse_location_directory_html};
use crate::request::{DetailUrlTemplate, TemplateError};
use crate::types::{ElectionDetail, LocationDirectory, LocationResult};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Cannot build detail requests: {0}")]
    Template(#[from] TemplateError),
    #[error("No locations found for {0}")]
    NoLocations(String),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    concurrency: usize,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            concurrency: 1,
        })
    }

    /// Number of detail pages requested at once. Results keep listing order
    /// whatever the value; `1` fetches strictly one location after another.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn get_html(&self, url: &str) -> Result<String, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))
    }

    /// Fetches the listing page of a territorial unit. An empty directory is
    /// an error: there is nothing to scrape.
    pub async fn fetch_location_directory(
        &self,
        listing_url: &str,
    ) -> Result<LocationDirectory, ScraperError> {
        log::info!("Fetching location directory from {}...", listing_url);
        let html = self.get_html(listing_url).await?;
        let directory = parse_location_directory_html(&html);

        if directory.is_empty() {
            return Err(ScraperError::NoLocations(listing_url.to_string()));
        }

        log::info!("Found {} locations", directory.len());
        Ok(directory)
    }

    pub async fn fetch_election_detail(&self, url: &Url) -> Result<ElectionDetail, ScraperError> {
        let html = self.get_html(url.as_str()).await?;
        Ok(parse_election_detail_html(&html))
    }

    /// Fetches and parses the detail page of every location, in directory
    /// order.
    ///
    /// A location whose page cannot be fetched is kept with every value
    /// unavailable, so the result always has one entry per location.
    pub async fn scrape_locations(
        &self,
        template: &DetailUrlTemplate,
        directory: &LocationDirectory,
    ) -> Result<Vec<LocationResult>, ScraperError> {
        if directory.is_empty() {
            return Err(ScraperError::NoLocations(format!(
                "territorial unit {}",
                template.unit()
            )));
        }

        let total = directory.len();
        log::info!(
            "Scraping {} locations ({} at a time)...",
            total,
            self.concurrency
        );

        let results: Vec<LocationResult> = stream::iter(directory.iter().cloned().enumerate())
            .map(|(i, location)| async move {
                let url = template.url_for(location.code);
                log::info!("[{}/{}] {} {}", i + 1, total, location.code, location.name);

                let detail = self.fetch_election_detail(&url).await.unwrap_or_else(|e| {
                    log::warn!(
                        "Failed to fetch results for location {} ({}): {}",
                        location.code,
                        url,
                        e
                    );
                    ElectionDetail::default()
                });

                let result = LocationResult::new(location, detail);
                log::debug!("{}", result);
                result
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let degraded = results.iter().filter(|r| r.is_empty()).count();
        if degraded > 0 {
            log::warn!("{} of {} locations have no data", degraded, total);
        }

        Ok(results)
    }

    /// Runs the whole pipeline for one listing URL: request template, location
    /// directory, then every location's results.
    pub async fn scrape_territorial_unit(
        &self,
        listing_url: &str,
    ) -> Result<Vec<LocationResult>, ScraperError> {
        let template = DetailUrlTemplate::from_listing_url(listing_url)?;
        let directory = self.fetch_location_directory(listing_url).await?;
        self.scrape_locations(&template, &directory).await
    }
}
