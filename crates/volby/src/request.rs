//! Per-location request construction.
//!
//! The listing page (`ps32`) and the municipality detail page (`ps311`) live
//! next to each other under the same election directory but name the
//! territorial unit differently: the listing takes it as `xnumnuts`, the detail
//! page expects it as `xvyber`.

use url::Url;

use crate::{DEFAULT_LANGUAGE, DETAIL_ENDPOINT};

const LANGUAGE_PARAM: &str = "xjazyk";
const REGION_PARAM: &str = "xkraj";
const UNIT_PARAM: &str = "xnumnuts";
const DETAIL_UNIT_PARAM: &str = "xvyber";
const DETAIL_LOCATION_PARAM: &str = "xobec";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Invalid listing URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Listing URL has no path to derive the detail endpoint from: {0}")]
    NotHierarchical(String),
    #[error("Listing URL is missing the '{0}' query parameter")]
    MissingParameter(&'static str),
}

/// Detail request for every municipality of one territorial unit.
///
/// Built once from the listing URL; only the municipality code changes
/// between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailUrlTemplate {
    endpoint: Url,
    language: String,
    region: String,
    unit: String,
}

impl DetailUrlTemplate {
    pub fn from_listing_url(listing_url: &str) -> Result<Self, TemplateError> {
        let listing = Url::parse(listing_url)?;
        Self::from_url(&listing)
    }

    pub fn from_url(listing: &Url) -> Result<Self, TemplateError> {
        let language =
            query_param(listing, LANGUAGE_PARAM).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let region =
            query_param(listing, REGION_PARAM).ok_or(TemplateError::MissingParameter(REGION_PARAM))?;
        let unit =
            query_param(listing, UNIT_PARAM).ok_or(TemplateError::MissingParameter(UNIT_PARAM))?;

        let mut endpoint = listing.clone();
        endpoint.set_query(None);
        endpoint.set_fragment(None);
        endpoint
            .path_segments_mut()
            .map_err(|_| TemplateError::NotHierarchical(listing.to_string()))?
            .pop_if_empty()
            .pop()
            .push(DETAIL_ENDPOINT);

        Ok(Self {
            endpoint,
            language,
            region,
            unit,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn url_for(&self, code: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(LANGUAGE_PARAM, &self.language)
            .append_pair(REGION_PARAM, &self.region)
            .append_pair(DETAIL_LOCATION_PARAM, &code.to_string())
            .append_pair(DETAIL_UNIT_PARAM, &self.unit);
        url
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
