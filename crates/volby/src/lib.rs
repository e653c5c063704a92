mod parser;
pub mod request;
pub mod scraper;
pub mod table;
pub mod types;
pub mod utils;

pub use parser::{
    merge_party_vote, parse_election_detail, parse_election_detail_html, parse_location_directory,
    parse_location_directory_html,
};
pub use request::{DetailUrlTemplate, TemplateError};
pub use scraper::{ScraperError, WebScraper};
pub use table::UnifiedTable;

/// Marker rendered for any value the source pages did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Language used for detail requests when the listing URL does not carry one.
pub const DEFAULT_LANGUAGE: &str = "CZ";

pub(crate) const DETAIL_ENDPOINT: &str = "ps311";
