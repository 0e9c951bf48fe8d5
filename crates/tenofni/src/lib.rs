pub mod fetcher;
mod parser;
pub mod scraper;
pub mod sink;
pub mod types;
pub mod utils;

pub use scraper::ScrapeSession;

pub(crate) const BASE_URL: &str = "https://infonet.fr";
