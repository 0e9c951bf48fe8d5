use std::collections::HashSet;

use crate::fetcher::{FetchError, PageSource};
use crate::parser;
use crate::types::{CompanyRecord, Dataset};

/// Postal codes a run keeps: the Île-de-France departments, compared
/// verbatim against the text of the postal code column.
pub const IDF_POSTAL_CODES: [&str; 8] = ["75", "77", "78", "91", "92", "93", "94", "95"];

/// One scraping run over the company directory.
///
/// Owns the deduplication state for the run: a link seen once is never
/// extracted again, within a page or across pages. The set starts empty
/// and is not persisted between runs.
pub struct ScrapeSession<S> {
    source: S,
    seen_links: HashSet<String>,
    target_codes: HashSet<String>,
}

impl<S: PageSource> ScrapeSession<S> {
    pub fn new(source: S) -> Self {
        Self::with_target_codes(source, IDF_POSTAL_CODES.iter().map(|c| c.to_string()))
    }

    pub fn with_target_codes(source: S, codes: impl IntoIterator<Item = String>) -> Self {
        ScrapeSession {
            source,
            seen_links: HashSet::new(),
            target_codes: codes.into_iter().collect(),
        }
    }

    /// Scrapes a single results page: collect the company rows, drop
    /// the ones outside the target region, extract the rest. Row-level
    /// failures are logged and skipped inside the filter and extractor;
    /// only a failed fetch surfaces here.
    pub fn scrape_page(&mut self, page: u32) -> Result<Vec<CompanyRecord>, FetchError> {
        let document = self.source.fetch_page(page)?;

        let mut records = Vec::new();
        for row in parser::company_rows(&document) {
            if !parser::row_in_target_region(row, &self.target_codes) {
                continue;
            }
            if let Some(record) = parser::extract_company(row, &mut self.seen_links) {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Walks pages `1..=max_pages` in order, accumulating records. A
    /// failed page is logged and skipped; the run never aborts on a
    /// page error and never stops early on an empty page.
    pub fn scrape(&mut self, max_pages: u32) -> Dataset {
        let mut dataset = Dataset::new();

        for page in 1..=max_pages {
            log::info!("Scraping page {}/{}", page, max_pages);
            match self.scrape_page(page) {
                Ok(records) => dataset.extend(records),
                Err(e) => log::error!("Error scraping page {}: {}", page, e),
            }
        }

        dataset
    }

    /// Detail-page enrichment stage. Currently a passthrough; kept as
    /// its own stage, outside the page loop, so per-company fetches can
    /// slot in here later.
    pub fn enrich(&self, dataset: Dataset) -> Dataset {
        dataset
    }
}
