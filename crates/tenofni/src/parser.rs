use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::types::CompanyRecord;

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("tr.toggle-add-to-list-button").expect("invalid selector: company row")
});

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: link"));

static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: cell"));

/// How to find one field's text within a row.
enum Locator {
    /// First element matching a selector anywhere in the row.
    Direct(Selector),
    /// The row's cell at a fixed index, then the first matching tag
    /// within that cell.
    Positional { cell: usize, inner: Selector },
}

impl Locator {
    fn direct(selector: &str) -> Locator {
        Locator::Direct(Selector::parse(selector).expect("invalid field selector"))
    }

    fn positional(cell: usize, tag: &str) -> Locator {
        Locator::Positional {
            cell,
            inner: Selector::parse(tag).expect("invalid field selector"),
        }
    }
}

/// The extracted fields besides the link, in CSV column order.
#[derive(Debug, Clone, Copy)]
enum Field {
    CompanyName,
    Director,
    Phone,
    Email,
    PostalCode,
    Revenue,
    CreationDate,
    StaffCount,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::CompanyName => "company_name",
            Field::Director => "director",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::PostalCode => "postal_code",
            Field::Revenue => "revenue",
            Field::CreationDate => "creation_date",
            Field::StaffCount => "staff_count",
        }
    }

    fn slot(self, record: &mut CompanyRecord) -> &mut Option<String> {
        match self {
            Field::CompanyName => &mut record.company_name,
            Field::Director => &mut record.director,
            Field::Phone => &mut record.phone,
            Field::Email => &mut record.email,
            Field::PostalCode => &mut record.postal_code,
            Field::Revenue => &mut record.revenue,
            Field::CreationDate => &mut record.creation_date,
            Field::StaffCount => &mut record.staff_count,
        }
    }
}

static FIELD_LOCATORS: LazyLock<[(Field, Locator); 8]> = LazyLock::new(|| {
    [
        (Field::CompanyName, Locator::direct(".cse-company-name")),
        (Field::Director, Locator::direct(".cse-officer-name")),
        (Field::Phone, Locator::direct(".phone-copy")),
        (Field::Email, Locator::direct(".email-copy")),
        (Field::PostalCode, Locator::positional(7, "span")),
        (
            Field::Revenue,
            Locator::direct(".text-nowrap.font-weight-semibold"),
        ),
        (Field::CreationDate, Locator::positional(6, "span")),
        (Field::StaffCount, Locator::positional(10, "span")),
    ]
});

/// The postal code column, read on its own by the row filter before
/// extraction ever runs.
static POSTAL_CODE_LOCATOR: LazyLock<Locator> = LazyLock::new(|| Locator::positional(7, "span"));

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves a single locator against a row. `None` when the target
/// element is missing.
fn resolve(row: ElementRef, locator: &Locator) -> Option<String> {
    match locator {
        Locator::Direct(selector) => row.select(selector).next().map(element_text),
        Locator::Positional { cell, inner } => {
            let cell = row.select(&CELL_SELECTOR).nth(*cell)?;
            cell.select(inner).next().map(element_text)
        }
    }
}

fn resolve_link(row: ElementRef) -> Option<String> {
    let href = row.select(&LINK_SELECTOR).next()?.value().attr("href")?;
    if href.starts_with('/') {
        Some(format!("{}{}", crate::BASE_URL, href))
    } else {
        Some(href.to_string())
    }
}

/// All company rows of a search results page.
pub fn company_rows(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&ROW_SELECTOR).collect()
}

/// Cheap readiness check used by the page source while it waits for
/// the results table to render.
pub fn has_company_rows(document: &Html) -> bool {
    document.select(&ROW_SELECTOR).next().is_some()
}

/// Reads the row's postal code column and accepts the row iff the text
/// equals one of the target codes. Whole-string membership, on purpose:
/// the directory renders the filtered column with the bare department
/// code, so nothing shorter or longer matches.
///
/// A row without a readable postal code is excluded.
pub fn row_in_target_region(row: ElementRef, target_codes: &HashSet<String>) -> bool {
    match resolve(row, &POSTAL_CODE_LOCATOR) {
        Some(code) => target_codes.contains(code.as_str()),
        None => {
            log::error!("Error processing row: postal code cell not found");
            false
        }
    }
}

/// Extracts a [`CompanyRecord`] from a row, deduplicating on the
/// company link. Returns `None` when the link was already seen this
/// run; nothing else is extracted in that case and the seen set is not
/// touched again.
///
/// A missing field never aborts the row: the field stays absent and
/// extraction moves on. A row without a resolvable link is still
/// emitted, with `link` absent.
pub fn extract_company(
    row: ElementRef,
    seen_links: &mut HashSet<String>,
) -> Option<CompanyRecord> {
    let link = match resolve_link(row) {
        Some(link) => {
            if seen_links.contains(&link) {
                return None;
            }
            seen_links.insert(link.clone());
            Some(link)
        }
        None => {
            log::warn!("Failed to extract link");
            None
        }
    };

    let mut record = CompanyRecord {
        link,
        ..CompanyRecord::default()
    };
    for (field, locator) in FIELD_LOCATORS.iter() {
        let value = resolve(row, locator);
        if value.is_none() {
            log::debug!("Failed to extract {}", field.name());
        }
        *field.slot(&mut record) = value;
    }

    Some(record)
}
