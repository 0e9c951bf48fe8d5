use serde::{Deserialize, Serialize};

/// One company listing, as extracted from a directory table row.
///
/// Every field is optional: when a source element is missing the field
/// stays absent instead of failing the whole row. Absent is not the
/// same as an empty string, which means the cell existed but was blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub link: Option<String>,
    pub company_name: Option<String>,
    pub director: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub postal_code: Option<String>,
    pub revenue: Option<String>,
    pub creation_date: Option<String>,
    pub staff_count: Option<String>,
}

/// The records collected over one run, in page order.
pub type Dataset = Vec<CompanyRecord>;

/// CSV column order. Must match the field order of [`CompanyRecord`],
/// which `csv` serializes positionally.
pub const CSV_COLUMNS: [&str; 9] = [
    "link",
    "company_name",
    "director",
    "phone",
    "email",
    "postal_code",
    "revenue",
    "creation_date",
    "staff_count",
];
