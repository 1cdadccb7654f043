//! Raw catalog records to [`JournalRecord`]s.
//!
//! Two entry points share the same parsers and alias tables:
//! - [`normalize_csv_row`] for rows of the bulk CSV export, located through
//!   a [`HeaderLookup`] built once per file
//! - [`normalize_api_record`] for JSON objects from the search API
//!
//! Neither ever fails: a field that cannot be read becomes absent/unknown.

mod api_record;
mod csv_row;
pub mod headers;
pub mod parse;
mod record;
mod value;

pub use api_record::normalize_api_record;
pub use csv_row::normalize_csv_row;
pub use headers::{ColumnMap, CsvField, HeaderLookup, ResolvedColumns, UnknownField, normalize_header};
pub use parse::{LicenseFlags, parse_bool, parse_date, parse_number, split_multi};
pub use record::JournalRecord;
pub use value::FlexValue;
