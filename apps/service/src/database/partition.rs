//! Naming of day partitions on disk: `ping_data_<YYYY-MM-DD>.json`.

use chrono::NaiveDate;

const FILE_PREFIX: &str = "ping_data_";
const FILE_SUFFIX: &str = ".json";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name holding the partition for `date`
pub fn file_name(date: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format(DATE_FORMAT))
}

/// Date of a partition file, `None` for anything else in the directory
pub fn parse_file_name(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Parse a `YYYY-MM-DD` date as used in partition names
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}
