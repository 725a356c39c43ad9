//! Human-readable incident identifiers: `INC-YYYYMMDD-NNN`.

use chrono::NaiveDate;

const PREFIX: &str = "INC";

/// `INC-YYYYMMDD-`, shared by every incident reported on `date`.
pub fn day_prefix(date: NaiveDate) -> String {
    format!("{}-{}-", PREFIX, date.format("%Y%m%d"))
}

/// Next id for `date`: highest existing suffix for that day plus one.
///
/// Ids from other days and malformed ids are ignored. The suffix is padded
/// to three digits and simply grows wider after 999.
pub fn next_incident_id<'a, I>(date: NaiveDate, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = day_prefix(date);
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix.as_str()))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", prefix, max + 1)
}
