use anyhow::anyhow;
use chrono::{Days, Local, NaiveDate};
use staffdesk_shared::calendar_date;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a date typed into a form: an ISO calendar date, a full
/// timestamp, or one of `today`, `tomorrow`, `yesterday`.
pub fn parse_form_date(expr: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let trimmed = expr.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" => Err(anyhow!("date cannot be empty")),
        "today" => Ok(today),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| anyhow!("date out of range: {trimmed}")),
        "yesterday" => today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| anyhow!("date out of range: {trimmed}")),
        _ => calendar_date::parse(trimmed)
            .ok_or_else(|| anyhow!("unrecognized date: {trimmed} (expected YYYY-MM-DD)")),
    }
}

/// Long display form, e.g. `Jan 1, 2024`.
pub fn format_long(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
