//! Time utilities: timezone-aware "today" and pt-BR date rendering.

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "America/Sao_Paulo".
pub fn parse_tz(tz: &str) -> Result<Tz> {
    tz.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))
}

/// The calendar date at `now` in the given timezone.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Today's calendar date in the given timezone.
pub fn today_in(tz: Tz) -> NaiveDate {
    local_date(Utc::now(), tz)
}

/// `dd/mm/yyyy`
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Lower-case Portuguese month name for a date.
pub fn month_name_pt(date: NaiveDate) -> &'static str {
    const MONTHS: [&str; 12] = [
        "janeiro", "fevereiro", "março", "abril", "maio", "junho",
        "julho", "agosto", "setembro", "outubro", "novembro", "dezembro",
    ];
    MONTHS[date.month0() as usize]
}

/// True when both dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
