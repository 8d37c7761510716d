use time::{Date, Duration, Month, OffsetDateTime};

pub fn today_utc() -> Date {
	OffsetDateTime::now_utc().date()
}

pub fn format_iso(date: Date) -> String {
	format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Resolve a relative-or-absolute date token against a reference day.
/// Unknown tokens fall back to the reference day rather than failing; the
/// model is free-form here and a wrong day is better than a dropped entry.
pub fn parse_relative_date(token: Option<&str>, today: Date) -> Date {
	let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
		return today;
	};

	match token.to_ascii_lowercase().as_str() {
		"today" => today,
		"yesterday" => today - Duration::days(1),
		other => parse_iso(other).unwrap_or(today),
	}
}

fn parse_iso(raw: &str) -> Option<Date> {
	let mut parts = raw.splitn(3, '-');
	let year: i32 = parts.next()?.parse().ok()?;
	let month: u8 = parts.next()?.parse().ok()?;
	let day: u8 = parts.next()?.parse().ok()?;

	Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}
