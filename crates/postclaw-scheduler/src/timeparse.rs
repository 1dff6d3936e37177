//! Free-text schedule expressions → absolute timestamps.
//!
//! All times are naive and local to the process.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Quick options shown to the user, in parse precedence order.
pub const QUICK_OPTIONS: &[(&str, &str)] = &[
    ("now", "post right away"),
    ("15m", "in 15 minutes"),
    ("1h", "in 1 hour"),
    ("3h", "in 3 hours"),
    ("tomorrow 09:00", "tomorrow at 9 AM"),
];

const TOMORROW: &str = "tomorrow";

/// Current process-local wall time.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Parse a schedule expression relative to `now`.
///
/// Returns `None` for anything unrecognised.
pub fn parse_schedule(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.trim().to_lowercase();

    match text.as_str() {
        // Small buffer so the first sweep has something to pick up.
        "now" => return Some(now + Duration::minutes(2)),
        "15m" | "+15m" => return Some(now + Duration::minutes(15)),
        "1h" | "+1h" => return Some(now + Duration::hours(1)),
        "3h" | "+3h" => return Some(now + Duration::hours(3)),
        _ => {}
    }

    if let Some(rest) = text.strip_prefix(TOMORROW) {
        let rest = rest.trim();
        let time = if rest.is_empty() {
            NaiveTime::from_hms_opt(9, 0, 0)?
        } else {
            parse_hhmm(rest)?
        };
        let tomorrow = now.date().succ_opt()?;
        return Some(tomorrow.and_time(time));
    }

    if let Some(absolute) = parse_absolute(&text) {
        return Some(absolute);
    }

    let time = parse_hhmm(&text)?;
    let today = now.date().and_time(time);
    if today > now {
        Some(today)
    } else {
        Some(now.date().succ_opt()?.and_time(time))
    }
}

/// `HH:MM`, one- or two-digit fields.
fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.split_once(':')?;
    let hour = parse_field(h, 2)?;
    let minute = parse_field(m, 2)?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// `DD.MM.YYYY HH:MM`.
fn parse_absolute(s: &str) -> Option<NaiveDateTime> {
    let (date, time) = s.split_once(' ')?;
    let mut parts = date.split('.');
    let day = parse_field(parts.next()?, 2)?;
    let month = parse_field(parts.next()?, 2)?;
    let year = parse_field(parts.next()?, 4)?;
    if parts.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    Some(date.and_time(parse_hhmm(time.trim())?))
}

fn parse_field(s: &str, max_digits: usize) -> Option<u32> {
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
