//! Event timestamps
//!
//! Every timestamp sent to the calendar backend carries an offset. Local
//! times without one are taken to be Korea Standard Time.

use agentic_tools::EventDraft;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

/// UTC offset of Korea Standard Time, in seconds
pub const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Event length in minutes when the request gives no end
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Start time when the request names a day but no clock time
const DEFAULT_HOUR: u32 = 9;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Fields a PATCH body may carry
const PATCHABLE_FIELDS: [&str; 5] = ["summary", "location", "description", "start", "end"];

lazy_static! {
    static ref KO_CLOCK: Regex =
        Regex::new(r"(오전|오후|아침|저녁|밤|낮)?\s*(\d{1,2})\s*시(?:\s*(\d{1,2})\s*분|\s*(반))?")
            .expect("valid korean clock regex");
    static ref EN_CLOCK: Regex =
        Regex::new(r"(?i)\b(\d{1,2})(?::([0-5]\d))?\s*([ap])\.?m\b\.?")
            .expect("valid english clock regex");
    static ref TWENTY_FOUR_HOUR: Regex =
        Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").expect("valid 24h clock regex");
}

/// The KST offset
#[must_use]
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("valid KST offset")
}

/// Current time in KST
#[must_use]
pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// RFC 3339 with seconds and a `+09:00`-style offset
#[must_use]
pub fn format_timestamp(at: &DateTime<FixedOffset>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Parse a model- or user-supplied timestamp; missing offsets become KST
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at);
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(DEFAULT_HOUR, 0, 0))
        })?;

    naive.and_local_timezone(kst()).single()
}

/// Resolve relative day words and clock expressions against `now`
///
/// Understands `오늘/내일/모레` and `today/tomorrow/day after tomorrow`,
/// Korean clock phrases (`오전 9시`, `오후 3시 30분`, `저녁 7시 반`),
/// `9am` / `3:30 pm`, and 24-hour `14:00`. A day without a time starts at
/// 09:00; a time without a day is today. Returns `None` when neither is
/// present.
///
/// # Examples
/// ```
/// use agentic_core::calendar::{kst, resolve_relative_datetime};
/// use chrono::TimeZone;
/// let now = kst().with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap();
/// let at = resolve_relative_datetime("내일 오전 9시에 회의 있어", now).unwrap();
/// assert_eq!(at.to_rfc3339(), "2025-03-11T09:00:00+09:00");
/// ```
#[must_use]
pub fn resolve_relative_datetime(
    text: &str,
    now: DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let days = day_offset(text);
    let clock = clock_time(text);
    if days.is_none() && clock.is_none() {
        return None;
    }

    let local_now = now.with_timezone(&kst());
    let date = local_now.date_naive() + Duration::days(days.unwrap_or(0));
    let (hour, minute) = clock.unwrap_or((DEFAULT_HOUR, 0));

    date.and_hms_opt(hour, minute, 0)?
        .and_local_timezone(kst())
        .single()
}

fn day_offset(text: &str) -> Option<i64> {
    let lower = text.to_lowercase();
    if lower.contains("모레") || lower.contains("day after tomorrow") {
        Some(2)
    } else if lower.contains("내일") || lower.contains("tomorrow") {
        Some(1)
    } else if ["오늘", "today", "tonight"].iter().any(|w| lower.contains(w)) {
        Some(0)
    } else {
        None
    }
}

fn clock_time(text: &str) -> Option<(u32, u32)> {
    if let Some(caps) = KO_CLOCK.captures(text) {
        let hour: u32 = caps[2].parse().ok()?;
        let minute: u32 = match (caps.get(3), caps.get(4)) {
            (Some(m), _) => m.as_str().parse().ok()?,
            (None, Some(_)) => 30,
            _ => 0,
        };
        let hour = match caps.get(1).map(|m| m.as_str()) {
            Some("오후" | "저녁" | "밤") if hour < 12 => hour + 12,
            Some("낮") if hour < 6 => hour + 12,
            Some("오전" | "아침") if hour == 12 => 0,
            _ => hour,
        };
        return valid_clock(hour, minute);
    }

    if let Some(caps) = EN_CLOCK.captures(text) {
        let hour: u32 = caps[1].parse().ok()?;
        if hour == 0 || hour > 12 {
            return None;
        }
        let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        let pm = caps[3].eq_ignore_ascii_case("p");
        let hour = match (pm, hour) {
            (true, h) if h < 12 => h + 12,
            (false, 12) => 0,
            (_, h) => h,
        };
        return valid_clock(hour, minute);
    }

    if let Some(caps) = TWENTY_FOUR_HOUR.captures(text) {
        return valid_clock(caps[1].parse().ok()?, caps[2].parse().ok()?);
    }

    let lower = text.to_lowercase();
    if lower.contains("정오") || lower.contains("noon") {
        return Some((12, 0));
    }
    if lower.contains("자정") || lower.contains("midnight") {
        return Some((0, 0));
    }
    None
}

fn valid_clock(hour: u32, minute: u32) -> Option<(u32, u32)> {
    (hour < 24 && minute < 60).then_some((hour, minute))
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Build a create request from extracted fields
///
/// The start comes from the `start` field, or else from the first of
/// `texts` that [`resolve_relative_datetime`] understands. An end that is
/// missing or not after the start becomes start + 1h. `None` when no start
/// can be found.
#[must_use]
pub fn normalize_event(
    fields: &Map<String, Value>,
    texts: &[&str],
    now: DateTime<FixedOffset>,
) -> Option<EventDraft> {
    let start = text_field(fields, "start")
        .and_then(parse_timestamp)
        .or_else(|| {
            texts
                .iter()
                .find_map(|text| resolve_relative_datetime(text, now))
        })?;

    let end = text_field(fields, "end")
        .and_then(parse_timestamp)
        .filter(|end| *end > start)
        .unwrap_or(start + Duration::minutes(DEFAULT_EVENT_MINUTES));

    Some(EventDraft {
        summary: text_field(fields, "summary")
            .unwrap_or("New event")
            .to_string(),
        location: text_field(fields, "location").unwrap_or_default().to_string(),
        description: text_field(fields, "description")
            .unwrap_or_default()
            .to_string(),
        start: format_timestamp(&start),
        end: format_timestamp(&end),
    })
}

/// PATCH body from a model-produced diff
///
/// Only event fields survive: `id` never reaches the body. Timestamps get
/// their offset filled in; blank or null timestamps are dropped.
#[must_use]
pub fn build_patch_body(diff: &Map<String, Value>) -> Map<String, Value> {
    diff.iter()
        .filter(|(key, value)| PATCHABLE_FIELDS.contains(&key.as_str()) && !value.is_null())
        .filter_map(|(key, value)| {
            if key == "start" || key == "end" {
                let at = value.as_str().and_then(parse_timestamp)?;
                Some((key.clone(), Value::String(format_timestamp(&at))))
            } else {
                Some((key.clone(), value.clone()))
            }
        })
        .collect()
}
