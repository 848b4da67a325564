//! Deterministic UK pickup-time phrase parser. Pure function;
//! the core treats an unparseable phrase identically to "not provided".

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Europe::London;
use regex::Regex;
use taxi_domain::contracts::{ParsedTime, UkTimeParser};

static IN_MINUTES_RE: OnceLock<Regex> = OnceLock::new();
static AT_TIME_RE: OnceLock<Regex> = OnceLock::new();

fn in_minutes_re() -> &'static Regex {
    IN_MINUTES_RE.get_or_init(|| Regex::new(r"(?i)^in\s+(\d{1,3})\s*min(ute)?s?$").unwrap())
}

fn at_time_re() -> &'static Regex {
    AT_TIME_RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:at\s+)?(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").unwrap()
    })
}

const ASAP_SYNONYMS: &[&str] = &["asap", "as soon as possible", "now", "right away", "straight away"];

/// Resolves a small closed set of UK pickup-time phrases: ASAP synonyms,
/// "in N minutes", "at HH:MM" (12h or 24h), weekday names, and "tomorrow".
/// Anything else is unparseable.
#[derive(Debug, Clone, Default)]
pub struct UkPickupTimeParser;

impl UkTimeParser for UkPickupTimeParser {
    fn parse(&self, text: &str) -> Option<ParsedTime> {
        let trimmed = text.trim();
        let lower = trimmed.to_ascii_lowercase();

        if ASAP_SYNONYMS.contains(&lower.as_str()) {
            return Some(ParsedTime {
                normalized: "ASAP".into(),
                is_asap: true,
                absolute_utc: None,
            });
        }

        if let Some(caps) = in_minutes_re().captures(&lower) {
            let minutes: i64 = caps[1].parse().ok()?;
            let when = Utc::now() + Duration::minutes(minutes);
            return Some(ParsedTime {
                normalized: format!("in {minutes} minutes"),
                is_asap: false,
                absolute_utc: Some(when),
            });
        }

        if let Some((day_offset, rest)) = strip_day_prefix(&lower) {
            return parse_clock_time(rest, day_offset);
        }

        parse_clock_time(&lower, 0)
    }
}

/// Strip a leading "tomorrow" or weekday-name prefix, returning the day
/// offset in days and the remaining text.
fn strip_day_prefix(lower: &str) -> Option<(i64, &str)> {
    if let Some(rest) = lower.strip_prefix("tomorrow") {
        return Some((1, rest.trim_start_matches(|c| c == ' ' || c == ',')));
    }
    let weekdays: &[(&str, Weekday)] = &[
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ];
    for (name, target) in weekdays {
        if let Some(rest) = lower.strip_prefix(name) {
            let today = Utc::now().with_timezone(&London).weekday();
            let mut offset = (target.num_days_from_monday() as i64)
                - (today.num_days_from_monday() as i64);
            if offset <= 0 {
                offset += 7;
            }
            return Some((offset, rest.trim_start_matches(|c| c == ' ' || c == ',')));
        }
    }
    None
}

fn parse_clock_time(rest: &str, day_offset: i64) -> Option<ParsedTime> {
    let rest = rest.trim();
    if rest.is_empty() {
        // A bare "tomorrow"/weekday with no clock time is unparseable: the
        // core needs a concrete pickup instant, not just a date.
        return None;
    }
    let caps = at_time_re().captures(rest)?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    if let Some(meridiem) = caps.get(3) {
        let is_pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        if is_pm && hour < 12 {
            hour += 12;
        } else if !is_pm && hour == 12 {
            hour = 0;
        }
    }
    if hour > 23 || minute > 59 {
        return None;
    }

    let now_london = Utc::now().with_timezone(&London);
    let target_date = now_london.date_naive() + Duration::days(day_offset);
    let naive_time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let local = London
        .from_local_datetime(&target_date.and_time(naive_time))
        .single()?;
    let when = local.with_timezone(&Utc);

    Some(ParsedTime {
        normalized: format!("{hour:02}:{minute:02}"),
        is_asap: false,
        absolute_utc: Some(when),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asap_synonyms_parsed() {
        for phrase in ["ASAP", "right away", "Now"] {
            let parsed = UkPickupTimeParser.parse(phrase).expect("should parse");
            assert!(parsed.is_asap);
            assert!(parsed.absolute_utc.is_none());
        }
    }

    #[test]
    fn in_minutes_parsed() {
        let parsed = UkPickupTimeParser
            .parse("in 20 minutes")
            .expect("should parse");
        assert!(!parsed.is_asap);
        assert!(parsed.absolute_utc.is_some());
    }

    #[test]
    fn at_time_24h_parsed() {
        let parsed = UkPickupTimeParser.parse("18:30").expect("should parse");
        assert_eq!(parsed.normalized, "18:30");
        assert!(parsed.absolute_utc.is_some());
    }

    #[test]
    fn at_time_12h_pm_parsed() {
        let parsed = UkPickupTimeParser.parse("6:30pm").expect("should parse");
        assert_eq!(parsed.normalized, "18:30");
    }

    #[test]
    fn bare_weekday_without_time_is_unparseable() {
        assert!(UkPickupTimeParser.parse("Monday").is_none());
    }

    #[test]
    fn garbage_is_unparseable() {
        assert!(UkPickupTimeParser.parse("whenever is fine").is_none());
    }
}
