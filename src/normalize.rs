//! Turns loosely-typed request text into canonical value objects.
//!
//! Every projection produced here feeds the cache key grammar
//! `<city>_<state>_<period>`, so the rules must stay byte-stable.

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid state name: {0}")]
    InvalidState(String),
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("invalid hour count: {0}")]
    InvalidHourCount(String),
}

/// A city name in the three forms used for URLs, cache keys and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub as_url: String,
    pub as_key: String,
    pub as_name: String,
}

/// A US state, always reduced to its two-letter postal code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub as_url: String,
    pub as_key: String,
    pub as_name: String,
}

/// A single daytime or nighttime forecast slot on a weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub as_key: String,
    pub as_name: String,
    #[serde(serialize_with = "serialize_weekday")]
    pub day_of_week: Weekday,
    pub is_daytime: bool,
}

impl Period {
    pub fn new(day_of_week: Weekday, is_daytime: bool) -> Self {
        let name = weekday_name(day_of_week);
        let lower = name.to_ascii_lowercase();
        if is_daytime {
            Self {
                as_key: lower,
                as_name: name.to_string(),
                day_of_week,
                is_daytime,
            }
        } else {
            Self {
                as_key: format!("{}_night", lower),
                as_name: format!("{} night", name),
                day_of_week,
                is_daytime,
            }
        }
    }

    pub fn day_name(&self) -> &'static str {
        weekday_name(self.day_of_week)
    }
}

fn serialize_weekday<S: serde::Serializer>(day: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*day))
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// Full names and postal codes of the 50 states, keyed by lowercase full name.
const STATE_CODES: [(&str, &str); 50] = [
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

fn is_separator(ch: char) -> bool {
    matches!(ch, '_' | '+' | ' ')
}

/// Replaces every run of `_`, `+` or space with a single `with`.
fn replace_separators(raw: &str, with: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_run = false;
    for ch in raw.chars() {
        if is_separator(ch) {
            if !in_run {
                out.push(with);
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

pub fn normalize_city(raw: &str) -> City {
    City {
        as_url: replace_separators(raw, '+'),
        as_key: replace_separators(raw, '_').to_lowercase(),
        as_name: replace_separators(raw, ' '),
    }
}

pub fn normalize_state(raw: &str) -> Result<State, NormalizeError> {
    let key = replace_separators(raw, ' ').to_lowercase();
    STATE_CODES
        .iter()
        .find(|(name, code)| *name == key || code.eq_ignore_ascii_case(&key))
        .map(|(_, code)| State {
            as_url: code.to_string(),
            as_key: code.to_ascii_lowercase(),
            as_name: code.to_string(),
        })
        .ok_or_else(|| NormalizeError::InvalidState(raw.to_string()))
}

pub fn normalize_period(raw: &str) -> Result<Period, NormalizeError> {
    normalize_period_on(raw, Utc::now().date_naive())
}

/// Same as [`normalize_period`], resolving relative terms against `today`.
pub fn normalize_period_on(raw: &str, today: NaiveDate) -> Result<Period, NormalizeError> {
    let text = replace_separators(raw, ' ').to_lowercase();
    let tomorrow = today + Duration::days(1);

    let resolved = if text.contains("today") {
        weekday_name(today.weekday()).to_string()
    } else if text.contains("tonight") {
        format!("{} night", weekday_name(today.weekday()))
    } else if text.contains("tomorrow night") {
        format!("{} night", weekday_name(tomorrow.weekday()))
    } else if text.contains("tomorrow") {
        weekday_name(tomorrow.weekday()).to_string()
    } else {
        text
    };

    match_period(&resolved.to_lowercase())
        .ok_or_else(|| NormalizeError::InvalidPeriod(raw.to_string()))
}

/// Finds the leftmost weekday name in `text`, optionally followed by `night`.
fn match_period(text: &str) -> Option<Period> {
    for (start, _) in text.char_indices() {
        let rest = &text[start..];
        let matched = WEEKDAYS.iter().find_map(|day| {
            let name = weekday_name(*day).to_ascii_lowercase();
            rest.starts_with(&name).then(|| (*day, &rest[name.len()..]))
        });
        if let Some((day, tail)) = matched {
            let tail = tail.strip_prefix(' ').unwrap_or(tail);
            let is_daytime = !tail.starts_with("night");
            return Some(Period::new(day, is_daytime));
        }
    }
    None
}

/// Picks a weekday in the coming week and a time of day uniformly.
pub fn random_period<R: Rng + ?Sized>(rng: &mut R) -> Period {
    random_period_on(rng, Utc::now().date_naive())
}

pub fn random_period_on<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> Period {
    let day = today + Duration::days(rng.gen_range(0..7));
    let time_of_day = if rng.gen_bool(0.5) { "" } else { " night" };
    let raw = format!("{}{}", weekday_name(day.weekday()), time_of_day);
    normalize_period_on(&raw, today).unwrap_or_else(|e| {
        tracing::error!("Generated period did not normalize: {}", e);
        Period::new(day.weekday(), true)
    })
}

pub fn parse_hour_count(raw: &str) -> Result<u32, NormalizeError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| NormalizeError::InvalidHourCount(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    // 2026-10-14 is a Wednesday
    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_state_by_name_and_code() {
        let expected = State {
            as_url: "SD".to_string(),
            as_key: "sd".to_string(),
            as_name: "SD".to_string(),
        };
        assert_eq!(normalize_state("South Dakota").unwrap(), expected);
        assert_eq!(normalize_state("sd").unwrap(), expected);
        assert_eq!(normalize_state("south+dakota").unwrap(), expected);
        assert_eq!(normalize_state("SOUTH__DAKOTA").unwrap(), expected);
    }

    #[test]
    fn test_invalid_state() {
        assert_eq!(
            normalize_state("West Dakota"),
            Err(NormalizeError::InvalidState("West Dakota".to_string()))
        );
        assert!(normalize_state("").is_err());
        assert!(normalize_state("PR").is_err());
    }

    #[test]
    fn test_every_state_resolves_by_code() {
        for (name, code) in STATE_CODES.iter() {
            assert_eq!(normalize_state(code).unwrap().as_name, *code);
            assert_eq!(normalize_state(name).unwrap().as_key, code.to_ascii_lowercase());
        }
    }

    #[test]
    fn test_city_projections() {
        let city = normalize_city("Salt+Lake CITY");
        assert_eq!(city.as_url, "Salt+Lake+CITY");
        assert_eq!(city.as_key, "salt_lake_city");
        assert_eq!(city.as_name, "Salt Lake CITY");
    }

    #[test]
    fn test_city_collapses_separator_runs() {
        let city = normalize_city("New__York + City");
        assert_eq!(city.as_url, "New+York+City");
        assert_eq!(city.as_key, "new_york_city");
        assert_eq!(city.as_name, "New York City");
    }

    #[test]
    fn test_absolute_weekday() {
        let period = normalize_period("WEDNESDAY").unwrap();
        assert_eq!(period.as_key, "wednesday");
        assert_eq!(period.as_name, "Wednesday");
        assert_eq!(period.day_name(), "Wednesday");
        assert!(period.is_daytime);
    }

    #[test]
    fn test_weekday_night() {
        let period = normalize_period("friday+night").unwrap();
        assert_eq!(period.as_key, "friday_night");
        assert_eq!(period.as_name, "Friday night");
        assert_eq!(period.day_of_week, Weekday::Fri);
        assert!(!period.is_daytime);
    }

    #[test]
    fn test_relative_terms() {
        let today = wednesday();
        assert_eq!(
            normalize_period_on("today", today).unwrap(),
            Period::new(Weekday::Wed, true)
        );
        assert_eq!(
            normalize_period_on("Tonight", today).unwrap(),
            Period::new(Weekday::Wed, false)
        );
        assert_eq!(
            normalize_period_on("tomorrow", today).unwrap(),
            Period::new(Weekday::Thu, true)
        );

        let period = normalize_period_on("Tomorrow Night", today).unwrap();
        assert_eq!(period.day_of_week, Weekday::Thu);
        assert!(!period.is_daytime);
        assert_eq!(period.as_key, "thursday_night");
        assert_eq!(period.as_name, "Thursday night");
    }

    #[test]
    fn test_relative_and_absolute_converge() {
        let today = wednesday();
        assert_eq!(
            normalize_period_on("today", today).unwrap(),
            normalize_period_on("Wednesday", today).unwrap()
        );
        assert_eq!(
            normalize_period_on("tomorrow_night", today).unwrap(),
            normalize_period_on("thursday night", today).unwrap()
        );
        let thursday_night = normalize_period_on("thursday night", today).unwrap();
        for raw in ["tomorrow+night", "Tomorrow  Night", "TOMORROW_NIGHT"] {
            assert_eq!(normalize_period_on(raw, today).unwrap(), thursday_night, "{}", raw);
        }
    }

    #[test]
    fn test_relative_wraps_week() {
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let period = normalize_period_on("tomorrow", saturday).unwrap();
        assert_eq!(period.day_of_week, Weekday::Sun);
    }

    #[test]
    fn test_invalid_period() {
        assert_eq!(
            normalize_period("Reindeer"),
            Err(NormalizeError::InvalidPeriod("Reindeer".to_string()))
        );
        assert!(normalize_period("").is_err());
        assert!(normalize_period("night").is_err());
    }

    #[test]
    fn test_normalizers_are_pure() {
        assert_eq!(normalize_city("Sioux Falls"), normalize_city("Sioux Falls"));
        assert_eq!(normalize_state("texas"), normalize_state("texas"));
        let today = wednesday();
        assert_eq!(
            normalize_period_on("monday night", today),
            normalize_period_on("monday night", today)
        );
    }

    #[test]
    fn test_random_period_is_deterministic_and_valid() {
        let today = wednesday();
        let mut first = StdRng::seed_from_u64(7);
        let mut second = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a = random_period_on(&mut first, today);
            let b = random_period_on(&mut second, today);
            assert_eq!(a, b);
            assert_eq!(normalize_period_on(&a.as_name, today).unwrap(), a);
        }
    }

    #[test]
    fn test_random_period_covers_both_times_of_day() {
        let mut rng = StdRng::seed_from_u64(42);
        let periods: Vec<Period> = (0..200).map(|_| random_period(&mut rng)).collect();
        assert!(periods.iter().any(|p| p.is_daytime));
        assert!(periods.iter().any(|p| !p.is_daytime));
    }

    #[test]
    fn test_parse_hour_count() {
        assert_eq!(parse_hour_count("12"), Ok(12));
        assert_eq!(parse_hour_count("0"), Ok(0));
        assert_eq!(
            parse_hour_count("twelve"),
            Err(NormalizeError::InvalidHourCount("twelve".to_string()))
        );
        assert!(parse_hour_count("-3").is_err());
    }
}
