//! Candle timeframe codes ("1m", "4h", "1d").

use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use super::error::KestrelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    pub fn letter(&self) -> char {
        match self {
            TimeUnit::Minute => 'm',
            TimeUnit::Hour => 'h',
            TimeUnit::Day => 'd',
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'm' => Some(TimeUnit::Minute),
            'h' => Some(TimeUnit::Hour),
            'd' => Some(TimeUnit::Day),
            _ => None,
        }
    }
}

/// A candle duration code such as "4h".
///
/// The code always equals `value` followed by the unit letter; the duration is
/// derived from those two fields, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timeframe {
    value: u32,
    unit: TimeUnit,
    code: String,
}

impl Timeframe {
    pub fn new(value: u32, unit: TimeUnit) -> Self {
        Timeframe {
            value,
            unit,
            code: format!("{}{}", value, unit.letter()),
        }
    }

    /// Parse a code like "15m" or "4h".
    pub fn parse(code: &str) -> Result<Self, KestrelError> {
        let mut chars = code.chars();
        let unit_letter = chars.next_back().ok_or_else(|| KestrelError::InvalidTimeframe {
            code: code.to_string(),
            reason: "empty code".into(),
        })?;
        let unit = TimeUnit::from_letter(unit_letter).ok_or_else(|| {
            KestrelError::InvalidTimeframe {
                code: code.to_string(),
                reason: format!("unknown unit `{unit_letter}`"),
            }
        })?;
        let value: u32 = chars.as_str().parse().map_err(|_| KestrelError::InvalidTimeframe {
            code: code.to_string(),
            reason: "value is not a positive integer".into(),
        })?;
        if value == 0 {
            return Err(KestrelError::InvalidTimeframe {
                code: code.to_string(),
                reason: "value must be non-zero".into(),
            });
        }
        Ok(Timeframe::new(value, unit))
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn duration(&self) -> Duration {
        let value = i64::from(self.value);
        match self.unit {
            TimeUnit::Minute => Duration::minutes(value),
            TimeUnit::Hour => Duration::hours(value),
            TimeUnit::Day => Duration::days(value),
        }
    }
}

impl FromStr for Timeframe {
    type Err = KestrelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::parse(s)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl PartialOrd for Timeframe {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timeframe {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // equal durations under distinct codes ("1h" vs "60m") fall back to
        // the code, keeping the ordering consistent with equality
        self.duration()
            .cmp(&other.duration())
            .then_with(|| self.code.cmp(&other.code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minutes() {
        let tf = Timeframe::parse("15m").unwrap();
        assert_eq!(tf.value(), 15);
        assert_eq!(tf.unit(), TimeUnit::Minute);
        assert_eq!(tf.code(), "15m");
        assert_eq!(tf.duration(), Duration::minutes(15));
    }

    #[test]
    fn parse_hours() {
        let tf = Timeframe::parse("4h").unwrap();
        assert_eq!(tf.value(), 4);
        assert_eq!(tf.unit(), TimeUnit::Hour);
        assert_eq!(tf.duration(), Duration::hours(4));
    }

    #[test]
    fn parse_days() {
        let tf = Timeframe::parse("1d").unwrap();
        assert_eq!(tf.duration(), Duration::days(1));
    }

    #[test]
    fn code_matches_value_and_unit() {
        let tf = Timeframe::new(30, TimeUnit::Minute);
        assert_eq!(tf.code(), "30m");
        assert_eq!(tf.to_string(), "30m");
    }

    #[test]
    fn parse_rejects_unknown_unit() {
        assert!(Timeframe::parse("4x").is_err());
    }

    #[test]
    fn parse_rejects_missing_value() {
        assert!(Timeframe::parse("h").is_err());
        assert!(Timeframe::parse("").is_err());
    }

    #[test]
    fn parse_rejects_zero() {
        assert!(Timeframe::parse("0m").is_err());
    }

    #[test]
    fn ordering_follows_duration() {
        let m30 = Timeframe::parse("30m").unwrap();
        let h1 = Timeframe::parse("1h").unwrap();
        let m60 = Timeframe::parse("60m").unwrap();
        assert!(m30 < h1);
        assert_eq!(h1.duration(), m60.duration());
        // same duration but distinct codes: unequal, and never Ordering::Equal
        assert_ne!(h1, m60);
        assert_ne!(h1.cmp(&m60), std::cmp::Ordering::Equal);
        assert!(h1 < m60);
    }
}
