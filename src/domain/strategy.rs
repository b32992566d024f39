//! Strategy interface and signal plumbing.

use std::collections::HashMap;

use log::debug;

use super::error::KestrelError;
use super::fluctuations::Fluctuations;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Wait,
}

/// Numeric parameter kind for optimizer constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Float,
}

/// One concrete parameter value suggested by a search oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

/// Inclusive numeric bounds on one tunable strategy field.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub kind: ParamKind,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A signal generator over market data.
///
/// Implementations are side-effect free: given the same fluctuations they
/// return the same signals. Tunable strategies expose their parameter schema
/// through [`Strategy::constraints`] and accept new values through
/// [`Strategy::apply_parameters`].
pub trait Strategy {
    fn name(&self) -> &str;

    /// One signal per candle, or fewer; never more.
    fn compute_signals(&self, fluctuations: &Fluctuations) -> Vec<Signal>;

    /// Parameter schema for the optimizer. Non-tunable strategies return
    /// nothing.
    fn constraints(&self) -> Vec<Constraint> {
        Vec::new()
    }

    fn apply_parameters(
        &mut self,
        parameters: &HashMap<String, ParamValue>,
    ) -> Result<(), KestrelError> {
        match parameters.keys().next() {
            Some(name) => Err(KestrelError::UnknownParameter { name: name.clone() }),
            None => Ok(()),
        }
    }
}

/// Compute signals and align them with the candle sequence.
///
/// A strategy may return fewer signals than candles (warm-up bars); the front
/// is padded with `Wait`. More signals than candles is a fatal error.
pub fn padded_signals(
    strategy: &dyn Strategy,
    fluctuations: &Fluctuations,
) -> Result<Vec<Signal>, KestrelError> {
    let mut signals = strategy.compute_signals(fluctuations);
    let expected = fluctuations.len();

    if signals.len() > expected {
        return Err(KestrelError::TooManySignals {
            strategy: strategy.name().to_string(),
            expected,
            got: signals.len(),
        });
    }
    if signals.len() < expected {
        debug!(
            "strategy `{}` produced {} signals for {} candles, front-padding with WAIT",
            strategy.name(),
            signals.len(),
            expected
        );
        let mut padded = vec![Signal::Wait; expected - signals.len()];
        padded.append(&mut signals);
        signals = padded;
    }
    Ok(signals)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    EveryDay,
}

impl Weekday {
    fn number(&self) -> Option<u32> {
        match self {
            Weekday::Monday => Some(0),
            Weekday::Tuesday => Some(1),
            Weekday::Wednesday => Some(2),
            Weekday::Thursday => Some(3),
            Weekday::Friday => Some(4),
            Weekday::Saturday => Some(5),
            Weekday::Sunday => Some(6),
            Weekday::EveryDay => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "monday" => Some(Weekday::Monday),
            "tuesday" => Some(Weekday::Tuesday),
            "wednesday" => Some(Weekday::Wednesday),
            "thursday" => Some(Weekday::Thursday),
            "friday" => Some(Weekday::Friday),
            "saturday" => Some(Weekday::Saturday),
            "sunday" => Some(Weekday::Sunday),
            "every_day" => Some(Weekday::EveryDay),
            _ => None,
        }
    }
}

/// Dollar-cost averaging: buy whenever a candle opens at the configured
/// weekday, hour and minute.
#[derive(Debug, Clone)]
pub struct DcaStrategy {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl Default for DcaStrategy {
    fn default() -> Self {
        DcaStrategy {
            weekday: Weekday::EveryDay,
            hour: 0,
            minute: 0,
        }
    }
}

impl Strategy for DcaStrategy {
    fn name(&self) -> &str {
        "dca"
    }

    fn compute_signals(&self, fluctuations: &Fluctuations) -> Vec<Signal> {
        use chrono::{Datelike, Timelike};

        fluctuations
            .candles()
            .iter()
            .map(|candle| {
                let open_time = candle.open_time;
                let weekday_matches = match self.weekday.number() {
                    Some(number) => open_time.weekday().num_days_from_monday() == number,
                    None => true,
                };
                if weekday_matches
                    && open_time.hour() == self.hour
                    && open_time.minute() == self.minute
                {
                    Signal::Buy
                } else {
                    Signal::Wait
                }
            })
            .collect()
    }

    fn constraints(&self) -> Vec<Constraint> {
        vec![
            Constraint {
                name: "hour".into(),
                kind: ParamKind::Int,
                min: Some(0.0),
                max: Some(23.0),
            },
            Constraint {
                name: "minute".into(),
                kind: ParamKind::Int,
                min: Some(0.0),
                max: Some(59.0),
            },
        ]
    }

    fn apply_parameters(
        &mut self,
        parameters: &HashMap<String, ParamValue>,
    ) -> Result<(), KestrelError> {
        for (name, value) in parameters {
            match (name.as_str(), value) {
                ("hour", ParamValue::Int(hour)) => self.hour = *hour as u32,
                ("minute", ParamValue::Int(minute)) => self.minute = *minute as u32,
                _ => {
                    return Err(KestrelError::UnknownParameter { name: name.clone() });
                }
            }
        }
        Ok(())
    }
}
