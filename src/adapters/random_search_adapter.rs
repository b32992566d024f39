//! Uniform random parameter search adapter.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::error::KestrelError;
use crate::domain::strategy::{Constraint, ParamKind, ParamValue};
use crate::ports::search_port::SearchPort;

/// Samples each constrained parameter uniformly within its bounds.
///
/// Seeded for reproducible searches. A missing lower bound defaults to zero;
/// an upper bound is required.
pub struct RandomSearchAdapter {
    rng: StdRng,
}

impl RandomSearchAdapter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SearchPort for RandomSearchAdapter {
    fn suggest(
        &mut self,
        constraints: &[Constraint],
    ) -> Result<HashMap<String, ParamValue>, KestrelError> {
        let mut parameters = HashMap::new();
        for constraint in constraints {
            let min = constraint.min.unwrap_or(0.0);
            let max = constraint.max.ok_or_else(|| KestrelError::ConfigInvalid {
                section: "search".to_string(),
                key: constraint.name.clone(),
                reason: "parameter has no upper bound to sample from".to_string(),
            })?;
            let value = match constraint.kind {
                ParamKind::Int => {
                    ParamValue::Int(self.rng.gen_range(min as i64..=max as i64))
                }
                ParamKind::Float => ParamValue::Float(self.rng.gen_range(min..=max)),
            };
            parameters.insert(constraint.name.clone(), value);
        }
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_constraint(name: &str, min: f64, max: f64) -> Constraint {
        Constraint {
            name: name.into(),
            kind: ParamKind::Int,
            min: Some(min),
            max: Some(max),
        }
    }

    #[test]
    fn samples_stay_within_bounds() {
        let constraints = vec![
            int_constraint("hour", 0.0, 23.0),
            Constraint {
                name: "ratio".into(),
                kind: ParamKind::Float,
                min: Some(0.1),
                max: Some(0.9),
            },
        ];
        let mut search = RandomSearchAdapter::new(42);
        for _ in 0..100 {
            let parameters = search.suggest(&constraints).unwrap();
            match parameters.get("hour") {
                Some(ParamValue::Int(hour)) => assert!((0..=23).contains(hour)),
                other => panic!("expected int parameter, got {other:?}"),
            }
            match parameters.get("ratio") {
                Some(ParamValue::Float(ratio)) => assert!((0.1..=0.9).contains(ratio)),
                other => panic!("expected float parameter, got {other:?}"),
            }
        }
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let constraints = vec![int_constraint("step", 1.0, 1000.0)];
        let mut first = RandomSearchAdapter::new(7);
        let mut second = RandomSearchAdapter::new(7);
        for _ in 0..10 {
            assert_eq!(
                first.suggest(&constraints).unwrap(),
                second.suggest(&constraints).unwrap()
            );
        }
    }

    #[test]
    fn missing_lower_bound_defaults_to_zero() {
        let constraints = vec![Constraint {
            name: "minute".into(),
            kind: ParamKind::Int,
            min: None,
            max: Some(5.0),
        }];
        let mut search = RandomSearchAdapter::new(1);
        for _ in 0..50 {
            match search.suggest(&constraints).unwrap().get("minute") {
                Some(ParamValue::Int(minute)) => assert!((0..=5).contains(minute)),
                other => panic!("expected int parameter, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_upper_bound_fails() {
        let constraints = vec![Constraint {
            name: "open_ended".into(),
            kind: ParamKind::Float,
            min: Some(0.0),
            max: None,
        }];
        let mut search = RandomSearchAdapter::new(1);
        assert!(matches!(
            search.suggest(&constraints),
            Err(KestrelError::ConfigInvalid { .. })
        ));
    }
}
