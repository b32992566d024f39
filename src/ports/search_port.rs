//! Parameter search port trait.

use std::collections::HashMap;

use crate::domain::error::KestrelError;
use crate::domain::strategy::{Constraint, ParamValue};

/// Port suggesting candidate parameter values within a strategy's
/// constraints. Implementations may keep internal state across calls.
pub trait SearchPort {
    fn suggest(
        &mut self,
        constraints: &[Constraint],
    ) -> Result<HashMap<String, ParamValue>, KestrelError>;
}
