//! Strategy parameter search over cross-validation folds.

use std::collections::HashMap;

use log::debug;

use super::error::KestrelError;
use super::fluctuations::Fluctuations;
use super::session::{SessionConfig, TradingSession};
use super::split::SplitManager;
use super::stats;
use super::strategy::{ParamValue, Strategy};
use crate::ports::search_port::SearchPort;

/// One evaluated parameter set with its train and validation Sharpe ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialScore {
    pub parameters: HashMap<String, ParamValue>,
    pub train_score: f64,
    pub val_score: f64,
}

/// Searches the parameter space of a strategy for the best trading
/// performance on market data.
pub struct Optimizer<S: Strategy> {
    strategy: S,
    session_config: SessionConfig,
    n_trials: usize,
}

impl<S: Strategy> Optimizer<S> {
    /// At least one trial is always run.
    pub fn new(strategy: S, session_config: SessionConfig, n_trials: usize) -> Self {
        Optimizer {
            strategy,
            session_config,
            n_trials: n_trials.max(1),
        }
    }

    /// Evaluate `n_trials` suggested parameter sets on the train data and
    /// return the one with the lowest validation score, the most pessimistic
    /// pick against overfitting the training folds.
    pub fn optimize(
        &mut self,
        train_fluctuations: &Fluctuations,
        val_fluctuations: &Fluctuations,
        search: &mut dyn SearchPort,
    ) -> Result<TrialScore, KestrelError> {
        let constraints = self.strategy.constraints();
        let mut scores: Vec<TrialScore> = Vec::with_capacity(self.n_trials);

        for trial in 0..self.n_trials {
            let parameters = search.suggest(&constraints)?;
            self.strategy.apply_parameters(&parameters)?;

            let session = TradingSession::new(&self.strategy, self.session_config.clone());
            let (train_trades, _) = session.get_trades(train_fluctuations)?;
            let (val_trades, _) = session.get_trades(val_fluctuations)?;
            let train_score = stats::sharpe(&train_trades);
            let val_score = stats::sharpe(&val_trades);
            debug!("trial {trial}: train sharpe {train_score}, val sharpe {val_score}");

            scores.push(TrialScore {
                parameters,
                train_score,
                val_score,
            });
        }

        // n_trials is clamped to at least 1, so a retained trial always exists
        let best = scores
            .into_iter()
            .min_by(|a, b| a.val_score.total_cmp(&b.val_score))
            .ok_or(KestrelError::EmptyCandles)?;
        Ok(best)
    }

    /// Run the search once per cross-validation fold and collect the
    /// retained trial of each.
    pub fn find_ccpv_best_parameters(
        &mut self,
        split_manager: &SplitManager,
        search: &mut dyn SearchPort,
    ) -> Result<Vec<TrialScore>, KestrelError> {
        let mut best_parameters = Vec::with_capacity(split_manager.len());
        for index in 0..split_manager.len() {
            let (train_fluctuations, val_fluctuations) = split_manager.get_split(index)?;
            best_parameters.push(self.optimize(&train_fluctuations, &val_fluctuations, search)?);
        }
        Ok(best_parameters)
    }
}
