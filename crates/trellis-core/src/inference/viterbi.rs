//! Most-likely hidden path (Viterbi) as a min-sum over negative logs.
//!
//! Costs are `-ln p` throughout, so products of small probabilities become
//! sums that cannot underflow. Each step keeps a dense cost vector indexed
//! by the position of the state in `hidden_states()`, plus a back-pointer
//! to the predecessor that achieved it.
//!
//! Ties are broken deterministically: candidates are visited in
//! `hidden_states()` order and only a strictly smaller cost replaces the
//! incumbent, so the first-enumerated state wins.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};
use trellis_math::neg_log;

use crate::inference::{check_observations, InferenceError};
use crate::model::HiddenMarkovModel;

/// Result of a Viterbi decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViterbiPath<S> {
    /// One entry per time step. Every entry is `None` when no path has
    /// finite cost.
    pub states: Vec<Option<S>>,
    /// Total cost `-ln P(path, observations)`; `+inf` when impossible.
    pub cost: f64,
    /// `ln P(path, observations)`, the negated cost.
    pub log_probability: f64,
}

impl<S> ViterbiPath<S> {
    /// True when a finite-cost path exists.
    pub fn is_feasible(&self) -> bool {
        self.cost.is_finite()
    }

    /// Number of steps where the decoded path differs from `truth`.
    pub fn mismatches(&self, truth: &[S]) -> usize
    where
        S: PartialEq,
    {
        self.states
            .iter()
            .zip(truth)
            .filter(|(decoded, actual)| decoded.as_ref() != Some(*actual))
            .count()
    }
}

/// Viterbi decoder bound to a model.
#[derive(Debug, Clone, Copy)]
pub struct Viterbi<'m, M> {
    model: &'m M,
}

impl<'m, M: HiddenMarkovModel> Viterbi<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Decode the single most likely hidden path.
    pub fn decode(
        &self,
        observations: &[Option<M::Obs>],
    ) -> Result<ViterbiPath<M::State>, InferenceError> {
        check_observations(self.model, observations)?;

        let states = self.model.hidden_states();
        let n = states.len();
        let position: HashMap<&M::State, usize> =
            states.iter().enumerate().map(|(i, s)| (s, i)).collect();

        // Per-state emission cost at step t.
        let emission_costs = |obs: Option<&M::Obs>| -> Vec<f64> {
            states
                .iter()
                .map(|s| neg_log(self.model.observation_likelihood(s, obs)))
                .collect()
        };

        // Transition rows as (target index, cost), computed once.
        let transitions: Vec<Vec<(usize, f64)>> = states
            .iter()
            .map(|s| {
                self.model
                    .transition(s)
                    .support()
                    .filter_map(|(next, p)| position.get(next).map(|&j| (j, neg_log(p))))
                    .collect()
            })
            .collect();

        let first = emission_costs(observations[0].as_ref());
        let mut cost: Vec<f64> = states
            .iter()
            .zip(&first)
            .map(|(s, e)| neg_log(self.model.prior().get(s)) + e)
            .collect();
        let mut back_pointers: Vec<Vec<Option<usize>>> = Vec::with_capacity(observations.len());

        for obs in &observations[1..] {
            let mut next = vec![f64::INFINITY; n];
            let mut pointer = vec![None; n];
            for (i, row) in transitions.iter().enumerate() {
                if !cost[i].is_finite() {
                    continue;
                }
                for &(j, step) in row {
                    let candidate = cost[i] + step;
                    if candidate < next[j] {
                        next[j] = candidate;
                        pointer[j] = Some(i);
                    }
                }
            }
            for (j, e) in emission_costs(obs.as_ref()).into_iter().enumerate() {
                next[j] += e;
            }
            cost = next;
            back_pointers.push(pointer);
        }

        let mut best: Option<(usize, f64)> = None;
        for (i, &c) in cost.iter().enumerate() {
            if c.is_finite() && best.map_or(true, |(_, b)| c < b) {
                best = Some((i, c));
            }
        }

        let Some((mut current, total)) = best else {
            warn!(
                steps = observations.len(),
                "no hidden path explains the observation sequence"
            );
            return Ok(ViterbiPath {
                states: vec![None; observations.len()],
                cost: f64::INFINITY,
                log_probability: f64::NEG_INFINITY,
            });
        };

        let mut path = Vec::with_capacity(observations.len());
        path.push(current);
        for pointer in back_pointers.iter().rev() {
            match pointer[current] {
                Some(prev) => {
                    current = prev;
                    path.push(current);
                }
                None => break,
            }
        }
        path.reverse();

        debug!(steps = observations.len(), cost = total, "viterbi decode finished");

        Ok(ViterbiPath {
            states: path.into_iter().map(|i| Some(states[i].clone())).collect(),
            cost: total,
            log_probability: -total,
        })
    }
}

/// Most likely sequence of hidden states for `observations`.
///
/// Every entry is `None` when the observations are impossible under the
/// model. Use [`Viterbi::decode`] for the path cost as well.
pub fn viterbi<M: HiddenMarkovModel>(
    model: &M,
    observations: &[Option<M::Obs>],
) -> Result<Vec<Option<M::State>>, InferenceError> {
    Ok(Viterbi::new(model).decode(observations)?.states)
}
