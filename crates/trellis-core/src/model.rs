//! Model provider abstraction for the inference engines.
//!
//! The engines never own a model; they borrow anything implementing
//! [`HiddenMarkovModel`] for the duration of a call and only read from it.
//! [`TabularModel`] is the stock implementation: precomputed sparse tables
//! keyed by state, built either programmatically or from a validated
//! [`ModelFile`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use trellis_config::validate::validate_model;
use trellis_config::ModelFile;

use crate::distribution::Distribution;
use crate::inference::InferenceError;

/// Read-only view of a discrete hidden Markov model.
///
/// Enumeration order of [`hidden_states`](Self::hidden_states) is the order
/// the engines use for tie-breaks.
pub trait HiddenMarkovModel {
    type State: Eq + Hash + Clone + Debug;
    type Obs: Eq + Hash + Clone + Debug;

    /// Every hidden state, in enumeration order.
    fn hidden_states(&self) -> &[Self::State];

    /// Every observation value, in enumeration order.
    fn observed_states(&self) -> &[Self::Obs];

    /// Distribution of the state at time 0.
    fn prior(&self) -> &Distribution<Self::State>;

    /// Distribution of the next state given `state`.
    fn transition(&self, state: &Self::State) -> &Distribution<Self::State>;

    /// Distribution of the observation emitted by `state`.
    fn emission(&self, state: &Self::State) -> &Distribution<Self::Obs>;

    /// Likelihood of `obs` under `state`. A missing observation is a
    /// neutral factor of 1, not an impossible event.
    fn observation_likelihood(&self, state: &Self::State, obs: Option<&Self::Obs>) -> f64 {
        match obs {
            Some(o) => self.emission(state).get(o),
            None => 1.0,
        }
    }
}

/// Sparse-table model.
#[derive(Debug, Clone)]
pub struct TabularModel<S, O> {
    hidden_states: Vec<S>,
    observed_states: Vec<O>,
    prior: Distribution<S>,
    transitions: HashMap<S, Distribution<S>>,
    emissions: HashMap<S, Distribution<O>>,
    no_transition: Distribution<S>,
    no_emission: Distribution<O>,
}

impl<S, O> TabularModel<S, O>
where
    S: Eq + Hash + Clone + Debug,
    O: Eq + Hash + Clone + Debug,
{
    /// Start a model with no transition or emission rows.
    pub fn new(hidden_states: Vec<S>, observed_states: Vec<O>, prior: Distribution<S>) -> Self {
        Self {
            hidden_states,
            observed_states,
            prior,
            transitions: HashMap::new(),
            emissions: HashMap::new(),
            no_transition: Distribution::new(),
            no_emission: Distribution::new(),
        }
    }

    /// Set the transition row of `state`.
    pub fn with_transition(mut self, state: S, row: Distribution<S>) -> Self {
        self.transitions.insert(state, row);
        self
    }

    /// Set the emission row of `state`.
    pub fn with_emission(mut self, state: S, row: Distribution<O>) -> Self {
        self.emissions.insert(state, row);
        self
    }
}

impl TabularModel<String, String> {
    /// Build a model from a model file, validating it first.
    ///
    /// Row entries are inserted in the file's declared state/observation
    /// order, and zero weights are dropped.
    pub fn from_config(file: &ModelFile) -> Result<Self, InferenceError> {
        validate_model(file)?;

        let prior = declared_row(&file.hidden_states, &file.prior);
        let mut model = Self::new(file.hidden_states.clone(), file.observations.clone(), prior);

        for state in &file.hidden_states {
            if let Some(row) = file.transitions.get(state) {
                let dist = declared_row(&file.hidden_states, row);
                model = model.with_transition(state.clone(), dist);
            }
            if let Some(row) = file.emissions.get(state) {
                let dist = declared_row(&file.observations, row);
                model = model.with_emission(state.clone(), dist);
            }
        }

        Ok(model)
    }
}

fn declared_row(order: &[String], row: &trellis_config::model::ProbabilityRow) -> Distribution<String> {
    order
        .iter()
        .filter_map(|key| match row.get(key) {
            Some(&w) if w > 0.0 => Some((key.clone(), w)),
            _ => None,
        })
        .collect()
}

impl<S, O> HiddenMarkovModel for TabularModel<S, O>
where
    S: Eq + Hash + Clone + Debug,
    O: Eq + Hash + Clone + Debug,
{
    type State = S;
    type Obs = O;

    fn hidden_states(&self) -> &[S] {
        &self.hidden_states
    }

    fn observed_states(&self) -> &[O] {
        &self.observed_states
    }

    fn prior(&self) -> &Distribution<S> {
        &self.prior
    }

    fn transition(&self, state: &S) -> &Distribution<S> {
        self.transitions.get(state).unwrap_or(&self.no_transition)
    }

    fn emission(&self, state: &S) -> &Distribution<O> {
        self.emissions.get(state).unwrap_or(&self.no_emission)
    }
}
