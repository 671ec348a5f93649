//! Forward-backward smoothing over a discrete hidden Markov chain.
//!
//! # Messages
//!
//! - `alpha[t]`: forward message, proportional to P(x_t, y_0..y_{t-1}).
//!   `alpha[0]` is the prior.
//! - `beta[t]`: backward message, proportional to P(y_{t+1}..y_{T-1} | x_t).
//!   `beta[T-1]` is weight 1 on every state (not a probability).
//! - `gamma[t]`: marginal P(x_t | y_0..y_{T-1}), the renormalized product
//!   `alpha[t] * beta[t] * P(y_t | x_t)`.
//!
//! Forward and backward messages are renormalized after every step to keep
//! them in floating range. A missing observation (`None`) contributes a
//! factor of 1.
//!
//! Work per step is bounded by the support of the previous message times
//! the fan-out of the transition rows; dense `|S|^2` products never occur.
//!
//! # Degenerate sequences
//!
//! If the observations are impossible under the model, some messages carry
//! no mass. Those marginals come back all-zero rather than as an error, and
//! their time steps are listed in [`ForwardBackwardResult::degenerate_steps`].

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::distribution::Distribution;
use crate::inference::{check_observations, InferenceError};
use crate::model::HiddenMarkovModel;

/// Full output of a forward-backward run.
#[derive(Debug, Clone)]
pub struct ForwardBackwardResult<S> {
    /// Posterior marginal per time step.
    pub marginals: Vec<Distribution<S>>,
    /// Normalized forward messages.
    pub forward: Vec<Distribution<S>>,
    /// Normalized backward messages.
    pub backward: Vec<Distribution<S>>,
    /// Time steps whose marginal has zero total mass.
    pub degenerate_steps: Vec<usize>,
}

impl<S> ForwardBackwardResult<S> {
    /// True when every marginal is a proper distribution.
    pub fn is_consistent(&self) -> bool {
        self.degenerate_steps.is_empty()
    }
}

/// Predecessors of each state with their transition probability:
/// `reverse[s'] = [(s, P(s'|s)), ...]`, nonzero entries only.
type ReverseTransitions<'m, S> = HashMap<&'m S, Vec<(&'m S, f64)>>;

/// Forward-backward engine bound to a model.
#[derive(Debug, Clone, Copy)]
pub struct ForwardBackward<'m, M> {
    model: &'m M,
}

impl<'m, M: HiddenMarkovModel> ForwardBackward<'m, M> {
    pub fn new(model: &'m M) -> Self {
        Self { model }
    }

    /// Marginal distribution of the hidden state at every time step.
    pub fn run(
        &self,
        observations: &[Option<M::Obs>],
    ) -> Result<Vec<Distribution<M::State>>, InferenceError> {
        Ok(self.run_detailed(observations)?.marginals)
    }

    /// Marginals plus the intermediate messages.
    pub fn run_detailed(
        &self,
        observations: &[Option<M::Obs>],
    ) -> Result<ForwardBackwardResult<M::State>, InferenceError> {
        check_observations(self.model, observations)?;
        debug!(
            steps = observations.len(),
            states = self.model.hidden_states().len(),
            "forward-backward started"
        );

        let forward = self.forward_messages(observations);
        let reverse = self.reverse_transitions();
        let backward = self.backward_messages(observations, &reverse);

        let mut marginals = Vec::with_capacity(observations.len());
        let mut degenerate_steps = Vec::new();
        for (t, obs) in observations.iter().enumerate() {
            let mut marginal = Distribution::new();
            for state in self.model.hidden_states() {
                let p_obs = self.model.observation_likelihood(state, obs.as_ref());
                let weight = forward[t].get(state) * backward[t].get(state) * p_obs;
                marginal.set(state.clone(), weight);
            }
            if !marginal.renormalize() {
                degenerate_steps.push(t);
            }
            marginals.push(marginal);
        }

        if !degenerate_steps.is_empty() {
            warn!(
                first = degenerate_steps[0],
                count = degenerate_steps.len(),
                "observation sequence has zero probability under the model; marginals at these steps are all-zero"
            );
        }
        debug!(degenerate = degenerate_steps.len(), "forward-backward finished");

        Ok(ForwardBackwardResult {
            marginals,
            forward,
            backward,
            degenerate_steps,
        })
    }

    fn forward_messages(&self, observations: &[Option<M::Obs>]) -> Vec<Distribution<M::State>> {
        let mut messages = Vec::with_capacity(observations.len());
        messages.push(self.model.prior().clone());

        for t in 1..observations.len() {
            let previous = &messages[t - 1];
            let obs = observations[t - 1].as_ref();
            let mut next = Distribution::new();
            for (state, p) in previous.support() {
                let p_obs = self.model.observation_likelihood(state, obs);
                for (next_state, p_next) in self.model.transition(state).support() {
                    next.add(next_state.clone(), p * p_obs * p_next);
                }
            }
            next.renormalize();
            messages.push(next);
        }
        messages
    }

    /// One-time inversion of the transition model.
    fn reverse_transitions(&self) -> ReverseTransitions<'m, M::State> {
        let model: &'m M = self.model;
        let mut reverse: ReverseTransitions<'m, M::State> = HashMap::new();
        for state in model.hidden_states() {
            for (next_state, p) in model.transition(state).support() {
                reverse.entry(next_state).or_default().push((state, p));
            }
        }
        reverse
    }

    fn backward_messages(
        &self,
        observations: &[Option<M::Obs>],
        reverse: &ReverseTransitions<'m, M::State>,
    ) -> Vec<Distribution<M::State>> {
        let steps = observations.len();
        let mut messages = vec![Distribution::new(); steps];
        messages[steps - 1] = Distribution::uniform_weight(self.model.hidden_states());

        for t in (0..steps - 1).rev() {
            // The observation at t+1 is explained by the later state.
            let obs = observations[t + 1].as_ref();
            let mut current = Distribution::new();
            for (next_state, b) in messages[t + 1].support() {
                let p_obs = self.model.observation_likelihood(next_state, obs);
                if let Some(predecessors) = reverse.get(next_state) {
                    for &(state, p) in predecessors {
                        current.add(state.clone(), b * p_obs * p);
                    }
                }
            }
            current.renormalize();
            messages[t] = current;
        }
        messages
    }
}

/// Marginal state distributions for every time step of `observations`.
pub fn forward_backward<M: HiddenMarkovModel>(
    model: &M,
    observations: &[Option<M::Obs>],
) -> Result<Vec<Distribution<M::State>>, InferenceError> {
    ForwardBackward::new(model).run(observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TabularModel;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    /// Classic umbrella world: rain persists, umbrellas signal rain.
    fn umbrella() -> TabularModel<&'static str, &'static str> {
        TabularModel::new(
            vec!["rain", "sun"],
            vec!["umbrella", "none"],
            [("rain", 0.5), ("sun", 0.5)].into_iter().collect(),
        )
        .with_transition("rain", [("rain", 0.7), ("sun", 0.3)].into_iter().collect())
        .with_transition("sun", [("rain", 0.3), ("sun", 0.7)].into_iter().collect())
        .with_emission("rain", [("umbrella", 0.9), ("none", 0.1)].into_iter().collect())
        .with_emission("sun", [("umbrella", 0.2), ("none", 0.8)].into_iter().collect())
    }

    #[test]
    fn marginals_sum_to_one() {
        let model = umbrella();
        let obs = [Some("umbrella"), Some("umbrella"), Some("none"), None, Some("umbrella")];
        let marginals = forward_backward(&model, &obs).unwrap();

        assert_eq!(marginals.len(), obs.len());
        for m in &marginals {
            assert!(approx_eq(m.total(), 1.0, 1e-12));
        }
    }

    #[test]
    fn textbook_two_day_smoothing() {
        // Russell & Norvig: P(rain_1 | u_1, u_2) = 0.883.
        let model = umbrella();
        let obs = [Some("umbrella"), Some("umbrella")];
        let marginals = forward_backward(&model, &obs).unwrap();
        assert!(approx_eq(marginals[0].get(&"rain"), 0.883, 1e-3));
        assert!(approx_eq(marginals[1].get(&"rain"), 0.883, 1e-3));
    }

    #[test]
    fn single_step_is_prior_times_likelihood() {
        let model = umbrella();
        let marginals = forward_backward(&model, &[Some("none")]).unwrap();
        let rain = 0.5 * 0.1;
        let sun = 0.5 * 0.8;
        assert!(approx_eq(marginals[0].get(&"rain"), rain / (rain + sun), 1e-12));
        assert!(approx_eq(marginals[0].get(&"sun"), sun / (rain + sun), 1e-12));
    }

    #[test]
    fn detailed_messages_line_up() {
        let model = umbrella();
        let obs = [Some("umbrella"), None, Some("none")];
        let result = ForwardBackward::new(&model).run_detailed(&obs).unwrap();

        assert_eq!(result.forward.len(), 3);
        assert_eq!(result.backward.len(), 3);
        assert!(result.is_consistent());
        assert_eq!(result.forward[0], *model.prior());
        assert_eq!(result.backward[2].get(&"rain"), 1.0);
        assert_eq!(result.backward[2].get(&"sun"), 1.0);
    }

    #[test]
    fn impossible_sequence_is_degenerate_not_error() {
        let model = TabularModel::new(
            vec!["a", "b"],
            vec!['a', 'b'],
            [("a", 1.0)].into_iter().collect(),
        )
        .with_transition("a", [("a", 1.0)].into_iter().collect())
        .with_transition("b", [("b", 1.0)].into_iter().collect())
        .with_emission("a", [('a', 1.0)].into_iter().collect())
        .with_emission("b", [('b', 1.0)].into_iter().collect());

        let result = ForwardBackward::new(&model)
            .run_detailed(&[Some('a'), Some('b')])
            .unwrap();
        assert!(!result.is_consistent());
        assert!(result.degenerate_steps.contains(&1));
        for m in &result.marginals {
            assert_eq!(m.total(), 0.0);
        }
    }

    #[test]
    fn rejects_unknown_observation() {
        let model = umbrella();
        let err = forward_backward(&model, &[Some("snow")]).unwrap_err();
        assert!(matches!(err, InferenceError::UnknownObservation { t: 0, .. }));
    }
}
