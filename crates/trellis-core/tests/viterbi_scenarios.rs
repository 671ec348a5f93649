//! Hand-computed decoding scenarios on small models.

use trellis_core::{forward_backward, viterbi, Distribution, TabularModel, Viterbi};

/// Two sticky states, each emitting its own name.
fn sticky_pair() -> TabularModel<&'static str, &'static str> {
    let row = |pairs: &[(&'static str, f64)]| pairs.iter().copied().collect::<Distribution<_>>();
    TabularModel::new(vec!["A", "B"], vec!["A", "B"], row(&[("A", 0.5), ("B", 0.5)]))
        .with_transition("A", row(&[("A", 0.9), ("B", 0.1)]))
        .with_transition("B", row(&[("A", 0.1), ("B", 0.9)]))
        .with_emission("A", row(&[("A", 1.0)]))
        .with_emission("B", row(&[("B", 1.0)]))
}

#[test]
fn deterministic_emissions_decode_verbatim() {
    let model = sticky_pair();
    let path = viterbi(&model, &[Some("A"), Some("A"), Some("B")]).unwrap();
    assert_eq!(path, vec![Some("A"), Some("A"), Some("B")]);

    // 0.5 * 0.9 * 0.1
    let decoded = Viterbi::new(&model).decode(&[Some("A"), Some("A"), Some("B")]).unwrap();
    assert!((decoded.log_probability - 0.045f64.ln()).abs() < 1e-12);
}

#[test]
fn missing_middle_step_keeps_first_state_on_tie() {
    // A,A,B and A,B,B both cost -ln(0.5 * 0.9 * 0.1); A enumerates first.
    let model = sticky_pair();
    let path = viterbi(&model, &[Some("A"), None, Some("B")]).unwrap();
    assert_eq!(path, vec![Some("A"), Some("A"), Some("B")]);

    let marginals = forward_backward(&model, &[Some("A"), None, Some("B")]).unwrap();
    assert!((marginals[1].get(&"A") - 0.5).abs() < 1e-12);
    assert!((marginals[1].get(&"B") - 0.5).abs() < 1e-12);
}

#[test]
fn single_step_is_prior_times_likelihood() {
    let row = |pairs: &[(&'static str, f64)]| pairs.iter().copied().collect::<Distribution<_>>();
    let model = TabularModel::new(vec!["A", "B"], vec!["x", "y"], row(&[("A", 0.3), ("B", 0.7)]))
        .with_transition("A", row(&[("A", 1.0)]))
        .with_transition("B", row(&[("B", 1.0)]))
        .with_emission("A", row(&[("x", 0.8), ("y", 0.2)]))
        .with_emission("B", row(&[("x", 0.1), ("y", 0.9)]));

    let marginals = forward_backward(&model, &[Some("x")]).unwrap();
    // 0.24 / (0.24 + 0.07)
    assert!((marginals[0].get(&"A") - 0.24 / 0.31).abs() < 1e-12);
    assert!((marginals[0].get(&"B") - 0.07 / 0.31).abs() < 1e-12);

    assert_eq!(viterbi(&model, &[Some("x")]).unwrap(), vec![Some("A")]);
    assert_eq!(viterbi(&model, &[None]).unwrap(), vec![Some("B")]);
}

#[test]
fn long_run_flips_once() {
    let model = sticky_pair();
    let mut obs = vec![Some("A"); 10];
    obs.extend(vec![Some("B"); 10]);

    let decoded = Viterbi::new(&model).decode(&obs).unwrap();
    assert_eq!(decoded.states, obs);
    assert_eq!(decoded.mismatches(&["A"; 20]), 10);
}
