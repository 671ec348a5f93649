//! Sparse probability mass functions over hashable keys.
//!
//! A [`Distribution`] is the message type passed between time steps of the
//! inference engines and the row type of the transition and emission
//! tables. Two contracts matter to callers:
//!
//! - Looking up a key that was never inserted returns weight `0.0`.
//! - Iteration follows first-insertion order, so sampling and argmax
//!   tie-breaks are reproducible run to run.

use rand::Rng;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::hash::Hash;

/// Sparse, insertion-ordered map from key to non-negative weight.
#[derive(Debug, Clone)]
pub struct Distribution<K> {
    entries: Vec<(K, f64)>,
    index: HashMap<K, usize>,
}

impl<K> Default for Distribution<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Distribution<K> {
    /// Create an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight 1 on every key (an unnormalized all-ones message).
    pub fn uniform_weight<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut dist = Self::new();
        for key in keys {
            dist.set(key.clone(), 1.0);
        }
        dist
    }

    /// Uniform probability over the given keys.
    pub fn uniform<'a, I>(keys: I) -> Self
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        let mut dist = Self::uniform_weight(keys);
        dist.renormalize();
        dist
    }

    /// Weight of `key`; absent keys weigh zero.
    pub fn get(&self, key: &K) -> f64 {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Whether `key` has ever been inserted (even with zero weight).
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Overwrite the weight of `key`.
    pub fn set(&mut self, key: K, weight: f64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = weight,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, weight));
            }
        }
    }

    /// Accumulate `weight` onto `key`.
    pub fn add(&mut self, key: K, weight: f64) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += weight,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, weight));
            }
        }
    }

    /// Entries in first-insertion order, including zero weights.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.entries.iter().map(|(k, w)| (k, *w))
    }

    /// Entries with strictly positive weight, in first-insertion order.
    pub fn support(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.iter().filter(|(_, w)| *w > 0.0)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// True when no entry carries positive weight.
    pub fn is_degenerate(&self) -> bool {
        self.support().next().is_none()
    }

    /// Scale weights to sum to one.
    ///
    /// Returns `false` and leaves the distribution untouched when the total
    /// is zero (or not finite).
    pub fn renormalize(&mut self) -> bool {
        let total = self.total();
        if total == 0.0 || !total.is_finite() {
            return false;
        }
        for (_, w) in &mut self.entries {
            *w /= total;
        }
        true
    }

    /// Key with the largest weight. The earliest-inserted key wins ties.
    pub fn argmax(&self) -> Option<&K> {
        let mut best: Option<(&K, f64)> = None;
        for (key, weight) in self.support() {
            match best {
                Some((_, w)) if weight <= w => {}
                _ => best = Some((key, weight)),
            }
        }
        best.map(|(k, _)| k)
    }

    /// The `n` heaviest entries, heaviest first; equal weights keep
    /// insertion order.
    pub fn top(&self, n: usize) -> Vec<(&K, f64)> {
        let mut ranked: Vec<(&K, f64)> = self.support().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Inverse-CDF sampling with a caller-supplied uniform draw in `[0, 1)`.
    ///
    /// Walks entries in insertion order and returns the first key whose
    /// cumulative normalized weight exceeds `u`. Floating-point shortfall at
    /// the top end falls back to the last positive-weight key. Returns
    /// `None` for an empty or all-zero distribution.
    pub fn sample_at(&self, u: f64) -> Option<&K> {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        let target = u * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for (key, weight) in self.support() {
            cumulative += weight;
            if cumulative > target {
                return Some(key);
            }
            last = Some(key);
        }
        last
    }

    /// Draw a key using `rng`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&K> {
        let u: f64 = rng.random();
        self.sample_at(u)
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, f64)> for Distribution<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut dist = Self::new();
        for (key, weight) in iter {
            dist.add(key, weight);
        }
        dist
    }
}

impl<K: PartialEq> PartialEq for Distribution<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

#[derive(Serialize)]
struct WeightedEntry<'a, K> {
    state: &'a K,
    weight: f64,
}

/// Serializes as an ordered list of `{"state": .., "weight": ..}` objects.
impl<K: Serialize> Serialize for Distribution<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (state, weight) in &self.entries {
            seq.serialize_element(&WeightedEntry {
                state,
                weight: *weight,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn abc() -> Distribution<&'static str> {
        [("a", 1.0), ("b", 2.0), ("c", 1.0)].into_iter().collect()
    }

    #[test]
    fn absent_key_weighs_zero() {
        let d = abc();
        assert_eq!(d.get(&"z"), 0.0);
        assert!(!d.contains(&"z"));
    }

    #[test]
    fn add_accumulates_and_keeps_order() {
        let mut d = Distribution::new();
        d.add("x", 0.25);
        d.add("y", 0.5);
        d.add("x", 0.25);
        let keys: Vec<_> = d.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["x", "y"]);
        assert_eq!(d.get(&"x"), 0.5);
    }

    #[test]
    fn renormalize_sums_to_one() {
        let mut d = abc();
        assert!(d.renormalize());
        assert!((d.total() - 1.0).abs() < 1e-12);
        assert!((d.get(&"b") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn renormalize_zero_mass_is_noop() {
        let mut d: Distribution<&str> = [("a", 0.0), ("b", 0.0)].into_iter().collect();
        assert!(!d.renormalize());
        assert!(d.is_degenerate());
        assert_eq!(d.len(), 2);
        assert_eq!(d.total(), 0.0);
    }

    #[test]
    fn uniform_over_keys() {
        let keys = ["p", "q", "r", "s"];
        let d = Distribution::uniform(keys.iter());
        for k in &keys {
            assert!((d.get(k) - 0.25).abs() < 1e-12);
        }
        let ones = Distribution::uniform_weight(keys.iter());
        assert_eq!(ones.total(), 4.0);
    }

    #[test]
    fn argmax_first_seen_wins_ties() {
        let d: Distribution<&str> = [("a", 0.4), ("b", 0.4), ("c", 0.2)].into_iter().collect();
        assert_eq!(d.argmax(), Some(&"a"));
        assert_eq!(Distribution::<&str>::new().argmax(), None);
    }

    #[test]
    fn top_orders_by_weight() {
        let d = abc();
        let top = d.top(2);
        assert_eq!(top[0].0, &"b");
        assert_eq!(top[1].0, &"a");
    }

    #[test]
    fn sample_at_walks_cdf() {
        let d = abc();
        assert_eq!(d.sample_at(0.0), Some(&"a"));
        assert_eq!(d.sample_at(0.24), Some(&"a"));
        assert_eq!(d.sample_at(0.25), Some(&"b"));
        assert_eq!(d.sample_at(0.74), Some(&"b"));
        assert_eq!(d.sample_at(0.75), Some(&"c"));
        assert_eq!(d.sample_at(0.999_999), Some(&"c"));
    }

    #[test]
    fn sample_skips_zero_weight_keys() {
        let d: Distribution<&str> = [("dead", 0.0), ("live", 1.0)].into_iter().collect();
        assert_eq!(d.sample_at(0.0), Some(&"live"));
        let empty: Distribution<&str> = [("dead", 0.0)].into_iter().collect();
        assert_eq!(empty.sample_at(0.5), None);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let d = abc();
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..32).map(|_| *d.sample(&mut rng).unwrap()).collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
    }

    #[test]
    fn serializes_as_ordered_pairs() {
        let d: Distribution<&str> = [("b", 0.5), ("a", 0.5)].into_iter().collect();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(
            json,
            r#"[{"state":"b","weight":0.5},{"state":"a","weight":0.5}]"#
        );
    }
}
