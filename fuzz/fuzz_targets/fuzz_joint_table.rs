//! Fuzz target for joint-table analysis.
//!
//! Any table that passes validation yields a non-negative mutual
//! information bounded by the smaller marginal entropy.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis_math::analyze_joint;

fuzz_target!(|data: &[u8]| {
    let Ok(joint) = serde_json::from_slice::<Vec<Vec<f64>>>(data) else {
        return;
    };
    if let Ok(summary) = analyze_joint(&joint) {
        let total: f64 = summary.marginal_x.iter().sum();
        // The bound only holds for normalized tables.
        if (total - 1.0).abs() < 1e-9 && summary.mutual_information.is_finite() {
            let bound = summary.entropy_x.min(summary.entropy_y);
            assert!(summary.mutual_information >= -1e-9);
            assert!(summary.mutual_information <= bound + 1e-6);
        }
    }
});
