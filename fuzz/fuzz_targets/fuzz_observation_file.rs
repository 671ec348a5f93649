//! Fuzz target for observation file parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis_config::ObservationFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(file) = ObservationFile::from_json(json) {
            assert!(file.missing_count() <= file.observations.len());
        }
    }
});
