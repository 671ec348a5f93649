//! Fuzz target for model.json parsing and validation.
//!
//! Arbitrary input must produce a model or a `ValidationError`, never a
//! panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use trellis_config::{validate_model, ModelFile};

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(model) = ModelFile::from_json(json) {
            let _ = validate_model(&model);
        }
    }
});
