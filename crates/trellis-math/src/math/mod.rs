//! Core math modules.

pub mod info;
pub mod stable;
