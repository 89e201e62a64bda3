//! Cross-cutting pieces shared by every stage: configuration, errors,
//! cancellation and presentation formatting.

pub mod cancel;
pub mod config;
pub mod error;
pub mod format;
