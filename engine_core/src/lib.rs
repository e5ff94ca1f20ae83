//! Shared process facilities: logging and config path policy.
#![forbid(unsafe_code)]

pub mod logging;
pub mod path_policy;
