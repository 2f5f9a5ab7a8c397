//! Plain data types shared by the firefly engine and its hosts.
//!
//! Nothing in here advances simulation state; behaviour lives in `firefly_core`.

pub mod data;

pub use data::agent::*;
pub use data::cosmos::*;
pub use data::environment::*;
pub use data::events::*;
pub use data::genetics::*;
pub use data::predator::*;
pub use data::social::*;
pub use data::trail::*;

use thiserror::Error;

/// Returned when a name from a config file or command line does not match any variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} name: {name}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub name: String,
}

impl ParseNameError {
    pub fn new(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}

/// Lower-cases and strips separators so `dark-arts`, `Dark Arts` and `dark_arts` all match.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
