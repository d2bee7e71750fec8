//! Local session state configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where per-profile session state is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Key of the impersonated role in the state store
    #[serde(default = "default_impersonation_key")]
    pub impersonation_key: String,
    /// JSON file backing the state store
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            impersonation_key: default_impersonation_key(),
            state_file: default_state_file(),
        }
    }
}
