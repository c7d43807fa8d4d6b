use serde::{Deserialize, Serialize};

use crate::types::TypeTag;

fn default_enforce() -> bool {
    true
}

fn default_message_width() -> usize {
    70
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// When off, declarations skip validation and no call or assignment is
    /// checked.
    #[serde(default = "default_enforce")]
    pub enforce: bool,
    #[serde(default = "default_message_width")]
    pub message_width: usize,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            enforce: default_enforce(),
            message_width: default_message_width(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclareOptions {
    /// `false` validates the declaration and records the capabilities without
    /// enforcing them on attribute writes or method calls.
    pub wrap: bool,
}

impl Default for DeclareOptions {
    fn default() -> Self {
        Self { wrap: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub type_tag: TypeTag,
    pub capabilities: Vec<String>,
    pub added: Vec<String>,
}
