//! Chat context selecting the server-side persona.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Which assistant persona a turn targets.
///
/// Opaque to the relay; the proxy uses it to pick an upstream app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatContext {
    /// Site-wide assistant answering questions about the portfolio.
    #[default]
    General,
    /// Business inquiry assistant on the contact section.
    Business,
}

impl ChatContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatContext::General => "general",
            ChatContext::Business => "business",
        }
    }
}

impl fmt::Display for ChatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatContext {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(ChatContext::General),
            "business" => Ok(ChatContext::Business),
            other => Err(ValidationError::invalid_format(
                "context",
                format!("unknown chat context '{}'", other),
            )),
        }
    }
}
