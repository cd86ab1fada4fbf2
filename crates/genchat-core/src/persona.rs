use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParsePersonaError;

/// The role label forwarded with every question. It is passed through to the
/// generation service uninterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Assistant,
    Expert,
    Friend,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::Assistant, Persona::Expert, Persona::Friend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Assistant => "assistant",
            Persona::Expert => "expert",
            Persona::Friend => "friend",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Assistant => "Assistant",
            Persona::Expert => "Expert",
            Persona::Friend => "Friend",
        }
    }

    /// Position in [`Persona::ALL`], used by pickers.
    pub fn index(&self) -> usize {
        match self {
            Persona::Assistant => 0,
            Persona::Expert => 1,
            Persona::Friend => 2,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = ParsePersonaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "assistant" => Ok(Persona::Assistant),
            "expert" => Ok(Persona::Expert),
            "friend" => Ok(Persona::Friend),
            _ => Err(ParsePersonaError(s.to_string())),
        }
    }
}
