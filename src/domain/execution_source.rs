use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an extraction request comes from.
///
/// `Ide` is an ad hoc run from the prompt studio; `Tool` is a step inside a
/// workflow run and gets its own storage and the execution-metadata side
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSource {
    Ide,
    Tool,
}

impl ExecutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ide => "ide",
            Self::Tool => "tool",
        }
    }
}

impl TryFrom<&str> for ExecutionSource {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "ide" => Ok(Self::Ide),
            "tool" => Ok(Self::Tool),
            other => Err(format!(
                "Invalid execution source: {}. Expected: ide or tool",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
