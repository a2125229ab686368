use std::fmt;
use std::str::FromStr;

use thiserror::Error;

mod dispatcher;
mod error;
mod listeners;

pub use dispatcher::Dispatcher;
pub use error::ActionError;

/// User-facing actions, as named by menu entries and keyboard commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Compose,
    Summarize,
    Cancel,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Compose => "compose",
            Action::Summarize => "summarize",
            Action::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compose" => Ok(Action::Compose),
            "summarize" => Ok(Action::Summarize),
            "cancel" => Ok(Action::Cancel),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}
