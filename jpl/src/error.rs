//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::pipeline::Stage;

pub type JplResult<T> = std::result::Result<T, JplError>;

#[derive(Debug)]
pub enum JplError {
    /// Writing a dump or report failed.
    Fmt(fmt::Error),
    /// Compilation stopped with diagnostics.
    Failed { stage: Stage, count: usize },
}

impl Display for JplError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fmt(err) => write!(f, "{}", err),
            Self::Failed { stage, count } => {
                write!(f, "{} failed with {} error(s)", stage, count)
            }
        }
    }
}

impl std::error::Error for JplError {}

impl From<fmt::Error> for JplError {
    fn from(err: fmt::Error) -> Self {
        JplError::Fmt(err)
    }
}
