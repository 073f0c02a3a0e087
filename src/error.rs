use std::io;
use std::result;
use std::sync::PoisonError;

use thiserror::Error as ThisError;

use crate::giveaway::models::GiveawayStatus;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Clone, Eq, PartialEq, ThisError)]
pub enum Error {
    #[error("The giveaway `{0}` was not found.")]
    NotFound(String),
    #[error("The giveaway `{0}` already exists.")]
    AlreadyExists(String),
    #[error("Can't {operation} the giveaway `{id}` while it is {status}.")]
    InvalidState {
        id: String,
        status: GiveawayStatus,
        operation: &'static str,
    },
    #[error("{0}")]
    InvalidInput(String),
    #[error("There are no other participants left to draw.")]
    NoEligibleCandidates,
    #[error("The giveaway storage is unavailable: {0}")]
    StorageUnavailable(String),
    #[error("{0}")]
    Configuration(String),
}

impl Error {
    // Only persistence failures are worth alerting an operator about.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }

    // Errors that are shown privately to the acting user rather than
    // reported as a generic failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::AlreadyExists(_)
                | Error::InvalidState { .. }
                | Error::InvalidInput(_)
                | Error::NoEligibleCandidates
        )
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::StorageUnavailable(format!("malformed giveaway document ({})", err))
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Error {
        Error::StorageUnavailable(format!("a storage lock was poisoned: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::error::Error;
    use crate::giveaway::models::GiveawayStatus;

    #[test]
    fn test_only_storage_errors_are_fatal() {
        assert_eq!(Error::StorageUnavailable("disk".to_string()).is_fatal(), true);
        assert_eq!(Error::NotFound("1".to_string()).is_fatal(), false);
        assert_eq!(Error::NoEligibleCandidates.is_fatal(), false);
    }

    #[test]
    fn test_user_facing_errors() {
        let error = Error::InvalidState {
            id: "1".to_string(),
            status: GiveawayStatus::Running,
            operation: "edit",
        };
        assert_eq!(error.is_user_facing(), true);
        assert_eq!(Error::InvalidInput("bad".to_string()).is_user_facing(), true);
        assert_eq!(
            Error::StorageUnavailable("disk".to_string()).is_user_facing(),
            false
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let error = Error::InvalidState {
            id: "42".to_string(),
            status: GiveawayStatus::Ended,
            operation: "join",
        };
        assert_eq!(
            error.to_string(),
            "Can't join the giveaway `42` while it is ended."
        );
    }

    #[test]
    fn test_io_error_becomes_storage_unavailable() {
        let error = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(error, Error::StorageUnavailable("boom".to_string()));
    }
}
