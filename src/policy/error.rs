//! Registration policy errors

use thiserror::Error;

/// Reasons a registration or withdrawal is rejected.
///
/// Every variant is an expected, user-facing condition. The display strings are
/// meant for logs; handlers pick a localised message from [`PolicyError::kind`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    #[error("event does not exist")]
    NotFound,

    #[error("event has already taken place")]
    EventCompleted,

    #[error("registration closed, event is {days_until_event} day(s) away")]
    RegistrationClosed { days_until_event: i64 },

    #[error("user is already registered for this event")]
    AlreadyRegistered,

    #[error("user is not registered for this event")]
    NotRegistered,
}

/// Result type alias for policy checks
pub type PolicyResult<T> = std::result::Result<T, PolicyError>;

impl PolicyError {
    /// HTTP-style status code
    pub fn status_code(&self) -> u16 {
        match self {
            PolicyError::NotFound => 404,
            PolicyError::EventCompleted
            | PolicyError::RegistrationClosed { .. }
            | PolicyError::AlreadyRegistered
            | PolicyError::NotRegistered => 400,
        }
    }

    /// Stable tag for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyError::NotFound => "not_found",
            PolicyError::EventCompleted => "event_completed",
            PolicyError::RegistrationClosed { .. } => "registration_closed",
            PolicyError::AlreadyRegistered => "already_registered",
            PolicyError::NotRegistered => "not_registered",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(PolicyError::NotFound.status_code(), 404);
        assert_eq!(PolicyError::EventCompleted.status_code(), 400);
        assert_eq!(PolicyError::RegistrationClosed { days_until_event: 7 }.status_code(), 400);
        assert_eq!(PolicyError::AlreadyRegistered.status_code(), 400);
        assert_eq!(PolicyError::NotRegistered.status_code(), 400);
    }

    #[test]
    fn test_kinds_are_distinct() {
        let kinds = [
            PolicyError::NotFound.kind(),
            PolicyError::EventCompleted.kind(),
            PolicyError::RegistrationClosed { days_until_event: 0 }.kind(),
            PolicyError::AlreadyRegistered.kind(),
            PolicyError::NotRegistered.kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
