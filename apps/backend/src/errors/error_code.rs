//! Error codes for the matchroom API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings that appear
//! in HTTP responses.

use core::fmt;

/// Centralized error codes for the matchroom API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Request Validation
    /// Malformed session id in the path or body
    InvalidSessionId,
    /// Card id out of range, already face up, or already matched
    InvalidCard,
    /// Two cards are already pending evaluation
    TooManyFlipped,
    /// Symbol pool smaller than the requested pair count
    InsufficientPoolSize,
    /// Operation incompatible with the session status
    InvalidState,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Turn Rules
    /// Move attempted by the player who does not hold the turn
    NotYourTurn,
    /// Access denied
    Forbidden,

    // Resource Not Found
    /// Session not found
    SessionNotFound,
    /// Player not found
    PlayerNotFound,
    /// General not found error
    NotFound,

    // Conflicts
    /// Session already has two players
    SessionFull,
    /// Session id already taken
    SessionExists,
    /// Lost a compare-and-swap race
    OptimisticLock,
    /// Compare-and-swap retry budget exhausted
    TooManyRetries,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System Errors
    /// Session store unreachable or failing
    StoreUnavailable,
    /// Broadcast gateway failure
    BroadcastFailed,
    /// Stored data could not be decoded
    DataCorruption,
    /// Configuration error
    ConfigError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidSessionId => "INVALID_SESSION_ID",
            Self::InvalidCard => "INVALID_CARD",
            Self::TooManyFlipped => "TOO_MANY_FLIPPED",
            Self::InsufficientPoolSize => "INSUFFICIENT_POOL_SIZE",
            Self::InvalidState => "INVALID_STATE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::Forbidden => "FORBIDDEN",

            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::PlayerNotFound => "PLAYER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::SessionFull => "SESSION_FULL",
            Self::SessionExists => "SESSION_EXISTS",
            Self::OptimisticLock => "OPTIMISTIC_LOCK",
            Self::TooManyRetries => "TOO_MANY_RETRIES",
            Self::Conflict => "CONFLICT",

            Self::StoreUnavailable => "STORE_UNAVAILABLE",
            Self::BroadcastFailed => "BROADCAST_FAILED",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Every code, in declaration order. Used by uniqueness checks.
    pub const ALL: [ErrorCode; 22] = [
        Self::InvalidSessionId,
        Self::InvalidCard,
        Self::TooManyFlipped,
        Self::InsufficientPoolSize,
        Self::InvalidState,
        Self::ValidationError,
        Self::BadRequest,
        Self::NotYourTurn,
        Self::Forbidden,
        Self::SessionNotFound,
        Self::PlayerNotFound,
        Self::NotFound,
        Self::SessionFull,
        Self::SessionExists,
        Self::OptimisticLock,
        Self::TooManyRetries,
        Self::Conflict,
        Self::StoreUnavailable,
        Self::BroadcastFailed,
        Self::DataCorruption,
        Self::ConfigError,
        Self::InternalError,
    ];
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
