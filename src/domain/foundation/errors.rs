//! Error types for the engine core.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Error codes organized by category.
///
/// These are the exact codes a front-end discriminates on: ticket
/// validation and donation creation must never collapse into a generic
/// failure, so "already used", "not paid yet" and "invalid event" each
/// carry their own code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Caller errors
    InvalidArgument,
    Unauthenticated,
    Unauthorized,

    // Lookup errors
    NotFound,

    // State errors
    Conflict,
    NotPaid,
    AlreadyRedeemed,
    TicketExpired,

    // Infrastructure errors
    Unavailable,
    Internal,
}

impl ErrorCode {
    /// Returns true if the caller may safely retry the operation.
    ///
    /// Mutating operations are idempotent or version-guarded, so a
    /// collaborator timeout never leaves the caller guessing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::Unavailable)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotPaid => "NOT_PAID",
            ErrorCode::AlreadyRedeemed => "ALREADY_REDEEMED",
            ErrorCode::TicketExpired => "TICKET_EXPIRED",
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates an invalid-argument error for a specific field.
    pub fn invalid_argument(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message).with_detail("field", field.into())
    }

    /// Creates an unauthenticated error.
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, message)
    }

    /// Creates a not-found error for the named resource.
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Creates a conflict error (state-machine precondition violated).
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Creates a not-paid error naming the entry's current state.
    pub fn not_paid(current_state: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotPaid, "Ticket is not paid")
            .with_detail("state", current_state.into())
    }

    /// Creates an already-redeemed error.
    pub fn already_redeemed() -> Self {
        Self::new(ErrorCode::AlreadyRedeemed, "Ticket has already been redeemed")
    }

    /// Creates a ticket-expired error with the rejecting rule as message.
    pub fn ticket_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TicketExpired, message)
    }

    /// Creates an unavailable error (collaborator timeout or network failure).
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unavailable, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}
