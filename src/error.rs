//! Application error types.
//!
//! Every failure surfaces as a specific kind so the HTTP layer can map it to
//! a distinct status code and machine-readable error code.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned by the core operations.
///
/// All variants serialize to a structured JSON object.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Referenced PR, user or team does not exist.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// A mutating operation was attempted on a merged (terminal) PR.
    #[error("Pull request {pr_id} is already merged")]
    PrMerged { pr_id: i64 },

    /// The reviewer to replace is not currently assigned to the PR.
    #[error("User {reviewer_id} is not assigned to pull request {pr_id}")]
    NotAssigned { pr_id: i64, reviewer_id: i64 },

    /// No active teammate is left to take over the review.
    #[error("No active replacement candidate for pull request {pr_id}")]
    NoCandidate { pr_id: i64 },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a database error with optional operation context.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a database error with operation context.
    pub fn database_with_op(message: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::PrMerged { .. } => "PR_MERGED",
            Self::NotAssigned { .. } => "NOT_ASSIGNED",
            Self::NoCandidate { .. } => "NO_CANDIDATE",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Check if this error rejects a request against the PR state machine
    /// or reviewer set, as opposed to a missing resource or storage failure.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PrMerged { .. } | Self::NotAssigned { .. } | Self::NoCandidate { .. }
        )
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::database("connection failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Database\""));
        assert!(json.contains("connection failed"));
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("PullRequest", "123");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"PullRequest\""));
        assert!(json.contains("\"id\":\"123\""));
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::database("error");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("operation"));
    }

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            AppError::not_found("User"),
            AppError::PrMerged { pr_id: 1 },
            AppError::NotAssigned { pr_id: 1, reviewer_id: 2 },
            AppError::NoCandidate { pr_id: 1 },
            AppError::invalid_input("bad"),
            AppError::database("down"),
            AppError::internal("oops"),
        ];
        let codes: std::collections::HashSet<&str> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_conflict_kinds() {
        assert!(AppError::PrMerged { pr_id: 7 }.is_conflict());
        assert!(AppError::NoCandidate { pr_id: 9 }.is_conflict());
        assert!(!AppError::not_found("PullRequest").is_conflict());
        assert!(!AppError::database("locked").is_conflict());
    }

    #[test]
    fn test_display_impl() {
        let err = AppError::NotAssigned { pr_id: 9, reviewer_id: 5 };
        assert_eq!(
            format!("{}", err),
            "User 5 is not assigned to pull request 9"
        );
    }
}
