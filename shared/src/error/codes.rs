//! Unified error codes for the menu editor
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Restaurant errors
//! - 4xxx: Category errors
//! - 5xxx: Dish errors
//! - 6xxx: Staging / commit errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 3xxx: Restaurant ====================
    /// Restaurant not found
    RestaurantNotFound = 3001,
    /// No restaurant loaded into the editing session
    RestaurantNotLoaded = 3002,
    /// Slug already used by another restaurant
    SlugTaken = 3003,
    /// Slug is not in normalized form
    SlugInvalid = 3004,

    // ==================== 4xxx: Category ====================
    /// Category not found
    CategoryNotFound = 4001,
    /// Category name already exists
    CategoryNameExists = 4002,
    /// Category is staged for deletion
    CategoryStagedForDelete = 4003,

    // ==================== 5xxx: Dish ====================
    /// Dish not found
    DishNotFound = 5001,
    /// Dish price is invalid
    DishInvalidPrice = 5002,

    // ==================== 6xxx: Staging ====================
    /// Temporary id used where a server id is required (or vice versa)
    InvalidTempId = 6001,
    /// Payload id does not match the staged id
    IdMismatch = 6002,
    /// A commit is already running for this session
    CommitInProgress = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9002,
    /// Operation timed out
    TimeoutError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Restaurant
            ErrorCode::RestaurantNotFound => "Restaurant not found",
            ErrorCode::RestaurantNotLoaded => "No restaurant loaded",
            ErrorCode::SlugTaken => "Slug is already taken",
            ErrorCode::SlugInvalid => "Slug is not normalized",

            // Category
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryNameExists => "Category name already exists",
            ErrorCode::CategoryStagedForDelete => "Category is staged for deletion",

            // Dish
            ErrorCode::DishNotFound => "Dish not found",
            ErrorCode::DishInvalidPrice => "Dish price is invalid",

            // Staging
            ErrorCode::InvalidTempId => "Invalid temporary id",
            ErrorCode::IdMismatch => "Payload id does not match staged id",
            ErrorCode::CommitInProgress => "A commit is already in progress",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Restaurant
            3001 => Ok(ErrorCode::RestaurantNotFound),
            3002 => Ok(ErrorCode::RestaurantNotLoaded),
            3003 => Ok(ErrorCode::SlugTaken),
            3004 => Ok(ErrorCode::SlugInvalid),

            // Category
            4001 => Ok(ErrorCode::CategoryNotFound),
            4002 => Ok(ErrorCode::CategoryNameExists),
            4003 => Ok(ErrorCode::CategoryStagedForDelete),

            // Dish
            5001 => Ok(ErrorCode::DishNotFound),
            5002 => Ok(ErrorCode::DishInvalidPrice),

            // Staging
            6001 => Ok(ErrorCode::InvalidTempId),
            6002 => Ok(ErrorCode::IdMismatch),
            6003 => Ok(ErrorCode::CommitInProgress),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::NetworkError),
            9003 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::SlugTaken.code(), 3003);
        assert_eq!(ErrorCode::CategoryStagedForDelete.code(), 4003);
        assert_eq!(ErrorCode::DishNotFound.code(), 5001);
        assert_eq!(ErrorCode::CommitInProgress.code(), 6003);
        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(3003), Ok(ErrorCode::SlugTaken));
        assert_eq!(ErrorCode::try_from(6001), Ok(ErrorCode::InvalidTempId));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(9999), Err(InvalidErrorCode(9999)));
        assert_eq!(ErrorCode::try_from(7001), Err(InvalidErrorCode(7001)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::DishInvalidPrice).unwrap();
        assert_eq!(json, "5002");

        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::CategoryNotFound);

        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::SlugTaken.message(), "Slug is already taken");
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::Unknown.is_success());
    }
}
