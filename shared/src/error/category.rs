//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Restaurant errors (3xxx)
    Restaurant,
    /// Category errors (4xxx)
    Category,
    /// Dish errors (5xxx)
    Dish,
    /// Staging / commit errors (6xxx)
    Staging,
    /// System errors (9xxx and anything unassigned)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Restaurant,
            4000..5000 => Self::Category,
            5000..6000 => Self::Dish,
            6000..7000 => Self::Staging,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Restaurant => "restaurant",
            Self::Category => "category",
            Self::Dish => "dish",
            Self::Staging => "staging",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3003), ErrorCategory::Restaurant);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Category);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Dish);
        assert_eq!(ErrorCategory::from_code(6003), ErrorCategory::Staging);
        assert_eq!(ErrorCategory::from_code(7001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::SlugTaken.category(), ErrorCategory::Restaurant);
        assert_eq!(ErrorCode::CategoryStagedForDelete.category(), ErrorCategory::Category);
        assert_eq!(ErrorCode::DishInvalidPrice.category(), ErrorCategory::Dish);
        assert_eq!(ErrorCode::InvalidTempId.category(), ErrorCategory::Staging);
        assert_eq!(ErrorCode::NetworkError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Staging).unwrap();
        assert_eq!(json, "\"staging\"");
        let category: ErrorCategory = serde_json::from_str("\"dish\"").unwrap();
        assert_eq!(category, ErrorCategory::Dish);
    }
}
