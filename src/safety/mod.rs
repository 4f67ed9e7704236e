//! Query safety classification.
//!
//! Parses SQL and classifies statements as safe, mutating or destructive so
//! the agent can hold data-modifying statements for confirmation.

mod classifier;

pub use classifier::{check_sql, classify_sql, SqlCheck};

use std::fmt;

/// Safety level classification for SQL statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafetyLevel {
    /// Read-only (SELECT, EXPLAIN, SHOW).
    Safe,
    /// Modifies data (INSERT, UPDATE, MERGE).
    Mutating,
    /// Removes data or changes schema (DELETE, DROP, TRUNCATE, ALTER, ...).
    Destructive,
}

impl SafetyLevel {
    /// Returns true if this safety level requires user confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Mutating | Self::Destructive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Mutating => "Mutating",
            Self::Destructive => "Destructive",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Truncate,
    Alter,
    Create,
    Grant,
    Revoke,
    Explain,
    Show,
    Merge,
    /// Several statements; holds the most dangerous one.
    Multiple(Box<StatementType>),
    Unknown,
}

impl StatementType {
    /// SQL keyword for single statements.
    fn keyword(&self) -> Option<&'static str> {
        Some(match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Drop => "DROP",
            Self::Truncate => "TRUNCATE",
            Self::Alter => "ALTER",
            Self::Create => "CREATE",
            Self::Grant => "GRANT",
            Self::Revoke => "REVOKE",
            Self::Explain => "EXPLAIN",
            Self::Show => "SHOW",
            Self::Merge => "MERGE",
            Self::Multiple(_) | Self::Unknown => return None,
        })
    }
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.keyword(), self) {
            (Some(keyword), _) => f.write_str(keyword),
            (None, Self::Multiple(inner)) => write!(f, "Multiple ({inner})"),
            (None, _) => f.write_str("Unknown"),
        }
    }
}

/// Result of classifying a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub level: SafetyLevel,
    pub statement_type: StatementType,
    /// Warning shown alongside the confirmation request.
    pub warning: Option<String>,
}

impl Classification {
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        let warning = (level == SafetyLevel::Destructive)
            .then(|| "This action cannot be undone.".to_string());
        Self {
            level,
            statement_type,
            warning,
        }
    }

    pub fn with_warning(
        level: SafetyLevel,
        statement_type: StatementType,
        warning: impl Into<String>,
    ) -> Self {
        Self {
            level,
            statement_type,
            warning: Some(warning.into()),
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        self.level.requires_confirmation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_level_ordering() {
        assert!(SafetyLevel::Safe < SafetyLevel::Mutating);
        assert!(SafetyLevel::Mutating < SafetyLevel::Destructive);
    }

    #[test]
    fn test_safety_level_requires_confirmation() {
        assert!(!SafetyLevel::Safe.requires_confirmation());
        assert!(SafetyLevel::Mutating.requires_confirmation());
        assert!(SafetyLevel::Destructive.requires_confirmation());
    }

    #[test]
    fn test_statement_type_display() {
        assert_eq!(StatementType::Delete.to_string(), "DELETE");
        assert_eq!(
            StatementType::Multiple(Box::new(StatementType::Drop)).to_string(),
            "Multiple (DROP)"
        );
    }

    #[test]
    fn test_destructive_classification_carries_warning() {
        let result = Classification::new(SafetyLevel::Destructive, StatementType::Delete);
        assert_eq!(result.warning.as_deref(), Some("This action cannot be undone."));
        assert!(Classification::new(SafetyLevel::Mutating, StatementType::Insert)
            .warning
            .is_none());
    }
}
