use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// The waitlist tables have few constraints (the window invariant is kept by
/// the merge engine, not by the database), so the mapping is mostly about
/// surfacing the checkpoint uniqueness and the check constraints on time
/// bounds with a usable message.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.message(), info.constraint_name(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        message: &str,
        constraint_name: Option<&str>,
        operation: &str,
    ) -> AppError {
        let constraint = constraint_name.unwrap_or("unknown");

        match kind {
            DatabaseErrorKind::UniqueViolation => AppError::Conflict {
                message: format!("unique constraint '{}' violated during {}", constraint, operation),
            },
            DatabaseErrorKind::CheckViolation => AppError::Validation {
                field: Self::column_from_constraint(constraint),
                reason: format!("Check constraint '{}' failed", constraint),
            },
            DatabaseErrorKind::NotNullViolation => AppError::Validation {
                field: Self::quoted_column(message).unwrap_or_else(|| "unknown".to_string()),
                reason: "Field is required".to_string(),
            },
            DatabaseErrorKind::SerializationFailure => AppError::Conflict {
                message: format!("serialization failure during {}", operation),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }

    /// `waitlist_windows_party_size_check` -> `party_size`
    fn column_from_constraint(constraint: &str) -> String {
        let trimmed = constraint.strip_suffix("_check").unwrap_or(constraint);
        for table in ["waitlist_windows_", "dispatch_checkpoints_", "dispatch_logs_"] {
            if let Some(column) = trimmed.strip_prefix(table) {
                return column.to_string();
            }
        }
        trimmed.to_string()
    }

    /// Extracts the first double-quoted identifier from a postgres message.
    fn quoted_column(message: &str) -> Option<String> {
        let start = message.find('"')? + 1;
        let end = message[start..].find('"')? + start;
        Some(message[start..end].to_string())
    }
}
