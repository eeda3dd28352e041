pub mod change_feed;
pub mod memory;
pub mod message_repo;
pub mod models;
pub mod offering_repo;
pub mod order_repo;
pub mod profile_repo;
pub mod review_repo;
pub mod stats_repo;

use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::domain::errors::DomainError;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<DieselError> for DomainError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::NotFound => DomainError::NotFound("Record"),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                DomainError::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                DomainError::InvalidInput("referenced record does not exist".into())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new("constraint failed".to_string()))
    }

    #[test]
    fn missing_reference_is_invalid_input() {
        assert!(matches!(
            DomainError::from(database_error(DatabaseErrorKind::ForeignKeyViolation)),
            DomainError::InvalidInput(_)
        ));
    }

    #[test]
    fn duplicate_key_is_a_conflict() {
        assert!(matches!(
            DomainError::from(database_error(DatabaseErrorKind::UniqueViolation)),
            DomainError::Conflict(_)
        ));
    }

    #[test]
    fn missing_row_is_not_found() {
        assert!(matches!(
            DomainError::from(DieselError::NotFound),
            DomainError::NotFound(_)
        ));
    }
}
