//! Conversions from external infrastructure errors into domain errors.

use alyante_domain::AlyanteError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AlyanteError);

impl From<InfraError> for AlyanteError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AlyanteError> for InfraError {
    fn from(value: AlyanteError) -> Self {
        InfraError(value)
    }
}

trait IntoAlyanteError {
    fn into_alyante(self) -> AlyanteError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AlyanteError */
/* -------------------------------------------------------------------------- */

impl IntoAlyanteError for SqlError {
    fn into_alyante(self) -> AlyanteError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        AlyanteError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        AlyanteError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        AlyanteError::Database("unique constraint violation".into())
                    }
                    _ => AlyanteError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AlyanteError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AlyanteError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                AlyanteError::Database(format!("invalid column type: {ty}"))
            }
            other => AlyanteError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_alyante())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AlyanteError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(AlyanteError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → AlyanteError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(AlyanteError::Database(format!("invalid stored JSON: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AlyanteError */
/* -------------------------------------------------------------------------- */

impl IntoAlyanteError for HttpError {
    fn into_alyante(self) -> AlyanteError {
        if self.is_timeout() {
            return AlyanteError::Transport("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AlyanteError::Transport("HTTP connection failure".into());
        }

        if self.is_builder() {
            return AlyanteError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            return AlyanteError::Transport(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        AlyanteError::Transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_alyante())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
