use farmwatch_core::error::ModelError;
use std::error;
use thiserror::Error;
use warp::http::StatusCode;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid stored value: {0}")]
    Model(#[from] ModelError),
    #[error("{0}")]
    Duplicate(std::string::String),
    #[error("{0}")]
    MissingParent(std::string::String),
}

/// Errors caused by the caller, rendered with their message
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid principal")]
    Unauthorized,
    #[error("Not allowed to access {0} {1}")]
    Forbidden(&'static str, i32),
    #[error("Did not found {0}: {1}")]
    NotFound(&'static str, i32),
    #[error("{0}")]
    Validation(std::string::String),
    #[error("Method {0} not allowed on {1}")]
    MethodNotAllowed(std::string::String, &'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(..) => StatusCode::FORBIDDEN,
            ApiError::NotFound(..) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(..) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    User(#[from] ApiError),
    #[error(transparent)]
    Internal(Box<dyn error::Error + Send + Sync>),
}

impl From<DBError> for ServiceError {
    fn from(err: DBError) -> Self {
        match err {
            DBError::Duplicate(msg) | DBError::MissingParent(msg) => {
                ServiceError::User(ApiError::Validation(msg))
            }
            other => ServiceError::Internal(Box::from(other)),
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        ServiceError::User(ApiError::Validation(err.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, std::string::String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_api_error_status() {
        assert_eq!(StatusCode::UNAUTHORIZED, ApiError::Unauthorized.status());
        assert_eq!(StatusCode::FORBIDDEN, ApiError::Forbidden("farm", 1).status());
        assert_eq!(StatusCode::NOT_FOUND, ApiError::NotFound("farm", 1).status());
        assert_eq!(
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MethodNotAllowed("POST".to_owned(), "anomalies").status()
        );
    }

    #[test]
    fn test_duplicate_is_user_error() {
        let err: ServiceError = DBError::Duplicate("User 1 already owns a farm.".to_owned()).into();
        match err {
            ServiceError::User(ApiError::Validation(msg)) => {
                assert_eq!("User 1 already owns a farm.", msg)
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_sql_error_is_internal() {
        let err: ServiceError = DBError::SQLError(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
