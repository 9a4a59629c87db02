use axum::{http::StatusCode, response::IntoResponse};

use thiserror::Error;
use tracing::error;

use crate::{analysis::AnalyzerError, identity::IdentityError, store::StoreError};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store Error: {0}")]
    Store(#[from] StoreError),

    #[error("Identity Error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Analyzer Error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validator Error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Json Rejection Error: {0}")]
    AxumJsonRejection(#[from] axum::extract::rejection::JsonRejection),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("You must be invited to register.")]
    NotInvited,

    #[error("An invitation for this email address already exists.")]
    InvitationExists,

    #[error("A user with this email address already exists.")]
    EmailExists,

    #[error("Not permitted")]
    AccessDenied,

    #[error("Not Found")]
    NotFound,

    // ! Auth
    #[error("Missing authorization token")]
    MissingToken,
    #[error("Invalid authorization token")]
    InvalidToken,
    #[error("Invalid authorization scheme")]
    InvalidScheme,
}

/// First failing field wins; the rest are only useful in logs.
fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, field_errors)| field_errors.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid data provided.".to_string())
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Error::Store(err) => {
                error!("Store Error: {:#?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error".to_string(),
                )
            }
            // Known provider codes map to stable user-facing strings;
            // everything else collapses to a generic message so raw
            // provider text never reaches a client.
            Error::Identity(err) => match err {
                IdentityError::InvalidCredential => (
                    StatusCode::BAD_REQUEST,
                    "Invalid credentials. Check your email address and password.".to_string(),
                ),
                IdentityError::EmailAlreadyInUse => (
                    StatusCode::BAD_REQUEST,
                    "This email address is already in use.".to_string(),
                ),
                IdentityError::WeakPassword => (
                    StatusCode::BAD_REQUEST,
                    "Password must be at least 6 characters long.".to_string(),
                ),
                IdentityError::InvalidEmail => (
                    StatusCode::BAD_REQUEST,
                    "Invalid email address.".to_string(),
                ),
                IdentityError::Provider(detail) => {
                    error!("Identity provider Error: {detail}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Error".to_string(),
                    )
                }
            },
            Error::Analyzer(err) => {
                error!("Analyzer Error: {:#?}", err);
                (StatusCode::BAD_GATEWAY, "Analysis failed.".to_string())
            }
            Error::Io(err) => {
                error!("Io Error: {:#?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error".to_string(),
                )
            }
            Error::Validation(err) => {
                error!("Validation Error: {:#?}", err);
                (StatusCode::BAD_REQUEST, first_validation_message(&err))
            }
            Error::AxumJsonRejection(err) => {
                error!("Axum Json Rejection Error: {:#?}", err);
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Error::Config(detail) => {
                error!("Config Error: {detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error".to_string(),
                )
            }
            Error::NotInvited => (
                StatusCode::BAD_REQUEST,
                "You must be invited to register.".to_string(),
            ),
            Error::InvitationExists => (
                StatusCode::BAD_REQUEST,
                "An invitation for this email address already exists.".to_string(),
            ),
            Error::EmailExists => (
                StatusCode::BAD_REQUEST,
                "A user with this email address already exists.".to_string(),
            ),
            Error::AccessDenied => (StatusCode::FORBIDDEN, "Not permitted".to_string()),
            Error::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token".to_string(),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization token".to_string(),
            ),
            Error::InvalidScheme => (
                StatusCode::UNAUTHORIZED,
                "Invalid authorization scheme".to_string(),
            ),
        };
        (status, message).into_response()
    }
}
