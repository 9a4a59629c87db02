use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::{Error, Result as RResult};
use crate::models::account::Actor;
use crate::state::AppState;

/// The merged current actor, resolved once per request by the session
/// bridge and read by handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

/// The raw bearer token of the request, kept around for sign-out.
#[derive(Debug, Clone)]
pub struct SessionToken(pub String);

pub async fn require_actor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, Response> {
    let (mut parts, body) = request.into_parts();

    let token = bearer_token(&parts).map_err(IntoResponse::into_response)?;
    let actor = state
        .sessions
        .resolve(&token)
        .await
        .ok_or_else(|| Error::InvalidToken.into_response())?;

    parts.extensions.insert(CurrentActor(actor));
    parts.extensions.insert(SessionToken(token));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn bearer_token(parts: &axum::http::request::Parts) -> RResult<String> {
    let header_value = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?
        .to_str()
        .map_err(|_| Error::InvalidToken)?;

    let mut pieces = header_value.trim().splitn(2, ' ');
    let scheme = pieces.next().ok_or(Error::MissingToken)?;
    let token = pieces.next().ok_or(Error::MissingToken)?;

    if scheme != "Bearer" {
        tracing::warn!("Invalid auth scheme: {scheme}");
        return Err(Error::InvalidScheme);
    }

    Ok(token.to_string())
}
