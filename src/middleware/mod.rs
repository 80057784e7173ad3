use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, Result},
    models::Principal,
    utils::jwt::TokenType,
    AppState,
};

/// Read-only access for anonymous callers, writes require a principal.
///
/// Credentials that are offered must be valid on every method, so a bad
/// bearer token fails even a plain `GET`.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let principal = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => resolve_principal(&state, header).await?,
        None => None,
    };

    match principal {
        Some(principal) => {
            req.extensions_mut().insert(principal);
        }
        None if !is_safe_method(req.method()) => {
            return Err(AppError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            ));
        }
        None => {}
    }

    Ok(next.run(req).await)
}

fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

/// `None` when the header uses a scheme other than `Bearer`.
async fn resolve_principal(state: &AppState, header: &HeaderValue) -> Result<Option<Principal>> {
    let is_bearer = header
        .as_bytes()
        .split(|b| b.is_ascii_whitespace())
        .find(|part| !part.is_empty())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(b"bearer"));
    if !is_bearer {
        return Ok(None);
    }

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid token header".to_string()))?;

    let mut parts = value.split_whitespace().skip(1);
    let token = match (parts.next(), parts.next()) {
        (Some(token), None) => token,
        _ => {
            return Err(AppError::Unauthorized(
                "Authorization header must contain two space-delimited values".to_string(),
            ));
        }
    };

    let claims = state.tokens.verify(token, TokenType::Access)?;

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Some(user.into()))
}
