use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::{
    AppState,
    error::{AppError, FieldErrors, Result},
    models::{AccessTokenResponse, TokenObtainRequest, TokenPairResponse, TokenRefreshRequest},
    services::accounts,
    utils::jwt::TokenType,
};

pub async fn obtain_token_pair(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TokenObtainRequest>, JsonRejection>,
) -> Result<Json<TokenPairResponse>> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    let username = required_field(&mut errors, "username", payload.username);
    let password = required_field(&mut errors, "password", payload.password);
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Validation(errors));
    };

    let user = accounts::authenticate(state.users.as_ref(), &username, &password)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Failed token request for {}", username);
            AppError::Unauthorized("No active account found with the given credentials".to_string())
        })?;

    let pair = state.tokens.issue_pair(user.id)?;

    Ok(Json(pair))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    payload: std::result::Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>> {
    let Json(payload) = payload?;

    let mut errors = FieldErrors::new();
    let Some(refresh) = required_field(&mut errors, "refresh", payload.refresh) else {
        return Err(AppError::Validation(errors));
    };

    let claims = state.tokens.verify(&refresh, TokenType::Refresh)?;
    if state.users.find_by_id(claims.user_id).await?.is_none() {
        return Err(AppError::Unauthorized("User not found".to_string()));
    }

    let access = state.tokens.issue(claims.user_id, TokenType::Access)?;

    Ok(Json(AccessTokenResponse { access }))
}

fn required_field(errors: &mut FieldErrors, name: &str, value: Option<String>) -> Option<String> {
    let message = match value {
        Some(value) if !value.is_empty() => return Some(value),
        Some(_) => "This field may not be blank.",
        None => "This field is required.",
    };
    errors.insert(name.to_string(), vec![message.to_string()]);
    None
}
