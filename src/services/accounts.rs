use crate::{
    error::{AppError, Result},
    models::User,
    store::UserStore,
};

/// Returns the user only when both the username exists and the password
/// matches its stored hash.
pub async fn authenticate(
    users: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let Some(user) = users.find_by_username(username).await? else {
        return Ok(None);
    };

    let is_valid = bcrypt::verify(password, &user.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    Ok(is_valid.then_some(user))
}

/// Creates `username` unless it already exists. Existing passwords are left untouched.
pub async fn ensure_user(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    cost: u32,
) -> Result<User> {
    if let Some(user) = users.find_by_username(username).await? {
        return Ok(user);
    }

    if username.trim().is_empty() || password.is_empty() {
        return Err(AppError::ConfigError(
            "Bootstrap username and password cannot be empty".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(password, cost)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = users.create_user(username, &password_hash).await?;
    tracing::info!("Created user {}", user.username);

    Ok(user)
}
