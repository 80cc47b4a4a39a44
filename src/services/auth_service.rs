use chrono::Utc;

use crate::{
    client::ApiClient,
    dto::auth::{Credentials, LoginResponse},
    error::{AppError, AppResult},
    models::User,
    session::{SessionFlags, SessionStore},
};

/// Gate for everything except the login, register and theme actions.
pub fn require_login(flags: &SessionFlags) -> AppResult<()> {
    if !flags.is_logged_in {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Loads the saved session and hands its token to `client`.
pub async fn restore(client: &mut ApiClient, store: &SessionStore) -> AppResult<SessionFlags> {
    let flags = store.load().await?;
    client.set_token(flags.token.clone());
    Ok(flags)
}

pub async fn login(
    client: &mut ApiClient,
    store: &SessionStore,
    username: &str,
    password: &str,
) -> AppResult<LoginResponse> {
    let credentials = credentials(username, password)?;
    let response = client.login(&credentials).await?;

    let token = response.token.as_deref().map(normalize_token);
    client.set_token(token.clone());
    store
        .update(|flags| {
            flags.is_logged_in = true;
            flags.token = token;
            flags.logged_in_at = Some(Utc::now());
        })
        .await?;

    tracing::info!(username = %credentials.username, has_token = client.token().is_some(), "logged in");
    Ok(response)
}

pub async fn register(client: &ApiClient, username: &str, password: &str) -> AppResult<User> {
    let credentials = credentials(username, password)?;
    let user = client.register(&credentials).await?;
    tracing::info!(user_id = user.id, username = %user.username, "registered");
    Ok(user)
}

/// Forgets the session but keeps display preferences.
pub async fn logout(client: &mut ApiClient, store: &SessionStore) -> AppResult<SessionFlags> {
    client.set_token(None);
    let flags = store
        .update(|flags| {
            flags.is_logged_in = false;
            flags.token = None;
            flags.logged_in_at = None;
        })
        .await?;
    tracing::info!("logged out");
    Ok(flags)
}

fn credentials(username: &str, password: &str) -> AppResult<Credentials> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }
    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Servers may hand back the full header value; keep only the token.
fn normalize_token(raw: &str) -> String {
    raw.trim()
        .strip_prefix("Bearer ")
        .unwrap_or(raw.trim())
        .trim()
        .to_string()
}
