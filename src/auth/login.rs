//! Login: admin allow-list first, then the user store.

use super::{
    AdminCredential, AdminProfile, AuthState, FlowError, password::needs_rehash,
    validate::normalize_email,
};
use serde::Serialize;
use tracing::{Span, debug, error, info, instrument, warn};
use utoipa::ToSchema;

const MISSING_FIELDS: &str = "Email y contraseña son requeridos";
const EMPTY_FIELDS: &str = "Email y contraseña no pueden estar vacíos";

#[derive(Clone, Default)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Regular user identity returned on a successful login.
#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    #[serde(rename = "edad")]
    pub age: i64,
}

#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthResult {
    Admin(AdminProfile),
    User(UserProfile),
}

impl AuthResult {
    #[must_use]
    pub const fn user_type(&self) -> &'static str {
        match self {
            Self::Admin(_) => "admin",
            Self::User(_) => "user",
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Admin(admin) => &admin.name,
            Self::User(user) => &user.name,
        }
    }
}

/// Authenticate an email (or admin alias) and password.
///
/// # Errors
/// Returns [`FlowError::Validation`] for missing or blank fields,
/// [`FlowError::NotFound`] when no account uses the email,
/// [`FlowError::InvalidCredential`] when the password does not verify, and
/// connection/unexpected errors from the store.
#[instrument(skip(state, input), fields(email))]
pub async fn authenticate(state: &AuthState, input: LoginInput) -> Result<AuthResult, FlowError> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        warn!("Login rejected: {}", MISSING_FIELDS);
        return Err(FlowError::validation(MISSING_FIELDS));
    };

    let email = email.trim().to_string();
    let password = password.trim().to_string();

    Span::current().record("email", email.as_str());

    if email.is_empty() || password.is_empty() {
        warn!("Login rejected: {}", EMPTY_FIELDS);
        return Err(FlowError::validation(EMPTY_FIELDS));
    }

    debug!("Login attempt");

    // Hashed admin secrets cost as much as a user password check.
    let admins = state.admins.clone();
    let hasher = state.hasher.clone();
    let (login, secret) = (email.clone(), password.clone());
    let admin = tokio::task::spawn_blocking(move || {
        admins
            .find(&login, &secret, &hasher)
            .map(AdminCredential::profile)
    })
    .await
    .map_err(|e| {
        error!("Admin lookup task failed: {}", e);
        FlowError::Unexpected(e.to_string())
    })?;

    if let Some(admin) = admin {
        info!(admin = %admin.name, "Admin login successful");
        return Ok(AuthResult::Admin(admin));
    }

    // Emails are stored lowercase.
    let lookup = normalize_email(&email);

    let user = state.store.find_by_email(&lookup).await.map_err(|e| {
        let err = FlowError::from(e);
        error!(kind = err.kind(), "Error looking up user: {:?}", err);
        err
    })?;

    let Some(user) = user else {
        warn!("Login rejected: no account for this email");
        return Err(FlowError::NotFound);
    };

    let hasher = state.hasher.clone();
    let stored = user.password_hash.clone();
    let attempt = password.clone();
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&stored, &attempt))
        .await
        .map_err(|e| {
            error!("Password verification task failed: {}", e);
            FlowError::Unexpected(e.to_string())
        })?
        .map_err(|e| {
            error!(user_id = user.id, "Error verifying password: {}", e);
            FlowError::Unexpected(e.to_string())
        })?;

    if !verified {
        warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(FlowError::InvalidCredential);
    }

    info!(user_id = user.id, "User login successful");

    if needs_rehash(&user.password_hash) {
        upgrade_hash(state, user.id, password).await;
    }

    Ok(AuthResult::User(UserProfile {
        user_id: user.id,
        name: user.name,
        email: user.email,
        age: user.age,
    }))
}

/// Replace a verified legacy hash with Argon2id. Failures leave the old hash
/// in place; the login itself already succeeded.
async fn upgrade_hash(state: &AuthState, user_id: u64, password: String) {
    let hasher = state.hasher.clone();
    let hash = match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            warn!(user_id, "Could not rehash legacy password: {}", e);
            return;
        }
        Err(e) => {
            warn!(user_id, "Rehash task failed: {}", e);
            return;
        }
    };

    match state.store.update_password_hash(user_id, &hash).await {
        Ok(()) => info!(user_id, "Upgraded legacy password hash"),
        Err(e) => warn!(user_id, "Could not store upgraded password hash: {}", e),
    }
}
