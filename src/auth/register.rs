//! Registration: validate, check uniqueness, hash, insert.

use super::{
    AuthState, FlowError,
    validate::{
        AGE_MAX, AGE_MIN, NAME_MIN_CHARS, PASSWORD_MIN_CHARS, normalize_email, parse_age,
        valid_email,
    },
};
use crate::db::NewUser;
use serde::Serialize;
use tracing::{Span, debug, error, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Clone, Default)]
pub struct RegisterInput {
    pub nombre: Option<String>,
    pub correo: Option<String>,
    pub contrasena: Option<String>,
    pub edad: Option<String>,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("nombre", &self.nombre)
            .field("correo", &self.correo)
            .field("contrasena", &self.contrasena.as_ref().map(|_| "***"))
            .field("edad", &self.edad)
            .finish()
    }
}

#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    pub user_id: u64,
    pub nombre: String,
    pub correo: String,
}

/// Value of a required field, trimmed; `Err` names the field when it is
/// absent or blank.
fn required(value: Option<String>, field: &str) -> Result<String, FlowError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FlowError::validation(format!(
            "El campo '{field}' es requerido"
        ))),
    }
}

fn required_fields(input: RegisterInput) -> Result<(String, String, String, String), FlowError> {
    Ok((
        required(input.nombre, "nombre")?,
        required(input.correo, "correo")?,
        required(input.contrasena, "contrasena")?,
        required(input.edad, "edad")?,
    ))
}

/// Register a new user and return its id with the normalized fields.
///
/// # Errors
/// Returns [`FlowError::Validation`] for missing or invalid fields,
/// [`FlowError::DuplicateEmail`] if the normalized email is taken, and
/// connection/unexpected errors from the store or the hasher.
#[instrument(skip(state, input), fields(correo))]
pub async fn register(state: &AuthState, input: RegisterInput) -> Result<RegisteredUser, FlowError> {
    let (nombre, correo, contrasena, edad) = required_fields(input).inspect_err(|e| {
        warn!("Registration rejected: {}", e);
    })?;

    let correo = normalize_email(&correo);
    let edad = parse_age(&edad);

    Span::current().record("correo", correo.as_str());

    let invalid = if nombre.chars().count() < NAME_MIN_CHARS {
        Some(format!(
            "El nombre debe tener al menos {NAME_MIN_CHARS} caracteres"
        ))
    } else if !valid_email(&correo) {
        Some("El correo electrónico no es válido".to_string())
    } else if contrasena.chars().count() < PASSWORD_MIN_CHARS {
        Some(format!(
            "La contraseña debe tener al menos {PASSWORD_MIN_CHARS} caracteres"
        ))
    } else if !(AGE_MIN..=AGE_MAX).contains(&edad) {
        Some(format!("La edad debe estar entre {AGE_MIN} y {AGE_MAX} años"))
    } else {
        None
    };

    if let Some(message) = invalid {
        warn!(nombre = %nombre, edad, "Registration rejected: {}", message);
        return Err(FlowError::Validation(message));
    }

    debug!(nombre = %nombre, "Registration input validated");

    let exists = state.store.email_exists(&correo).await.map_err(|e| {
        let err = FlowError::from(e);
        error!(kind = err.kind(), "Error checking if user exists: {:?}", err);
        err
    })?;

    if exists {
        warn!("Registration rejected: email already registered");
        return Err(FlowError::DuplicateEmail);
    }

    let hasher = state.hasher.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&contrasena))
        .await
        .map_err(|e| {
            error!("Password hashing task failed: {}", e);
            FlowError::Unexpected(e.to_string())
        })?
        .map_err(|e| {
            error!("Error hashing password: {}", e);
            FlowError::Unexpected(e.to_string())
        })?;

    let user_id = state
        .store
        .create(&NewUser {
            name: nombre.clone(),
            email: correo.clone(),
            password_hash,
            age: edad,
        })
        .await
        .map_err(|e| {
            let err = FlowError::from(e);
            error!(kind = err.kind(), "Error creating user: {:?}", err);
            err
        })?;

    info!(user_id, "User registered");

    Ok(RegisteredUser {
        user_id,
        nombre,
        correo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        AdminList, AuthResult, LoginInput, authenticate, login::tests::UnreachableStore,
        password::test_hasher,
    };
    use crate::db::{CredentialStore, memory::InMemoryCredentialStore};
    use std::sync::Arc;

    fn state() -> (AuthState, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        let state = AuthState::new(store.clone(), AdminList::default(), test_hasher());
        (state, store)
    }

    fn input(nombre: &str, correo: &str, contrasena: &str, edad: &str) -> RegisterInput {
        RegisterInput {
            nombre: Some(nombre.to_string()),
            correo: Some(correo.to_string()),
            contrasena: Some(contrasena.to_string()),
            edad: Some(edad.to_string()),
        }
    }

    fn validation_message(result: Result<RegisteredUser, FlowError>) -> Option<String> {
        match result {
            Err(FlowError::Validation(message)) => Some(message),
            _ => None,
        }
    }

    #[tokio::test]
    async fn registers_with_normalized_email() -> anyhow::Result<()> {
        let (state, store) = state();

        let user = register(&state, input("Ana Gomez", "ANA@X.com", "password1", "30")).await?;
        assert_eq!(
            user,
            RegisteredUser {
                user_id: 1,
                nombre: "Ana Gomez".to_string(),
                correo: "ana@x.com".to_string(),
            }
        );

        let stored = store.find_by_email("ana@x.com").await?;
        assert!(stored.is_some());
        if let Some(stored) = stored {
            assert_eq!(stored.age, 30);
            assert_ne!(stored.password_hash, "password1");
            assert!(state.hasher.verify(&stored.password_hash, "password1")?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_field_is_named() {
        let (state, _) = state();

        let mut missing_name = input("Ana Gomez", "ana@x.com", "password1", "30");
        missing_name.nombre = None;
        assert_eq!(
            validation_message(register(&state, missing_name).await),
            Some("El campo 'nombre' es requerido".to_string())
        );

        let blank_email = input("Ana Gomez", "   ", "password1", "30");
        assert_eq!(
            validation_message(register(&state, blank_email).await),
            Some("El campo 'correo' es requerido".to_string())
        );

        let mut missing_age = input("Ana Gomez", "ana@x.com", "password1", "30");
        missing_age.edad = None;
        assert_eq!(
            validation_message(register(&state, missing_age).await),
            Some("El campo 'edad' es requerido".to_string())
        );
    }

    #[tokio::test]
    async fn age_boundaries() {
        let (state, _) = state();

        for (index, age) in ["13", "120"].iter().enumerate() {
            let email = format!("edad{index}@x.com");
            assert!(
                register(&state, input("Ana Gomez", &email, "password1", age))
                    .await
                    .is_ok(),
                "age {age} should be accepted"
            );
        }

        for age in ["12", "121", "abc", "0"] {
            assert_eq!(
                validation_message(
                    register(&state, input("Ana Gomez", "x@x.com", "password1", age)).await
                ),
                Some("La edad debe estar entre 13 y 120 años".to_string()),
                "age {age} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn password_boundaries() {
        let (state, _) = state();

        assert!(
            register(&state, input("Ana Gomez", "p8@x.com", "12345678", "30"))
                .await
                .is_ok()
        );
        assert_eq!(
            validation_message(
                register(&state, input("Ana Gomez", "p7@x.com", "1234567", "30")).await
            ),
            Some("La contraseña debe tener al menos 8 caracteres".to_string())
        );
        // Surrounding whitespace does not count towards the length.
        assert!(
            validation_message(
                register(&state, input("Ana Gomez", "p7s@x.com", " 1234567 ", "30")).await
            )
            .is_some()
        );
    }

    #[tokio::test]
    async fn name_boundaries() {
        let (state, _) = state();

        assert!(
            register(&state, input("Al", "al@x.com", "password1", "30"))
                .await
                .is_ok()
        );
        assert_eq!(
            validation_message(register(&state, input("A", "a@x.com", "password1", "30")).await),
            Some("El nombre debe tener al menos 2 caracteres".to_string())
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (state, store) = state();

        assert_eq!(
            validation_message(
                register(&state, input("Ana Gomez", "ana@", "password1", "30")).await
            ),
            Some("El correo electrónico no es válido".to_string())
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_email_in_any_casing_is_rejected() -> anyhow::Result<()> {
        let (state, store) = state();

        register(&state, input("Ana Gomez", "ana@x.com", "password1", "30")).await?;
        let second = register(&state, input("Ana G", " Ana@X.COM ", "password2", "31")).await;

        assert!(matches!(second, Err(FlowError::DuplicateEmail)));
        assert_eq!(store.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn register_then_login() -> anyhow::Result<()> {
        let (state, _) = state();

        let registered =
            register(&state, input("Ana Gomez", "ANA@X.com", "password1", "30")).await?;
        let result = authenticate(
            &state,
            LoginInput {
                email: Some("ana@x.com".to_string()),
                password: Some("password1".to_string()),
            },
        )
        .await?;

        match result {
            AuthResult::User(user) => {
                assert_eq!(user.user_id, registered.user_id);
                assert_eq!(user.name, registered.nombre);
                assert_eq!(user.email, registered.correo);
                assert_eq!(user.age, 30);
            }
            AuthResult::Admin(_) => panic!("expected user"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_database_is_connection_error() {
        let state = AuthState::new(Arc::new(UnreachableStore), AdminList::default(), test_hasher());
        let result = register(&state, input("Ana Gomez", "ana@x.com", "password1", "30")).await;
        assert!(matches!(result, Err(FlowError::Connection(_))));
    }
}
