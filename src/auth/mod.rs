//! Login and registration flows.

pub mod admins;
pub mod error;
pub mod login;
pub mod password;
pub mod register;
pub mod validate;

pub use self::admins::{AdminCredential, AdminList, AdminProfile};
pub use self::error::FlowError;
pub use self::login::{AuthResult, LoginInput, UserProfile, authenticate};
pub use self::password::{CredentialHasher, HashCost};
pub use self::register::{RegisterInput, RegisteredUser, register};

use crate::db::CredentialStore;
use std::sync::Arc;

/// Everything a flow needs, shared across requests.
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn CredentialStore>,
    pub admins: Arc<AdminList>,
    pub hasher: CredentialHasher,
}

impl AuthState {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        admins: AdminList,
        hasher: CredentialHasher,
    ) -> Self {
        Self {
            store,
            admins: Arc::new(admins),
            hasher,
        }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("admins", &self.admins.len())
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}
