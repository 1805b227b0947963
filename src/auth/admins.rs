//! Static admin allow-list, checked before the user store.
//!
//! Admins are not rows in `usuario`. They log in with either their email or a
//! short username alias. A secret stored as an Argon2 PHC string or a bcrypt
//! hash is verified like a user password; any other secret is compared as-is.

use super::password::{CredentialHasher, is_password_hash};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AdminListError {
    #[error("failed to read admin list {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid admin list JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("admin entry {index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

#[derive(Clone, Debug, Deserialize)]
pub struct AdminCredential {
    pub email: String,
    pub username: String,
    #[serde(rename = "password")]
    pub secret: SecretString,
    pub name: String,
    pub role: String,
}

impl AdminCredential {
    fn new(email: &str, username: &str, secret: &str, name: &str, role: &str) -> Self {
        Self {
            email: email.to_string(),
            username: username.to_string(),
            secret: SecretString::from(secret.to_string()),
            name: name.to_string(),
            role: role.to_string(),
        }
    }

    fn identifies(&self, login: &str) -> bool {
        login == self.email || login == self.username
    }

    fn secret_matches(&self, password: &str, hasher: &CredentialHasher) -> bool {
        let secret = self.secret.expose_secret();

        if is_password_hash(secret) {
            return hasher.verify(secret, password).unwrap_or_else(|e| {
                warn!(admin = %self.name, "Admin secret could not be verified: {}", e);
                false
            });
        }

        secret == password
    }

    #[must_use]
    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            name: self.name.clone(),
            role: self.role.clone(),
            email: self.email.clone(),
            initials: initials(&self.name),
        }
    }
}

/// Admin identity returned on a successful login.
#[derive(ToSchema, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdminProfile {
    pub name: String,
    pub role: String,
    pub email: String,
    pub initials: String,
}

/// First character of each whitespace-separated word, in order.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

#[derive(Clone, Debug)]
pub struct AdminList {
    admins: Vec<AdminCredential>,
}

impl Default for AdminList {
    /// The allow-list the site shipped with.
    fn default() -> Self {
        Self::new(vec![
            AdminCredential::new(
                "brainermontoya383@gmail.com",
                "admin",
                "1128282968bb",
                "Brainer Montoya",
                "Administrador Principal",
            ),
            AdminCredential::new(
                "henaosebas315@gmail.com",
                "owner",
                "Nain456",
                "SebasNao",
                "Administrador Iniciativo",
            ),
            AdminCredential::new(
                "tamara@gotmail.com",
                "admin3",
                "1234",
                "Admin Terciario",
                "Moderador",
            ),
        ])
    }
}

impl AdminList {
    #[must_use]
    pub fn new(admins: Vec<AdminCredential>) -> Self {
        Self { admins }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a JSON array of `{email, username, password, name, role}`.
    ///
    /// # Errors
    /// Returns an error if the JSON is invalid or an entry has an empty field.
    pub fn from_json(json: &str) -> Result<Self, AdminListError> {
        let admins: Vec<AdminCredential> = serde_json::from_str(json)?;

        for (index, admin) in admins.iter().enumerate() {
            let field = if admin.email.trim().is_empty() {
                Some("email")
            } else if admin.username.trim().is_empty() {
                Some("username")
            } else if admin.secret.expose_secret().is_empty() {
                Some("password")
            } else if admin.name.trim().is_empty() {
                Some("name")
            } else {
                None
            };

            if let Some(field) = field {
                return Err(AdminListError::EmptyField { index, field });
            }
        }

        Ok(Self::new(admins))
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, AdminListError> {
        let json = fs::read_to_string(path).map_err(|source| AdminListError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json(&json)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }

    /// Linear scan for an admin whose email or alias is `login` and whose
    /// secret matches `password`.
    #[must_use]
    pub fn find(
        &self,
        login: &str,
        password: &str,
        hasher: &CredentialHasher,
    ) -> Option<&AdminCredential> {
        self.admins
            .iter()
            .find(|admin| admin.identifies(login) && admin.secret_matches(password, hasher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;

    #[test]
    fn initials_take_first_letter_of_each_word() {
        assert_eq!(initials("Brainer Montoya"), "BM");
        assert_eq!(initials("SebasNao"), "S");
        assert_eq!(initials("Admin  Terciario "), "AT");
        assert_eq!(initials("Ángela Pérez"), "ÁP");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn default_list_matches_alias_and_email() {
        let admins = AdminList::default();
        let hasher = test_hasher();

        let by_alias = admins.find("owner", "Nain456", &hasher).map(AdminCredential::profile);
        assert_eq!(
            by_alias,
            Some(AdminProfile {
                name: "SebasNao".to_string(),
                role: "Administrador Iniciativo".to_string(),
                email: "henaosebas315@gmail.com".to_string(),
                initials: "S".to_string(),
            })
        );

        let by_email = admins.find("brainermontoya383@gmail.com", "1128282968bb", &hasher);
        assert_eq!(by_email.map(|a| a.profile().initials), Some("BM".to_string()));
    }

    #[test]
    fn wrong_secret_or_cross_admin_secret_does_not_match() {
        let admins = AdminList::default();
        let hasher = test_hasher();

        assert!(admins.find("owner", "nain456", &hasher).is_none());
        // Another admin's secret must not unlock this alias.
        assert!(admins.find("owner", "1234", &hasher).is_none());
        assert!(admins.find("nobody", "Nain456", &hasher).is_none());
    }

    #[test]
    fn hashed_secret_is_verified() -> anyhow::Result<()> {
        let hasher = test_hasher();
        let hash = hasher.hash("s3cure-admin")?;
        let json = format!(
            r#"[{{"email":"ops@latidoverde.org","username":"ops","password":"{hash}","name":"Equipo Ops","role":"Operaciones"}}]"#
        );
        let admins = AdminList::from_json(&json)?;

        assert_eq!(admins.len(), 1);
        assert!(admins.find("ops", "s3cure-admin", &hasher).is_some());
        assert!(admins.find("ops", hash.as_str(), &hasher).is_none());
        Ok(())
    }

    #[test]
    fn from_json_rejects_empty_fields() {
        let json = r#"[{"email":"a@x.com","username":"","password":"x","name":"A","role":"R"}]"#;
        let result = AdminList::from_json(json);
        assert!(matches!(
            result,
            Err(AdminListError::EmptyField {
                index: 0,
                field: "username"
            })
        ));
    }

    #[test]
    fn from_file_reports_missing_file() {
        let result = AdminList::from_file(Path::new("/nonexistent/latidoverde-admins.json"));
        assert!(matches!(result, Err(AdminListError::Read { .. })));
    }
}
