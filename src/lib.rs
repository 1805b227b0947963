//! # Latido Verde (flood reporting community backend)
//!
//! `latidoverde` serves the account side of the community flood-reporting
//! site: user registration and login over JSON.
//!
//! ## Login
//!
//! A static admin allow-list is checked first and never touches the database.
//! Everyone else is looked up in the `usuario` table and verified against an
//! Argon2id password hash.
//!
//! ## Registration
//!
//! Emails are normalized to lowercase before they are checked for uniqueness
//! and stored. Ages must fall in `13..=120`.
//!
//! ## Database
//!
//! A single lazily-created `MySQL` pool is shared by the whole process through
//! [`db::ConnectionProvider`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod db;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
