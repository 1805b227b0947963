use crate::{
    api,
    auth::AuthState,
    cli::commands::{auth, database},
    db::{ConnectionProvider, MySqlCredentialStore},
};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub database: database::Options,
    pub auth: auth::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid, the admin list cannot
/// be loaded, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let db_config = args.database.database_config()?;
    let admins = args.auth.admin_list()?;
    let hasher = args.auth.hasher()?;

    info!(
        port = args.port,
        database = ?db_config,
        admins = admins.len(),
        admins_file = ?args.auth.admins_file,
        hash_cost = ?args.auth.hash_cost,
        "Startup configuration"
    );

    let provider = Arc::new(ConnectionProvider::new(db_config));
    let store = Arc::new(MySqlCredentialStore::new(provider.clone()));
    let state = Arc::new(AuthState::new(store, admins, hasher));

    api::new(args.port, state, provider).await
}
