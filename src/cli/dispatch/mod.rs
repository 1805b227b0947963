use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, auth, database};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    Ok(Action::Server(Args {
        port,
        database: database::Options::parse(matches)?,
        auth: auth::Options::parse(matches),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("LATIDOVERDE_PORT", None::<&str>),
                ("LATIDOVERDE_ADMINS_FILE", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "latidoverde",
                    "--dsn",
                    "mysql://root@localhost:3306/latidoverde",
                    "--db-password",
                    "secret",
                ]);

                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 8080);
                assert_eq!(args.database.dsn, "mysql://root@localhost:3306/latidoverde");
                assert!(args.database.password.is_some());
                assert!(args.auth.admins_file.is_none());
                Ok(())
            },
        )
    }
}
