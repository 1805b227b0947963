use crate::db::{
    DEFAULT_CHARSET, DEFAULT_CONNECT_TIMEOUT_SECONDS, DEFAULT_MAX_CONNECTIONS, DatabaseConfig,
};
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

pub const ARG_DSN: &str = "dsn";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_CHARSET: &str = "db-charset";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";
pub const ARG_DB_CONNECT_TIMEOUT: &str = "db-connect-timeout";

#[derive(Debug, Clone)]
pub struct Options {
    pub dsn: String,
    pub password: Option<SecretString>,
    pub charset: String,
    pub max_connections: u32,
    pub connect_timeout: u64,
}

impl Options {
    /// Parse database arguments from matches.
    ///
    /// # Errors
    /// Returns an error if `--dsn` is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_DSN}"))?;

        Ok(Self {
            dsn,
            password: matches
                .get_one::<String>(ARG_DB_PASSWORD)
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::from(v.clone())),
            charset: matches
                .get_one::<String>(ARG_DB_CHARSET)
                .cloned()
                .unwrap_or_else(|| DEFAULT_CHARSET.to_string()),
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            connect_timeout: matches
                .get_one::<u64>(ARG_DB_CONNECT_TIMEOUT)
                .copied()
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        })
    }

    /// Build the connection settings.
    ///
    /// # Errors
    /// Returns an error if the DSN is not a valid `MySQL` URL.
    pub fn database_config(&self) -> anyhow::Result<DatabaseConfig> {
        let mut config = DatabaseConfig::new(&self.dsn)
            .context("invalid --dsn")?
            .with_charset(self.charset.as_str())
            .with_max_connections(self.max_connections)
            .with_connect_timeout(Duration::from_secs(self.connect_timeout));

        if let Some(password) = &self.password {
            config = config.with_password(password.clone());
        }

        Ok(config)
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string, example: mysql://root@localhost:3306/latidoverde")
                .long_help(
                    "Database connection string. The password may be left out of the DSN and passed with --db-password instead.",
                )
                .env("LATIDOVERDE_DSN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("Database password")
                .env("LATIDOVERDE_DB_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DB_CHARSET)
                .long(ARG_DB_CHARSET)
                .help("Connection character set")
                .env("LATIDOVERDE_DB_CHARSET")
                .default_value(DEFAULT_CHARSET),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long(ARG_DB_MAX_CONNECTIONS)
                .help("Maximum number of pooled connections")
                .env("LATIDOVERDE_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_DB_CONNECT_TIMEOUT)
                .long(ARG_DB_CONNECT_TIMEOUT)
                .help("Seconds to wait for a database connection")
                .env("LATIDOVERDE_DB_CONNECT_TIMEOUT")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
}
