use crate::auth::{AdminList, CredentialHasher, HashCost};
use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_ADMINS_FILE: &str = "admins-file";
pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

#[derive(Debug, Clone)]
pub struct Options {
    pub admins_file: Option<PathBuf>,
    pub hash_cost: HashCost,
}

impl Options {
    /// Parse admin list and password hashing arguments from matches.
    /// Unset hashing costs fall back to [`HashCost::default`].
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let defaults = HashCost::default();
        let read_u32 = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);

        Self {
            admins_file: matches.get_one::<PathBuf>(ARG_ADMINS_FILE).cloned(),
            hash_cost: HashCost {
                memory_kib: read_u32(ARG_HASH_MEMORY_KIB, defaults.memory_kib),
                iterations: read_u32(ARG_HASH_ITERATIONS, defaults.iterations),
                parallelism: read_u32(ARG_HASH_PARALLELISM, defaults.parallelism),
            },
        }
    }

    /// Load the admin list from `--admins-file`, or fall back to the built-in one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn admin_list(&self) -> anyhow::Result<AdminList> {
        match &self.admins_file {
            Some(path) => AdminList::from_file(path)
                .with_context(|| format!("Failed to load admins from {}", path.display())),
            None => Ok(AdminList::default()),
        }
    }

    /// # Errors
    /// Returns an error if the Argon2 cost is out of range.
    pub fn hasher(&self) -> anyhow::Result<CredentialHasher> {
        CredentialHasher::new(self.hash_cost).context("Invalid password hashing cost")
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMINS_FILE)
                .long(ARG_ADMINS_FILE)
                .help("JSON file with the admin allow-list (email, username, password, name, role)")
                .env("LATIDOVERDE_ADMINS_FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2 memory cost in KiB (default: 19456)")
                .env("LATIDOVERDE_HASH_MEMORY_KIB")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2 iterations (default: 2)")
                .env("LATIDOVERDE_HASH_ITERATIONS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2 lanes (default: 1)")
                .env("LATIDOVERDE_HASH_PARALLELISM")
                .value_parser(clap::value_parser!(u32)),
        )
}
