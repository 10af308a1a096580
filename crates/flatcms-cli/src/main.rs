//! `FlatCMS` CLI: operator helpers for the credentials file.
//!
//! Talks to no server. Every command works directly on the TOML credentials
//! file the server reads at sign-in time.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use flatcms_core::credentials::{self, CredentialStore};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";

struct Palette {
    reset: &'static str,
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
}

impl Palette {
    const fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                reset: RESET,
                bold: BOLD,
                dim: DIM,
                red: RED,
                green: GREEN,
            }
        } else {
            Self {
                reset: "",
                bold: "",
                dim: "",
                red: "",
                green: "",
            }
        }
    }
}

// ── CLI structure ────────────────────────────────────────────────────

/// FlatCMS, a tiny flat-file CMS.
#[derive(Parser)]
#[command(
    name = "flatcms",
    version,
    about = "FlatCMS CLI: manage the bcrypt credentials file",
    long_about = None,
    after_help = "Environment variables:\n  \
         FLATCMS_CREDENTIALS   Credentials file (default: users.toml)\n\n\
         Examples:\n  \
         flatcms hash-password 's3cret'\n  \
         flatcms check-credentials --credentials test/users.toml\n  \
         flatcms verify admin 's3cret'"
)]
struct Cli {
    /// Disable colored output.
    #[arg(long, default_value = "false")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a bcrypt hash for a password, ready for the credentials file.
    HashPassword {
        /// Plaintext password.
        password: String,
        /// bcrypt cost factor (4-31).
        #[arg(long, default_value_t = credentials::DEFAULT_COST)]
        cost: u32,
    },
    /// Load the credentials file and list its usernames.
    CheckCredentials {
        /// Credentials file.
        #[arg(long, env = "FLATCMS_CREDENTIALS", default_value = "users.toml")]
        credentials: PathBuf,
    },
    /// Check a username and password against the credentials file.
    Verify {
        /// Username to check.
        username: String,
        /// Plaintext password.
        password: String,
        /// Credentials file.
        #[arg(long, env = "FLATCMS_CREDENTIALS", default_value = "users.toml")]
        credentials: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let colors = Palette::new(!cli.no_color);

    match run(cli.command, &colors).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}{}✗ Error:{} {e:#}", colors.red, colors.bold, colors.reset);
            ExitCode::FAILURE
        }
    }
}

async fn run(cmd: Commands, colors: &Palette) -> Result<()> {
    match cmd {
        Commands::HashPassword { password, cost } => cmd_hash_password(&password, cost),
        Commands::CheckCredentials { credentials } => {
            cmd_check_credentials(&credentials, colors).await
        }
        Commands::Verify {
            username,
            password,
            credentials,
        } => cmd_verify(&credentials, &username, &password, colors).await,
    }
}

// ── Commands ─────────────────────────────────────────────────────────

fn cmd_hash_password(password: &str, cost: u32) -> Result<()> {
    if password.is_empty() {
        bail!("password must not be empty");
    }
    let hash = credentials::hash_password(password, cost).context("hashing failed")?;
    // Plain stdout so the hash can be piped straight into the file.
    println!("{hash}");
    Ok(())
}

async fn cmd_check_credentials(path: &Path, colors: &Palette) -> Result<()> {
    let store = CredentialStore::new(path);
    let users = store.load().await?;

    let mut names: Vec<&String> = users.keys().collect();
    names.sort();

    eprintln!(
        "{}{}✓{} {} user(s) in {}{}{}",
        colors.green,
        colors.bold,
        colors.reset,
        names.len(),
        colors.dim,
        path.display(),
        colors.reset
    );
    for name in names {
        println!("{name}");
    }
    Ok(())
}

async fn cmd_verify(path: &Path, username: &str, password: &str, colors: &Palette) -> Result<()> {
    let store = CredentialStore::new(path);
    if store.verify(username, password).await? {
        println!(
            "{}{}✓{} credentials valid for {username}",
            colors.green, colors.bold, colors.reset
        );
        Ok(())
    } else {
        bail!("invalid credentials for {username}")
    }
}
