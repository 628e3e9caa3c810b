//! Command-line interface for gigboard.

mod commands;

use clap::{Parser, Subcommand};

/// Gigboard - gig listings for musicians and employers
#[derive(Parser)]
#[command(name = "gigboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an activated admin account
    CreateAdmin {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Print the version
    Version,
}

pub use commands::*;
