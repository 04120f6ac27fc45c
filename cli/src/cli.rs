//! CLI interface for the portal client

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portal_core::{HttpMethod, Role};

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "portal")]
#[command(version)]
#[command(about = "Command-line client for the feedback portal API", long_about = None)]
pub struct Cli {
    /// Path to a portal.toml configuration file
    #[arg(long, global = true, env = "PORTAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the portal API
    #[arg(long, global = true, env = "PORTAL_BASE_URL")]
    pub base_url: Option<String>,

    /// File holding the bearer token between invocations
    #[arg(long, global = true, env = "PORTAL_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            token_file: self.token_file.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the access token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create a new account
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Role to request: user, moderator or admin
        #[arg(long, default_value = "user")]
        role: Role,
    },

    /// Show the logged-in user
    Me,

    /// Change your own email and/or password
    UpdateMe {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show local session state, refreshing the user if a token is stored
    Status,

    /// List all users (admin)
    Users,

    /// Show one user (admin)
    User { id: i64 },

    /// Change a user's fields (admin)
    UpdateUser {
        id: i64,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        role: Option<Role>,
    },

    /// Delete a user (admin)
    DeleteUser {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Submit feedback
    FeedbackCreate {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long)]
        message: String,
    },

    /// List feedback
    Feedbacks,

    /// List every feedback entry (moderator)
    AllFeedbacks,

    /// Delete a feedback entry (moderator)
    FeedbackDelete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Check API liveness
    Health,

    /// Send an arbitrary request and show the raw envelope
    Request {
        method: HttpMethod,

        /// Path starting with '/'
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },
}
