//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "ROSTER_DEBUG")]
    /// Enable debug logging. Env: ROSTER_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "3001", env = "PORT")]
    /// http listener, defaults to `3001`.
    /// Env: PORT
    pub port: NonZeroU16,
    #[clap(long, short, default_value = "0.0.0.0", env = "ROSTER_LISTEN_ADDRESS")]
    /// Listen address, defaults to `0.0.0.0`.
    /// Env: ROSTER_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, default_value = "roster.sqlite", env = "ROSTER_DATABASE_PATH")]
    /// Path to the database file, eg `/data/roster.sqlite`.
    /// Env: ROSTER_DATABASE_PATH
    pub database_path: String,
    #[clap(long, default_value = "./generated", env = "ROSTER_GENERATED_DIR")]
    /// Where generated posters are written.
    /// Env: ROSTER_GENERATED_DIR
    pub generated_dir: PathBuf,
    #[clap(long, default_value = "./assets/players", env = "ROSTER_PLAYERS_DIR")]
    /// Directory holding the roster photos.
    /// Env: ROSTER_PLAYERS_DIR
    pub players_dir: PathBuf,
    #[clap(long, default_value = "http://localhost:3001", env = "PUBLIC_BASE_URL")]
    /// Public URL this service is reachable at, used to build image links.
    /// Env: PUBLIC_BASE_URL
    pub public_base_url: String,

    #[clap(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    /// Gemini API key. Env: GOOGLE_API_KEY
    pub google_api_key: Option<String>,
    #[clap(long, default_value = "gemini-3-pro-image-preview", env = "GEMINI_MODEL")]
    /// Image model to call. Env: GEMINI_MODEL
    pub gemini_model: String,
    #[clap(
        long,
        default_value = "https://generativelanguage.googleapis.com",
        env = "GEMINI_API_URL"
    )]
    /// Gemini API root. Env: GEMINI_API_URL
    pub gemini_api_url: String,

    #[clap(long, env = "BREVO_API_KEY", hide_env_values = true)]
    /// Transactional email API key. Env: BREVO_API_KEY
    pub email_api_key: Option<String>,
    #[clap(long, default_value = "https://api.brevo.com", env = "BREVO_API_URL")]
    /// Transactional email API root. Env: BREVO_API_URL
    pub email_api_url: String,
    #[clap(long, env = "EMAIL_FROM")]
    /// Verified sender address. Env: EMAIL_FROM
    pub email_from: Option<String>,

    #[clap(long, env = "ADMIN_TOKEN", hide_env_values = true)]
    /// Token for the subscriber export. The export is disabled when unset.
    /// Env: ADMIN_TOKEN
    pub admin_token: Option<String>,
}
