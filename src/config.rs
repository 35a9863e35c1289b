//! Config handling

use std::path::PathBuf;

use tracing::log::LevelFilter;
use tracing::warn;
use url::Url;

use crate::cli::CliOptions;
use crate::error::RosterError;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("sqlx", LevelFilter::Warn)
            .with_module_level("sea_orm", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Credentials and endpoint for the image model.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// API key, requests fail with a configuration error when missing.
    pub api_key: Option<String>,
    /// Model name, eg `gemini-3-pro-image-preview`.
    pub model: String,
    /// API root, overridable so tests can point at a local server.
    pub api_url: Url,
}

/// Credentials and endpoint for the transactional email provider.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// Provider API key.
    pub api_key: Option<String>,
    /// Verified sender address.
    pub from: Option<String>,
    /// API root.
    pub api_url: Url,
}

/// Immutable application configuration, built once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Public URL prefix for image links, without a trailing slash.
    pub public_base_url: String,
    /// Where generated posters are written.
    pub generated_dir: PathBuf,
    /// Directory holding the roster photos.
    pub players_dir: PathBuf,
    /// Image model settings.
    pub gemini: GeminiConfig,
    /// Email provider settings.
    pub email: EmailConfig,
    /// Token guarding the subscriber export, `None` disables it.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Validates the CLI options and turns them into a config.
    pub fn from_cli(cli: &CliOptions) -> Result<Self, RosterError> {
        let public_base_url = Url::parse(&cli.public_base_url)?;
        let admin_token = non_empty(cli.admin_token.as_deref());
        if admin_token.is_none() {
            warn!("ADMIN_TOKEN is not set, the /emails export will refuse every request");
        }

        let config = Self {
            public_base_url: public_base_url.as_str().trim_end_matches('/').to_string(),
            generated_dir: cli.generated_dir.clone(),
            players_dir: cli.players_dir.clone(),
            gemini: GeminiConfig {
                api_key: non_empty(cli.google_api_key.as_deref()),
                model: cli.gemini_model.clone(),
                api_url: api_root(&cli.gemini_api_url)?,
            },
            email: EmailConfig {
                api_key: non_empty(cli.email_api_key.as_deref()),
                from: non_empty(cli.email_from.as_deref()),
                api_url: api_root(&cli.email_api_url)?,
            },
            admin_token,
        };

        if config.gemini.api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set, poster generation will fail");
        }
        if config.email.api_key.is_none() || config.email.from.is_none() {
            warn!("Email credentials are incomplete, posters will not be emailed");
        }
        Ok(config)
    }
}

/// Parses an API root so that relative endpoint paths join under it, keeping
/// any path prefix such as `https://proxy.example/gemini`.
fn api_root(value: &str) -> Result<Url, RosterError> {
    let mut url = Url::parse(value)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
