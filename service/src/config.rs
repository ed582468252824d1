use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default TrueLayer auth server used when `TRUELAYER_AUTH_URL` is not set.
pub const DEFAULT_TRUELAYER_AUTH_URL: &str = "https://auth.truelayer.com";
/// Default TrueLayer data API used when `TRUELAYER_API_URL` is not set.
pub const DEFAULT_TRUELAYER_API_URL: &str = "https://api.truelayer.com";
/// Default Monzo consent screen used when `MONZO_AUTH_URL` is not set.
pub const DEFAULT_MONZO_AUTH_URL: &str = "https://auth.monzo.com";
/// Default Monzo API used when `MONZO_API_URL` is not set.
pub const DEFAULT_MONZO_API_URL: &str = "https://api.monzo.com";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

/// OAuth client registration and endpoints for one gateway, as read from config.
#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_url: Option<String>,
    pub auth_url: String,
    pub api_url: String,
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The TrueLayer OAuth client ID.
    #[arg(long, env)]
    truelayer_client_id: Option<String>,

    /// The TrueLayer OAuth client secret.
    #[arg(long, env, hide_env_values = true)]
    truelayer_client_secret: Option<String>,

    /// The redirect URL registered with TrueLayer (normally this server's /oauth/callback).
    #[arg(long, env)]
    truelayer_redirect_url: Option<String>,

    /// The base URL of the TrueLayer auth server.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_TRUELAYER_AUTH_URL)]
    truelayer_auth_url: String,

    /// The base URL of the TrueLayer data API.
    #[arg(long, env, default_value = DEFAULT_TRUELAYER_API_URL)]
    truelayer_api_url: String,

    /// The Monzo OAuth client ID.
    #[arg(long, env)]
    monzo_client_id: Option<String>,

    /// The Monzo OAuth client secret.
    #[arg(long, env, hide_env_values = true)]
    monzo_client_secret: Option<String>,

    /// The redirect URL registered with Monzo.
    #[arg(long, env)]
    monzo_redirect_url: Option<String>,

    /// The base URL of the Monzo consent screen.
    #[arg(long, env, default_value = DEFAULT_MONZO_AUTH_URL)]
    monzo_auth_url: String,

    /// The base URL of the Monzo API.
    #[arg(long, env, default_value = DEFAULT_MONZO_API_URL)]
    monzo_api_url: String,

    /// Path of the dotenv-style file access and refresh tokens are written back to.
    #[arg(long, env, default_value = ".env")]
    pub token_store_path: PathBuf,

    /// Timeout in seconds applied to every outbound gateway call
    #[arg(long, env, default_value_t = 10)]
    pub http_timeout_secs: u64,

    /// Maximum retries for data API calls that fail with a transient transport error
    #[arg(long, env, default_value_t = 2)]
    pub http_max_retries: u32,

    /// Days of transaction history fetched when the caller gives no explicit range
    #[arg(long, env, default_value_t = 90)]
    pub transaction_history_days: u32,

    /// The base URL of the frontend application (e.g. http://localhost:3000).
    /// OAuth callbacks are forwarded there.
    #[arg(long, env, default_value = "http://localhost:3000")]
    frontend_base_url: String,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 3001)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// TrueLayer client registration and endpoints.
    pub fn truelayer(&self) -> GatewaySettings {
        GatewaySettings {
            client_id: self.truelayer_client_id.clone(),
            client_secret: self.truelayer_client_secret.clone(),
            redirect_url: self.truelayer_redirect_url.clone(),
            auth_url: self.truelayer_auth_url.clone(),
            api_url: self.truelayer_api_url.clone(),
        }
    }

    /// Monzo client registration and endpoints.
    pub fn monzo(&self) -> GatewaySettings {
        GatewaySettings {
            client_id: self.monzo_client_id.clone(),
            client_secret: self.monzo_client_secret.clone(),
            redirect_url: self.monzo_redirect_url.clone(),
            auth_url: self.monzo_auth_url.clone(),
            api_url: self.monzo_api_url.clone(),
        }
    }

    pub fn set_truelayer_urls(mut self, auth_url: &str, api_url: &str) -> Self {
        self.truelayer_auth_url = auth_url.to_string();
        self.truelayer_api_url = api_url.to_string();
        self
    }

    pub fn set_monzo_urls(mut self, auth_url: &str, api_url: &str) -> Self {
        self.monzo_auth_url = auth_url.to_string();
        self.monzo_api_url = api_url.to_string();
        self
    }

    /// Returns the frontend application base URL, without a trailing slash.
    pub fn frontend_base_url(&self) -> &str {
        self.frontend_base_url.trim_end_matches('/')
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
