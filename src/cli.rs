//! CLI argument parsing, validation, and startup helpers.

use std::net::IpAddr;
use std::time::Duration;

use crate::ServerConfig;
use crate::auth::{CookieSettings, SameSite};
use crate::config::{
    AuthConfig, DEFAULT_CSRF_COOKIE_NAME, DEFAULT_CSRF_HEADER_NAME, SigningAlgorithm,
};
use crate::db::Database;
use crate::rate_limit::DEFAULT_LOGIN_PER_MINUTE;
use axum::http::HeaderName;
use clap::Parser;
use tracing::{error, info};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

/// Reverse-proxy header that carries the client address.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientIpHeader {
    /// `X-Forwarded-For`, rightmost entry (the one appended by the proxy)
    XForwardFor,
    /// `X-Real-IP`
    XRealIp,
    /// `CF-Connecting-IP`
    CfConnectingIp,
}

/// Reads the client IP from a trusted proxy header.
#[derive(Clone, Copy, Debug)]
pub struct IpExtractor {
    pub header_name: &'static str,
    parse: fn(&str) -> Result<String, &'static str>,
}

impl IpExtractor {
    /// Parse a header value into a normalized IP address.
    pub fn extract(&self, header_value: &str) -> Result<String, &'static str> {
        (self.parse)(header_value)
    }
}

impl From<ClientIpHeader> for IpExtractor {
    fn from(header: ClientIpHeader) -> Self {
        match header {
            ClientIpHeader::XForwardFor => IpExtractor {
                header_name: "x-forwarded-for",
                parse: parse_forwarded_for,
            },
            ClientIpHeader::XRealIp => IpExtractor {
                header_name: "x-real-ip",
                parse: parse_single_ip,
            },
            ClientIpHeader::CfConnectingIp => IpExtractor {
                header_name: "cf-connecting-ip",
                parse: parse_single_ip,
            },
        }
    }
}

fn parse_single_ip(value: &str) -> Result<String, &'static str> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| "IP header is not an IP address")
}

fn parse_forwarded_for(value: &str) -> Result<String, &'static str> {
    parse_single_ip(value.rsplit(',').next().unwrap_or(value))
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "todoguard",
    about = "Todo API with JWT sessions and CSRF protection"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "todoguard.db")]
    pub database: String,

    /// Path to file containing the JWT signing key. Prefer the JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Path to file containing the CSRF key. Prefer the CSRF_SECRET env var instead
    #[arg(long)]
    pub csrf_secret_file: Option<String>,

    /// Algorithm for signing access credentials
    #[arg(long, env = "JWT_ALGORITHM", default_value = "hs256")]
    pub jwt_algorithm: SigningAlgorithm,

    /// Access credential lifetime in minutes
    #[arg(long, env = "JWT_TTL_MINUTES", default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    pub jwt_ttl_minutes: u64,

    /// Request header carrying the CSRF token
    #[arg(long, env = "CSRF_HEADER_NAME", default_value = DEFAULT_CSRF_HEADER_NAME)]
    pub csrf_header_name: String,

    /// Cookie holding the CSRF secret
    #[arg(long, env = "CSRF_COOKIE_NAME", default_value = DEFAULT_CSRF_COOKIE_NAME)]
    pub csrf_cookie_name: String,

    /// Domain attribute for cookies
    #[arg(long, env = "COOKIE_DOMAIN")]
    pub cookie_domain: Option<String>,

    /// Drop the Secure attribute from cookies (local HTTP development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// SameSite attribute for cookies
    #[arg(long, env = "COOKIE_SAMESITE", default_value = "none")]
    pub cookie_samesite: SameSite,

    /// Login attempts allowed per client per minute
    #[arg(long, default_value_t = DEFAULT_LOGIN_PER_MINUTE)]
    pub login_rate_per_minute: u32,

    /// bcrypt cost for new password hashes
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST, value_parser = clap::value_parser!(u32).range(4..=31))]
    pub password_cost: u32,

    /// Take the client IP from this proxy header instead of the socket address.
    /// Only set this behind a reverse proxy that overwrites the header
    #[arg(long, env = "IP_HEADER")]
    pub ip_header: Option<ClientIpHeader>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load a signing key from an environment variable or file.
/// Returns None and logs an error if the key cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>, flag: &str) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read secret file");
                return None;
            }
        }
    } else {
        error!(
            "{} is required. Set the {} environment variable (recommended) or use {}",
            env_var, env_var, flag
        );
        return None;
    };

    if secret.len() < MIN_SECRET_LENGTH {
        error!(
            "{} is shorter than {} characters. Use a longer secret",
            env_var, MIN_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build the authentication configuration from validated arguments.
pub fn build_auth_config(args: &Args, jwt_secret: String, csrf_secret: String) -> AuthConfig {
    AuthConfig {
        jwt_secret: jwt_secret.into_bytes(),
        jwt_algorithm: args.jwt_algorithm,
        jwt_ttl: Duration::from_secs(args.jwt_ttl_minutes * 60),
        csrf_secret: csrf_secret.into_bytes(),
        csrf_header_name: args.csrf_header_name.clone(),
        csrf_cookie_name: args.csrf_cookie_name.clone(),
        cookies: CookieSettings {
            domain: args.cookie_domain.clone(),
            secure: !args.insecure_cookies,
            same_site: args.cookie_samesite,
        },
    }
}

/// Check that configured names and the cookie domain can be sent in headers.
/// Logs the first problem and returns false.
pub fn validate_auth_config(config: &AuthConfig) -> bool {
    if HeaderName::from_bytes(config.csrf_header_name.as_bytes()).is_err() {
        error!(name = %config.csrf_header_name, "Invalid CSRF header name");
        return false;
    }

    let is_token = |s: &str| {
        !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
    };
    if !is_token(&config.csrf_cookie_name) {
        error!(name = %config.csrf_cookie_name, "Invalid CSRF cookie name");
        return false;
    }

    if let Some(domain) = &config.cookies.domain {
        let valid = !domain.is_empty()
            && domain
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-');
        if !valid {
            error!(domain = %domain, "Invalid cookie domain");
            return false;
        }
    }

    true
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    args: &Args,
    db: Database,
    jwt_secret: String,
    csrf_secret: String,
) -> ServerConfig {
    ServerConfig {
        db,
        auth: build_auth_config(args, jwt_secret, csrf_secret),
        login_rate_per_minute: args.login_rate_per_minute,
        password_cost: args.password_cost,
        ip_extractor: args.ip_header.map(IpExtractor::from),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
