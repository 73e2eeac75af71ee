use common::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// The admin account is only seeded when this is set.
    #[serde(default)]
    pub admin_password: Option<String>,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

/// One output size of the rendition pipeline.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RenditionSpec {
    pub name: String,
    pub max_width: u32,
    pub max_height: u32,
}

impl RenditionSpec {
    pub fn new(name: &str, max_width: u32, max_height: u32) -> Self {
        Self {
            name: name.to_string(),
            max_width,
            max_height,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    /// JPEG encoder quality (1-100).
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_renditions")]
    pub renditions: Vec<RenditionSpec>,
    /// Largest accepted upload body, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            renditions: default_renditions(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// SendGrid-compatible API key. Without it, mail is only logged.
    pub api_key: Option<String>,
    #[serde(default = "default_mail_api_url")]
    pub api_url: String,
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_mail_api_url(),
            sender: None,
            recipient: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("database.url", "sqlite://./instance/blog.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., FOLIO__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("FOLIO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

fn default_cors_max_age() -> u64 {
    3600
}
fn default_max_connections() -> u32 {
    20
}
fn default_admin_username() -> String {
    "admin".into()
}
fn default_session_ttl_hours() -> i64 {
    24 * 7
}
fn default_quality() -> u8 {
    85
}
fn default_renditions() -> Vec<RenditionSpec> {
    vec![
        RenditionSpec::new("thumbnail", 300, 300),
        RenditionSpec::new("medium", 800, 800),
        RenditionSpec::new("large", 1200, 1200),
    ]
}
fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_mail_api_url() -> String {
    "https://api.sendgrid.com/v3/mail/send".into()
}
