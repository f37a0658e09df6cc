use std::fmt;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Optional listener for `/healthz` and `/metrics`.
    #[serde(default)]
    pub admin_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), admin_addr: None }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Token signing settings. The secret has no default and must come from
/// the config file or `JWT_SECRET`.
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            audience: default_audience(),
            expiry_minutes: default_expiry_minutes(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_minutes", &self.expiry_minutes)
            .finish()
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Longest accepted token lifetime (ten years).
pub const MAX_EXPIRY_MINUTES: i64 = 10 * 365 * 24 * 60;

fn default_issuer() -> String {
    "BuberDinner".into()
}

fn default_audience() -> String {
    "BuberDinner".into()
}

fn default_expiry_minutes() -> i64 {
    60
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

/// Load `$CONFIG_PATH` (or `config.toml`). A missing file yields defaults so
/// a deployment can be configured from the environment alone.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    match std::fs::read_to_string(&path) {
        Ok(content) => load_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("cannot read {path}: {e}")),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay environment-style values on top of the file contents.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(p) = lookup("SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.auth.jwt.secret = v;
        }
        if let Some(v) = lookup("JWT_ISSUER") {
            self.auth.jwt.issuer = v;
        }
        if let Some(v) = lookup("JWT_AUDIENCE") {
            self.auth.jwt.audience = v;
        }
        if let Some(m) = lookup("JWT_EXPIRY_MINUTES").and_then(|v| v.parse().ok()) {
            self.auth.jwt.expiry_minutes = m;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.auth.jwt.validate()?;
        self.auth.password.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.admin_addr.as_deref().is_some_and(|a| a.trim().is_empty()) {
            self.admin_addr = None;
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(anyhow!("auth.jwt.secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.issuer.trim().is_empty() || self.audience.trim().is_empty() {
            return Err(anyhow!("auth.jwt.issuer and auth.jwt.audience are required"));
        }
        if !(1..=MAX_EXPIRY_MINUTES).contains(&self.expiry_minutes) {
            return Err(anyhow!("auth.jwt.expiry_minutes must be in 1..={MAX_EXPIRY_MINUTES}"));
        }
        Ok(())
    }
}

impl PasswordConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 || self.parallelism == 0 {
            return Err(anyhow!("auth.password iterations and parallelism must be >= 1"));
        }
        // argon2 requires at least 8 KiB per lane
        if self.memory_kib < 8 * self.parallelism {
            return Err(anyhow!("auth.password.memory_kib must be >= 8 * parallelism"));
        }
        Ok(())
    }
}
