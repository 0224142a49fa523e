use std::{
    fmt,
    net::IpAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use tandoor_meal_api::DEFAULT_TIME_ZONE;
use tokio::{fs, sync::RwLock};

pub const CONFIG_PATH: &str = "tandoor.toml";

pub async fn read() -> anyhow::Result<Config> {
    read_from(CONFIG_PATH).await
}

pub async fn read_from(config_path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let config_path = config_path.as_ref();

    let canon = fs::canonicalize(".").await?;
    tracing::info!("try reading config file {config_path:?} at {canon:?}");

    let config = if fs::try_exists(config_path).await? {
        tracing::info!("found config");

        let config = fs::read_to_string(config_path).await?;
        let config = toml::from_str(&config)?;
        tracing::info!("read config");
        config
    } else {
        tracing::info!("config does not exist, using default config");
        Config::default()
    };

    tracing::info!("using config: {config:#?}");
    Ok(config)
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default = "default_scan_schedule")]
    pub scan_schedule: String,
    #[serde(default)]
    pub server: ServerConfig,
    pub entry: Option<EntryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan_schedule: default_scan_schedule(),
            server: ServerConfig::default(),
            entry: None,
        }
    }
}

/// hourly, on the hour
fn default_scan_schedule() -> String {
    "0 0 * * * *".into()
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.into()
}

/// the configuration entry created by the setup flow
#[derive(Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EntryConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl EntryConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            time_zone: default_time_zone(),
        }
    }

    pub fn title(&self) -> String {
        format!("Tandoor_{}", self.url)
    }
}

// keeps the key out of the logs
impl fmt::Debug for EntryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        #[cfg(not(debug_assertions))]
        tracing::warn!("using default server config in release");

        ServerConfig {
            address: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
        }
    }
}

/// holds the single config entry and writes it back into the config file
#[derive(Clone)]
pub struct EntryStore {
    path: Arc<PathBuf>,
    entry: Arc<RwLock<Option<EntryConfig>>>,
}

impl EntryStore {
    pub fn new(path: impl Into<PathBuf>, entry: Option<EntryConfig>) -> Self {
        Self {
            path: Arc::new(path.into()),
            entry: Arc::new(RwLock::new(entry)),
        }
    }

    pub async fn get(&self) -> Option<EntryConfig> {
        self.entry.read().await.clone()
    }

    /// fails with `AlreadyConfigured` if another entry got stored first
    pub async fn create(&self, entry: EntryConfig) -> Result<(), StoreError> {
        let mut current = self.entry.write().await;
        if current.is_some() {
            return Err(StoreError::AlreadyConfigured);
        }

        self.write_entry(&entry).await?;
        tracing::info!("stored config entry {}", entry.title());

        *current = Some(entry);
        Ok(())
    }

    async fn write_entry(&self, entry: &EntryConfig) -> anyhow::Result<()> {
        let mut config = read_from(self.path.as_path()).await?;
        config.entry = Some(entry.clone());
        fs::write(self.path.as_path(), toml::to_string(&config)?).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an entry is already configured")]
    AlreadyConfigured,
    #[error(transparent)]
    Write(#[from] anyhow::Error),
}
