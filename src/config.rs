use crate::error::GateError;
use crate::types::seed::{SeedAccount, SeedPolicy, default_accounts};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "readygate.toml";
pub const ENV_PREFIX: &str = "READYGATE_";

/// File name of the readiness marker inside the instance directory.
pub const READY_MARKER: &str = ".ready";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: String,
    pub storage: StorageConfig,
    pub seed: SeedConfig,
    pub readiness: ReadinessConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            storage: StorageConfig::default(),
            seed: SeedConfig::default(),
            readiness: ReadinessConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory on the persistent mount shared by release and runtime.
    pub instance_dir: PathBuf,
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            instance_dir: PathBuf::from("/var/data/instance"),
            database_file: "users.db".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.instance_dir.join(&self.database_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub policy: SeedPolicy,
    pub accounts: Vec<SeedAccount>,
    /// JSON array of `{username, password}`; replaces `accounts` when set.
    pub file: Option<PathBuf>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            policy: SeedPolicy::default(),
            accounts: default_accounts(),
            file: None,
        }
    }
}

impl SeedConfig {
    pub fn resolve_accounts(&self) -> Result<Vec<SeedAccount>, GateError> {
        match self.file.as_ref() {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(self.accounts.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Defaults to `<instance_dir>/.ready`. Point it at the database file
    /// to wait on the store itself; init then writes no separate marker.
    pub signal: Option<PathBuf>,
    pub poll_interval_ms: u64,
    /// 0 waits forever.
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            signal: None,
            poll_interval_ms: 1000,
            timeout_secs: 300,
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub program: String,
    /// Application object handed to the server, e.g. `app:app`.
    pub target: String,
    pub bind: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub workers: u32,
    pub extra_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "gunicorn".to_string(),
            target: "app:app".to_string(),
            bind: "0.0.0.0".to_string(),
            port: 10000,
            timeout_secs: 120,
            workers: 1,
            extra_args: Vec::new(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `READYGATE_*` environment variables.
    /// Nested keys use `__`, e.g. `READYGATE_SERVER__PORT=8080`.
    pub fn load(path: Option<&Path>) -> Result<Self, GateError> {
        let toml_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(&toml_path).extract().map_err(GateError::from)
    }

    pub fn figment(toml_path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(toml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn signal_path(&self) -> PathBuf {
        self.readiness
            .signal
            .clone()
            .unwrap_or_else(|| self.storage.instance_dir.join(READY_MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment_layout() {
        let cfg = Config::default();
        assert_eq!(
            cfg.storage.database_path(),
            PathBuf::from("/var/data/instance/users.db")
        );
        assert_eq!(cfg.signal_path(), PathBuf::from("/var/data/instance/.ready"));
        assert_eq!(cfg.readiness.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.readiness.deadline(), Some(Duration::from_secs(300)));
        assert_eq!(cfg.seed.accounts.len(), 3);
    }

    #[test]
    fn zero_timeout_means_unbounded() {
        let r = ReadinessConfig {
            timeout_secs: 0,
            ..ReadinessConfig::default()
        };
        assert_eq!(r.deadline(), None);
    }

    #[test]
    fn toml_and_env_layers_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gate.toml",
                r#"
                    loglevel = "debug"

                    [storage]
                    instance_dir = "/srv/instance"

                    [seed]
                    policy = "if_empty"
                    accounts = [{ username = "ops", password = "pw" }]

                    [server]
                    port = 8000
                "#,
            )?;
            jail.set_env("READYGATE_SERVER__WORKERS", "4");
            jail.set_env("READYGATE_READINESS__TIMEOUT_SECS", "0");

            let cfg = Config::load(Some(Path::new("gate.toml"))).expect("config loads");
            assert_eq!(cfg.loglevel, "debug");
            assert_eq!(cfg.storage.instance_dir, PathBuf::from("/srv/instance"));
            assert_eq!(cfg.storage.database_file, "users.db");
            assert_eq!(cfg.seed.policy, SeedPolicy::IfEmpty);
            assert_eq!(cfg.seed.accounts, vec![SeedAccount::new("ops", "pw")]);
            assert_eq!(cfg.server.port, 8000);
            assert_eq!(cfg.server.workers, 4);
            assert_eq!(cfg.readiness.deadline(), None);
            Ok(())
        });
    }

    #[test]
    fn seed_file_replaces_inline_accounts() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("seed.json", r#"[{"username":"alice","password":"a"}]"#)?;
            let seed = SeedConfig {
                file: Some(jail.directory().join("seed.json")),
                ..SeedConfig::default()
            };
            let accounts = seed.resolve_accounts().expect("seed file parses");
            assert_eq!(accounts, vec![SeedAccount::new("alice", "a")]);
            Ok(())
        });
    }
}
