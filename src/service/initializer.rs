use crate::config::{Config, READY_MARKER};
use crate::db::sqlite::UsersStorage;
use crate::error::GateError;
use crate::service::seeder::{SeedReport, Seeder};
use crate::types::seed::{SeedAccount, SeedPolicy, validate_accounts};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Release-time setup: instance directory, schema, seed accounts, readiness marker.
#[derive(Debug, Clone)]
pub struct Initializer {
    instance_dir: PathBuf,
    database_path: PathBuf,
    marker_path: PathBuf,
    accounts: Vec<SeedAccount>,
    policy: SeedPolicy,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub database_path: PathBuf,
    pub marker_path: PathBuf,
    pub seed: SeedReport,
}

impl Initializer {
    /// `users.db` and `.ready` inside `instance_dir`, per-account seeding.
    pub fn new(instance_dir: impl Into<PathBuf>, accounts: Vec<SeedAccount>) -> Self {
        let instance_dir = instance_dir.into();
        Self {
            database_path: instance_dir.join("users.db"),
            marker_path: instance_dir.join(READY_MARKER),
            instance_dir,
            accounts,
            policy: SeedPolicy::default(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, GateError> {
        let accounts = cfg.seed.resolve_accounts()?;
        Ok(Self {
            instance_dir: cfg.storage.instance_dir.clone(),
            database_path: cfg.storage.database_path(),
            marker_path: cfg.signal_path(),
            accounts,
            policy: cfg.seed.policy,
        })
    }

    pub fn with_policy(mut self, policy: SeedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_marker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker_path = path.into();
        self
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Run every step in order. A marker left by an earlier run is withdrawn
    /// first, so any failure leaves the gate closed.
    pub async fn run(&self) -> Result<InitReport, GateError> {
        self.retract_marker().await?;
        validate_accounts(&self.accounts)?;
        self.ensure_instance_dir().await?;

        let storage = self.open_store().await?;
        let seeded = self.prepare_store(&storage).await;
        storage.close().await;
        let seed = seeded?;

        self.publish_marker().await?;
        info!(
            database = %self.database_path.display(),
            marker = %self.marker_path.display(),
            created = seed.created.len(),
            existing = seed.existing.len(),
            "Database initialization complete."
        );

        Ok(InitReport {
            database_path: self.database_path.clone(),
            marker_path: self.marker_path.clone(),
            seed,
        })
    }

    /// Create the instance directory and parents; an existing one is fine.
    pub async fn ensure_instance_dir(&self) -> Result<(), GateError> {
        tokio::fs::create_dir_all(&self.instance_dir).await?;
        if let Some(parent) = self.database_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        info!(path = %self.instance_dir.display(), "Instance directory ready.");
        Ok(())
    }

    pub async fn open_store(&self) -> Result<UsersStorage, GateError> {
        UsersStorage::connect(&self.database_path).await
    }

    async fn prepare_store(&self, storage: &UsersStorage) -> Result<SeedReport, GateError> {
        info!("Creating all database tables...");
        storage.init_schema().await?;
        info!("Tables created.");

        Seeder::new(storage, self.policy).seed(&self.accounts).await
    }

    /// True when the launcher waits on the database file itself. The store
    /// is then the signal and must never be written as a marker.
    pub async fn marker_is_store(&self) -> bool {
        if self.marker_path == self.database_path {
            return true;
        }
        match (
            tokio::fs::canonicalize(&self.marker_path).await,
            tokio::fs::canonicalize(&self.database_path).await,
        ) {
            (Ok(marker), Ok(db)) => marker == db,
            _ => false,
        }
    }

    /// Remove a marker published by a previous run. Missing is fine.
    pub async fn retract_marker(&self) -> Result<(), GateError> {
        if self.marker_is_store().await {
            return Ok(());
        }
        match tokio::fs::remove_file(&self.marker_path).await {
            Ok(()) => {
                info!(path = %self.marker_path.display(), "Stale readiness marker removed.");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the marker under a temporary name, then rename it into place so
    /// a watcher never sees a half-written file.
    pub async fn publish_marker(&self) -> Result<(), GateError> {
        if self.marker_is_store().await {
            info!(
                path = %self.marker_path.display(),
                "Readiness signal is the database file; no separate marker written."
            );
            return Ok(());
        }
        if let Some(parent) = self.marker_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp = self.marker_path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, format!("{}\n", Utc::now().to_rfc3339())).await?;
        tokio::fs::rename(&tmp, &self.marker_path).await?;
        info!(path = %self.marker_path.display(), "Readiness marker published.");
        Ok(())
    }
}
