use crate::db::models::NewUser;
use crate::db::sqlite::UsersStorage;
use crate::error::GateError;
use crate::service::password::hash_password;
use crate::types::seed::{SeedAccount, SeedPolicy, validate_accounts};
use serde::Serialize;
use tracing::info;

/// Outcome of one seeding pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
    /// `if_empty` found rows and did nothing.
    pub skipped_nonempty: bool,
}

pub struct Seeder<'a> {
    storage: &'a UsersStorage,
    policy: SeedPolicy,
}

impl<'a> Seeder<'a> {
    pub fn new(storage: &'a UsersStorage, policy: SeedPolicy) -> Self {
        Self { storage, policy }
    }

    pub async fn seed(&self, accounts: &[SeedAccount]) -> Result<SeedReport, GateError> {
        validate_accounts(accounts)?;
        let mut report = SeedReport::default();

        if self.policy == SeedPolicy::IfEmpty {
            let count = self.storage.count().await?;
            if count > 0 {
                info!(count, "Users already present; skipping default user seeding.");
                report.skipped_nonempty = true;
                return Ok(report);
            }
        }

        let mut pending = Vec::with_capacity(accounts.len());
        for acc in accounts {
            if self.storage.get_by_username(&acc.username).await?.is_some() {
                info!("User {} already exists.", acc.username);
                report.existing.push(acc.username.clone());
                continue;
            }
            let hash = hash_password(acc.password.expose())?;
            pending.push(NewUser::new(acc.username.clone(), hash));
        }

        let names: Vec<String> = pending.iter().map(|u| u.username.clone()).collect();
        let inserted = self.storage.insert_many_if_absent(pending).await?;

        for (name, created) in names.into_iter().zip(inserted) {
            if created {
                info!("Creating default user: {name}");
                report.created.push(name);
            } else {
                // taken between the lookup and the insert
                info!("User {name} already exists.");
                report.existing.push(name);
            }
        }
        Ok(report)
    }
}
