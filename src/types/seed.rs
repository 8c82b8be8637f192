use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Longest username the `users` table accepts.
pub const MAX_USERNAME_LEN: usize = 150;

/// Plaintext credential from seed configuration. Never printed.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SeedPassword(String);

impl SeedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SeedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedPassword(<redacted>)")
    }
}

/// One baseline account to be created by the initializer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedAccount {
    pub username: String,
    pub password: SeedPassword,
}

impl SeedAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SeedPassword::new(password),
        }
    }
}

/// How the seeder decides whether an account gets inserted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Insert every configured account whose username is missing.
    #[default]
    PerAccount,
    /// Insert the whole list only when the table has no rows at all.
    IfEmpty,
}

/// Baseline accounts used when configuration does not supply any.
pub fn default_accounts() -> Vec<SeedAccount> {
    vec![
        SeedAccount::new("admin", "admin"),
        SeedAccount::new("SSA", "Gay"),
        SeedAccount::new("Ethos", "Hasini"),
    ]
}

/// Reject lists the store would choke on before any row is written.
pub fn validate_accounts(accounts: &[SeedAccount]) -> Result<(), GateError> {
    let mut seen = HashSet::with_capacity(accounts.len());
    for (idx, acc) in accounts.iter().enumerate() {
        let name = acc.username.trim();
        if name.is_empty() {
            return Err(GateError::InvalidSeed(format!(
                "entry {idx} has an empty username"
            )));
        }
        if name.len() != acc.username.len() {
            return Err(GateError::InvalidSeed(format!(
                "username {:?} has surrounding whitespace",
                acc.username
            )));
        }
        if acc.username.chars().count() > MAX_USERNAME_LEN {
            return Err(GateError::InvalidSeed(format!(
                "username {:?} exceeds {MAX_USERNAME_LEN} characters",
                acc.username
            )));
        }
        if acc.password.expose().is_empty() {
            return Err(GateError::InvalidSeed(format!(
                "account {:?} has an empty password",
                acc.username
            )));
        }
        if !seen.insert(acc.username.as_str()) {
            return Err(GateError::InvalidSeed(format!(
                "username {:?} listed more than once",
                acc.username
            )));
        }
    }
    Ok(())
}
