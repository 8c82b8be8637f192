pub mod seed;

pub use seed::{SeedAccount, SeedPassword, SeedPolicy};
