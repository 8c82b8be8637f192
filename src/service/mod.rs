pub mod initializer;
pub mod launcher;
pub mod password;
pub mod readiness;
pub mod seeder;

pub use initializer::{InitReport, Initializer};
pub use launcher::{ExecHandoff, Handoff, Launcher, ServerCommand};
pub use readiness::{GateState, ReadinessGate};
pub use seeder::{SeedReport, Seeder};
