//! Use cases - user-facing operations that orchestrate ports and the domain.

pub mod combat;

pub use combat::CombatUseCases;
