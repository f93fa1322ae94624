//! MathQuest Engine - combat orchestration over injected ports.

pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::{App, Repositories};
pub use infrastructure::settings::Settings;
