pub mod audit;
pub mod browser;
pub mod project;
pub mod report;
pub mod runner;
pub mod suites;
pub mod utils;

// Re-export common items
pub use project::{load_projects, resolve_projects};
pub use report::generate_report;
pub use runner::run_projects;
