pub mod config;
pub mod text;

pub use config::RunDefaults;
pub use text::{label_matches, normalize_label, normalize_url};
