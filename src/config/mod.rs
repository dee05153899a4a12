pub mod types;
pub mod loader;
pub mod profiles;

pub use types::*;
pub use loader::Config;
pub use profiles::{BackendSettings, DetectionProfile, ProfileManager};
