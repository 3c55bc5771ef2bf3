//! Speechmatics provider for infrastructure-as-code hosts.
//!
//! Configures an authenticated Speechmatics client from the provider block
//! and environment, then serves the `speechmatics_transcription` resource and
//! the `speechmatics_jobs` data source.

pub mod config;
pub mod datasources;
pub mod plugin;
pub mod provider;
pub mod resources;
pub mod speechmatics;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{ProviderModel, ResolvedConfig};
pub use plugin::global_registry;
pub use provider::{PROVIDER_TYPE_NAME, SpeechmaticsProvider};
pub use speechmatics::{SpeechmaticsClient, SpeechmaticsError};
