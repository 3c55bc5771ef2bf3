//! Resource and data source registration.
//!
//! Built-in types are submitted to `inventory` in [`builtin`] and collected
//! into the [`PluginRegistry`] on first use:
//!
//! ```ignore
//! inventory::submit! {
//!     PluginConstructor::resource("transcription", create_transcription_resource)
//! }
//! ```

pub mod builtin;
pub mod registry;

pub use registry::{ConstructorKind, PluginConstructor, PluginRegistry, global_registry};
