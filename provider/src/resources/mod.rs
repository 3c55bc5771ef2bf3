//! Managed resources.

pub mod transcription;

pub use transcription::TranscriptionResource;
