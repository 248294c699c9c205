//! Test helpers shared across Rapport crates.

pub mod fixtures;
pub mod generator;

pub use fixtures::{coaching_json, sample_persona, sample_profile};
pub use generator::{FailingGenerator, RecordingGenerator, ScriptedGenerator, SeenTurns};
