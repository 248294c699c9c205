//! Persona and user profile lookup.

use crate::types::{Persona, UserProfile};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors surfaced by a directory backend.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] json5::Error),
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait PersonaDirectory: Send + Sync {
    /// `None` when no persona has this id.
    async fn persona(&self, persona_id: &str) -> Result<Option<Persona>, DirectoryError>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// The default profile when the user is unknown.
    async fn profile(&self, user_id: &str) -> Result<UserProfile, DirectoryError>;
}

/// In-memory directory for both personas and profiles.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    personas: HashMap<String, Persona>,
    profiles: HashMap<String, UserProfile>,
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    personas: Vec<Persona>,
    #[serde(default)]
    profiles: HashMap<String, UserProfile>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ personas: [...], profiles: { user_id: {...} } }` from JSON5.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let directory = Self::from_json5(&contents)?;
        info!(
            "loaded directory (path={}, personas={}, profiles={})",
            path.display(),
            directory.personas.len(),
            directory.profiles.len()
        );
        Ok(directory)
    }

    pub fn from_json5(contents: &str) -> Result<Self, DirectoryError> {
        let file: DirectoryFile = json5::from_str(contents)?;
        let mut directory = Self::new();
        for persona in file.personas {
            directory = directory.with_persona(persona);
        }
        directory.profiles = file.profiles;
        Ok(directory)
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.personas.insert(persona.id.clone(), persona);
        self
    }

    pub fn with_profile(mut self, user_id: impl Into<String>, profile: UserProfile) -> Self {
        self.profiles.insert(user_id.into(), profile);
        self
    }
}

#[async_trait]
impl PersonaDirectory for StaticDirectory {
    async fn persona(&self, persona_id: &str) -> Result<Option<Persona>, DirectoryError> {
        Ok(self.personas.get(persona_id).cloned())
    }
}

#[async_trait]
impl ProfileDirectory for StaticDirectory {
    async fn profile(&self, user_id: &str) -> Result<UserProfile, DirectoryError> {
        Ok(self.profiles.get(user_id).cloned().unwrap_or_default())
    }
}
