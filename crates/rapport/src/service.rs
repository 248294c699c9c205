//! Service wiring from a loaded config.

use directories::UserDirs;
use log::info;
use rapport_config::{ConfigError, DEFAULT_CONFIG_DIR, RapportConfig};
use rapport_core::{
    DirectoryError, GenerationError, KeyLocks, MemoryStores, PersonaDirectory, ProfileDirectory,
    RecommendationEngine, StaticDirectory, TextGenerator, TurnController, TurnSettings,
    generator_from_config,
};
use rapport_memory::{HashingEmbedder, MemoryError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while opening a [`Rapport`] service.
#[derive(Debug, Error)]
pub enum RapportError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("storage error: {0}")]
    Storage(#[from] MemoryError),
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
    #[error("generator error: {0}")]
    Generation(#[from] GenerationError),
    #[error("storage.path is unset and no home directory was found")]
    NoStorageRoot,
}

/// `~/.rapport/data`, used when `storage.path` is unset.
pub fn default_storage_root() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| dirs.home_dir().join(DEFAULT_CONFIG_DIR).join("data"))
}

/// Turn controller and recommendation engine sharing one set of stores.
pub struct Rapport {
    storage_root: PathBuf,
    conversations: TurnController,
    recommendations: RecommendationEngine,
}

impl Rapport {
    /// Open with the generator and directory described by `config`.
    ///
    /// Without `directory.path` the directory is empty and every persona
    /// lookup misses.
    pub fn open(config: RapportConfig) -> Result<Self, RapportError> {
        let generator = generator_from_config(&config.generation)?;
        let directory = match config.directory.path.as_deref() {
            Some(path) => StaticDirectory::load(path)?,
            None => StaticDirectory::new(),
        };
        let directory = Arc::new(directory);
        Self::open_with(config, generator, directory.clone(), directory)
    }

    /// Open with caller-supplied collaborators.
    pub fn open_with(
        config: RapportConfig,
        generator: Arc<dyn TextGenerator>,
        personas: Arc<dyn PersonaDirectory>,
        profiles: Arc<dyn ProfileDirectory>,
    ) -> Result<Self, RapportError> {
        config.validate()?;
        let storage_root = match config.storage.path.as_deref() {
            Some(path) => PathBuf::from(path),
            None => default_storage_root().ok_or(RapportError::NoStorageRoot)?,
        };
        let embedder = Arc::new(HashingEmbedder::new(config.embedding.dimensions)?);
        let stores = MemoryStores::open_files(&storage_root, embedder)?;
        let locks = Arc::new(KeyLocks::new());
        let conversations = TurnController::new(
            stores.clone(),
            personas.clone(),
            generator.clone(),
            locks.clone(),
            TurnSettings::from(&config.conversation),
        );
        let recommendations =
            RecommendationEngine::new(stores, personas, profiles, generator, locks);
        info!(
            "rapport opened (storage_root={}, max_turns={}, recall_k={})",
            storage_root.display(),
            config.conversation.max_turns,
            config.conversation.recall_k
        );
        Ok(Self {
            storage_root,
            conversations,
            recommendations,
        })
    }

    pub fn conversations(&self) -> &TurnController {
        &self.conversations
    }

    pub fn recommendations(&self) -> &RecommendationEngine {
        &self.recommendations
    }

    pub fn storage_root(&self) -> &std::path::Path {
        &self.storage_root
    }

    /// Shut the service down. Every store write is already durable, so this
    /// only releases the stores and collaborators.
    pub fn close(self) {
        info!(
            "rapport closed (storage_root={})",
            self.storage_root.display()
        );
    }
}
