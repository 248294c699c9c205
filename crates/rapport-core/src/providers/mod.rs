//! Text generator implementations.

mod openai;

pub use openai::OpenAiCompatibleGenerator;

use crate::generation::{GenerationError, TextGenerator};
use log::info;
use rapport_config::GenerationConfig;
use std::sync::Arc;

/// Build the generator named by `config.provider`.
pub fn generator_from_config(
    config: &GenerationConfig,
) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match config.provider.as_str() {
        "openai" => {
            let generator = OpenAiCompatibleGenerator::from_config(config)?;
            info!(
                "text generator configured (provider=openai, base_url={}, model={})",
                config.base_url,
                generator.model()
            );
            Ok(Arc::new(generator))
        }
        other => Err(GenerationError::Config(format!(
            "unsupported generation provider: {other}"
        ))),
    }
}
