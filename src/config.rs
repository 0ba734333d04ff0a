use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::composer::ResponseComposer;
use crate::encoder::{HashEncoder, RemoteEncoder, TextEncoder, DEFAULT_DIMENSION};
use crate::error::{EncodingError, GenerationError};
use crate::generator::{OpenAiGenerator, TextGenerator};

/// Process settings. Every flag falls back to an environment variable.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Settings {
    /// Address the HTTP server binds to.
    #[clap(long, env = "STAFFBOT_ADDR", default_value = "127.0.0.1:8000")]
    pub addr: String,

    /// Roster JSON document.
    #[clap(long, env = "STAFFBOT_DATA", default_value = "data/employees.json")]
    pub data: PathBuf,

    /// Matches handed to the composer per chat query.
    #[clap(long, env = "STAFFBOT_TOP_K", default_value_t = crate::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Enables generative mode when set.
    #[clap(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[clap(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[clap(long, env = "CHAT_MODEL", default_value = "gpt-3.5-turbo")]
    pub chat_model: String,

    #[clap(long, env = "EMBEDDING_MODEL", default_value = "all-MiniLM-L6-v2")]
    pub embedding_model: String,

    /// OpenAI-compatible embeddings endpoint. Without it the built-in hashing encoder is used.
    #[clap(long, env = "EMBEDDING_API_URL")]
    pub embedding_api_url: Option<String>,

    /// Bearer credential for the embeddings endpoint. Never shared with text generation.
    #[clap(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    pub embedding_api_key: Option<String>,

    #[clap(long, env = "EMBEDDING_DIM", default_value_t = DEFAULT_DIMENSION)]
    pub embedding_dim: usize,

    /// Deadline for one embeddings call.
    #[clap(long, env = "EMBEDDING_TIMEOUT_SECS", default_value = "30")]
    pub embedding_timeout_secs: u64,

    /// Deadline for one text-generation call.
    #[clap(long, env = "GENERATION_TIMEOUT_SECS", default_value = "30")]
    pub generation_timeout_secs: u64,
}

impl Settings {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding_timeout_secs)
    }

    /// Credential sent to the embeddings endpoint; blank counts as unset.
    pub fn embedding_credential(&self) -> Option<String> {
        self.embedding_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn encoder(&self) -> Result<Arc<dyn TextEncoder>, EncodingError> {
        match &self.embedding_api_url {
            Some(url) => {
                info!(url = %url, model = %self.embedding_model, "using remote embedding model");
                Ok(Arc::new(RemoteEncoder::new(
                    url,
                    self.embedding_model.clone(),
                    self.embedding_credential(),
                    self.embedding_dim,
                    self.embedding_timeout(),
                )?))
            }
            None => {
                info!(dimension = self.embedding_dim, "using built-in hashing encoder");
                Ok(Arc::new(HashEncoder::new(format!("hash:{}", self.embedding_model), self.embedding_dim)))
            }
        }
    }

    /// Generative when a credential is present; the choice holds for the process lifetime.
    pub fn composer(&self) -> Result<ResponseComposer, GenerationError> {
        let Some(key) = self.openai_api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            info!("no text generation credential, template responses only");
            return Ok(ResponseComposer::template_only());
        };

        info!(model = %self.chat_model, "text generation enabled");
        let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiGenerator::new(
            &self.openai_base_url,
            key,
            self.chat_model.clone(),
            self.generation_timeout(),
        )?);
        Ok(ResponseComposer::new(Some(generator)))
    }
}
