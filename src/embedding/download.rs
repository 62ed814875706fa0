//! Model downloading from HuggingFace Hub

use super::models::EmbeddingModel;
use super::EmbeddingError;
use hf_hub::api::sync::{Api, ApiBuilder};
use hf_hub::{Cache, Repo, RepoType};
use std::path::PathBuf;
use tracing::{debug, info};

/// Local paths of everything needed to run an embedding model
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Downloads and locates model files in the HuggingFace cache
pub struct ModelDownloader {
    api: Api,
    cache: Cache,
}

impl ModelDownloader {
    /// Uses the standard HuggingFace cache (`HF_HOME`, else `~/.cache/huggingface/hub`)
    pub fn new() -> Result<Self, EmbeddingError> {
        let cache = Cache::from_env();
        debug!("HuggingFace cache directory: {}", cache.path().display());

        let api = ApiBuilder::from_cache(cache.clone())
            .build()
            .map_err(|e| EmbeddingError::Download(format!("Failed to initialize HuggingFace Hub API: {}", e)))?;

        Ok(Self { api, cache })
    }

    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self, EmbeddingError> {
        std::fs::create_dir_all(&cache_dir)?;
        let cache = Cache::new(cache_dir);

        let api = ApiBuilder::from_cache(cache.clone())
            .build()
            .map_err(|e| EmbeddingError::Download(format!("Failed to initialize HuggingFace Hub API: {}", e)))?;

        Ok(Self { api, cache })
    }

    pub fn cache_dir(&self) -> &PathBuf {
        self.cache.path()
    }

    fn repo(model: &EmbeddingModel) -> Repo {
        Repo::new(model.repo_id.to_string(), RepoType::Model)
    }

    /// Returns the cached files if the whole model is already on disk
    pub fn cached_files(&self, model: &EmbeddingModel) -> Option<ModelFiles> {
        let repo = self.cache.repo(Self::repo(model));
        Some(ModelFiles {
            config: repo.get("config.json")?,
            tokenizer: repo.get("tokenizer.json")?,
            weights: model.weight_files.iter().find_map(|f| repo.get(f))?,
        })
    }

    pub fn is_downloaded(&self, model: &EmbeddingModel) -> bool {
        self.cached_files(model).is_some()
    }

    /// Downloads whatever is missing. Blocking; call from a blocking context.
    pub fn download(&self, model: &EmbeddingModel) -> Result<ModelFiles, EmbeddingError> {
        if let Some(files) = self.cached_files(model) {
            info!("Model {} already downloaded", model.display_name);
            return Ok(files);
        }

        info!(
            "Downloading {} ({} params) from {}...",
            model.display_name, model.params, model.repo_id
        );
        let repo = self.api.repo(Self::repo(model));

        let fetch = |filename: &str| {
            debug!("Downloading: {}", filename);
            repo.get(filename).map_err(|e| {
                EmbeddingError::Download(format!(
                    "Failed to download {} from {}: {}",
                    filename, model.repo_id, e
                ))
            })
        };

        let config = fetch("config.json")?;
        let tokenizer = fetch("tokenizer.json")?;

        let mut last_err = None;
        let mut weights = None;
        for filename in model.weight_files {
            match fetch(*filename) {
                Ok(path) => {
                    weights = Some(path);
                    break;
                }
                Err(e) => {
                    debug!("Weight file {} unavailable: {}", filename, e);
                    last_err = Some(e);
                }
            }
        }
        let weights = match (weights, last_err) {
            (Some(path), _) => path,
            (None, Some(e)) => return Err(e),
            (None, None) => {
                return Err(EmbeddingError::Download(format!(
                    "No weight files listed for {}",
                    model.repo_id
                )))
            }
        };

        info!("Model downloaded to {}", weights.display());
        Ok(ModelFiles {
            config,
            tokenizer,
            weights,
        })
    }
}
