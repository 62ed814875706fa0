//! BGE-M3 dense embeddings on candle

use super::download::ModelDownloader;
use super::hardware::{create_device, HardwareDetector};
use super::models::EmbeddingModel;
use super::{l2_normalize, Embedder, EmbeddingError};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaModel};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

/// BGE-M3 running locally. Output is the normalized `[CLS]` hidden state.
pub struct BgeM3Embedder {
    model: XLMRobertaModel,
    /// Truncates to the model's context window; used for encoding
    tokenizer: Tokenizer,
    /// Untruncated copy; used for token counts
    counter: Tokenizer,
    device: Device,
    model_info: &'static EmbeddingModel,
}

impl BgeM3Embedder {
    /// Downloads (if needed) and loads BGE-M3. Blocking.
    pub fn load(cache_dir: Option<PathBuf>) -> Result<Self, EmbeddingError> {
        Self::with_model(&EmbeddingModel::BGE_M3, cache_dir)
    }

    pub fn with_model(
        model_info: &'static EmbeddingModel,
        cache_dir: Option<PathBuf>,
    ) -> Result<Self, EmbeddingError> {
        let capabilities = HardwareDetector::detect();
        if capabilities.available_ram_gb() < model_info.ram_required_gb {
            warn!(
                "{} needs about {:.1}GB RAM, only {:.1}GB available",
                model_info.display_name,
                model_info.ram_required_gb,
                capabilities.available_ram_gb()
            );
        }

        let downloader = match cache_dir {
            Some(dir) => ModelDownloader::with_cache_dir(dir)?,
            None => ModelDownloader::new()?,
        };
        let files = downloader.download(model_info)?;

        let config: Config = serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;

        let counter = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| EmbeddingError::Tokenizer(format!("Failed to load tokenizer: {}", e)))?;
        let mut tokenizer = counter.clone();
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: model_info.max_tokens,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        let device = create_device(capabilities.best_device());
        info!(
            "Loading {} on {} device...",
            model_info.display_name,
            capabilities.best_device()
        );

        let start = Instant::now();
        let model = match Self::load_weights(&files.weights, &config, &device) {
            Ok(model) => model,
            Err(e) if !device.is_cpu() => {
                warn!(
                    "Failed to load {} on {}: {}. Falling back to CPU",
                    model_info.display_name,
                    capabilities.best_device(),
                    e
                );
                return Self::finish(
                    Self::load_weights(&files.weights, &config, &Device::Cpu)?,
                    tokenizer,
                    counter,
                    Device::Cpu,
                    model_info,
                    start,
                );
            }
            Err(e) => return Err(e),
        };

        Self::finish(model, tokenizer, counter, device, model_info, start)
    }

    fn finish(
        model: XLMRobertaModel,
        tokenizer: Tokenizer,
        counter: Tokenizer,
        device: Device,
        model_info: &'static EmbeddingModel,
        start: Instant,
    ) -> Result<Self, EmbeddingError> {
        info!(
            "Model loaded in {:.1}s",
            start.elapsed().as_secs_f64()
        );
        Ok(Self {
            model,
            tokenizer,
            counter,
            device,
            model_info,
        })
    }

    fn load_weights(
        weights: &Path,
        config: &Config,
        device: &Device,
    ) -> Result<XLMRobertaModel, EmbeddingError> {
        let is_safetensors = weights
            .extension()
            .map(|ext| ext == "safetensors")
            .unwrap_or(false);

        let vb = if is_safetensors {
            // SAFETY: the file is owned by the HuggingFace cache and not modified while mapped
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)? }
        } else {
            debug!("Loading PyTorch weights from {}", weights.display());
            VarBuilder::from_pth(weights, DType::F32, device)?
        };

        Ok(XLMRobertaModel::new(config, vb)?)
    }
}

impl Embedder for BgeM3Embedder {
    fn name(&self) -> &str {
        self.model_info.repo_id
    }

    fn dimension(&self) -> usize {
        self.model_info.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self.model.forward(
            &input_ids,
            &attention_mask,
            &token_type_ids,
            None,
            None,
            None,
        )?;

        let mut vector: Vec<f32> = hidden.i((0, 0))?.to_dtype(DType::F32)?.to_vec1()?;
        if vector.len() != self.model_info.dimension {
            return Err(EmbeddingError::Inference(format!(
                "Expected {} dimensions, model produced {}",
                self.model_info.dimension,
                vector.len()
            )));
        }
        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn count_tokens(&self, text: &str) -> Result<usize, EmbeddingError> {
        let encoding = self
            .counter
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }
}

impl std::fmt::Debug for BgeM3Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgeM3Embedder")
            .field("model", &self.model_info.repo_id)
            .field("device", &self.device)
            .finish()
    }
}
