//! Sentence-transformer embeddings with candle
//!
//! Loads a BERT-family sentence-transformer (all-MiniLM-L6-v2 by default)
//! from the HuggingFace hub and produces attention-masked mean-pooled,
//! L2-normalized sentence vectors.

use crate::config::EmbeddingConfig;
use crate::error::{CorpusError, Result};
use crate::ml::device::select_device;
use crate::ml::embedding::{Embedding, SimilarityProvider};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// BERT sentence embedder
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
    batch_size: usize,
}

impl SentenceEmbedder {
    /// Download (or reuse the hub cache for) the model and load it
    pub fn load(config: &EmbeddingConfig) -> Result<Self> {
        let (device_type, device) = select_device();
        log::info!(
            "Loading embedding model {} ({}) on {}",
            config.model_name,
            config.revision,
            device_type
        );

        let (config_path, tokenizer_path, weights_path) = fetch_model_files(config)?;

        let bert_config: BertConfig =
            serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            CorpusError::MachineLearning(format!("Failed to load tokenizer: {}", e))
        })?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                CorpusError::MachineLearning(format!("Failed to configure truncation: {}", e))
            })?;

        // Safety: the weights file is owned by the hub cache and not modified while mapped
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)? };
        let model = BertModel::load(vb, &bert_config)?;

        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: config.model_name.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| CorpusError::MachineLearning(format!("Tokenization failed: {}", e)))?;

        let ids = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|encoding| Tensor::new(encoding.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        // [batch, seq, hidden]
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean over real tokens only
        let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?;
        let pooled = summed.broadcast_div(&counts)?;

        let norms = pooled.sqr()?.sum_keepdim(1)?.sqrt()?;
        let normalized = pooled.broadcast_div(&norms)?;

        Ok(normalized.to_vec2::<f32>()?)
    }
}

impl SimilarityProvider for SentenceEmbedder {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embed_batch(batch)?);
        }
        Ok(embeddings)
    }
}

fn fetch_model_files(config: &EmbeddingConfig) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let api = Api::new()
        .map_err(|e| CorpusError::MachineLearning(format!("Failed to create HF API: {}", e)))?;
    let repo = api.repo(Repo::with_revision(
        config.model_name.clone(),
        RepoType::Model,
        config.revision.clone(),
    ));

    let get = |filename: &str| {
        repo.get(filename).map_err(|e| {
            CorpusError::MachineLearning(format!(
                "Failed to download {}/{}: {}",
                config.model_name, filename, e
            ))
        })
    };

    Ok((
        get("config.json")?,
        get("tokenizer.json")?,
        get("model.safetensors")?,
    ))
}
