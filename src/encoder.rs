use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EncodingError;
use crate::vector::l2_normalize;

/// Width of all-MiniLM-L6-v2 sentence embeddings.
pub const DEFAULT_DIMENSION: usize = 384;

/// Turns text into fixed-length vectors.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    fn model(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError>;

    /// One vector per input, same order as the input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError>;
}

// Fixed seeds: changing them changes every embedding.
const SEED: (u64, u64, u64, u64) = (
    0x0123_4567_89ab_cdef,
    0xfedc_ba98_7654_3210,
    0x9e37_79b9_7f4a_7c15,
    0x6a09_e667_f3bc_c908,
);

const BIGRAM_WEIGHT: f32 = 0.5;

/// Offline sentence encoder based on signed feature hashing.
///
/// Unigrams and adjacent bigrams are hashed into `dimension` buckets and the
/// result is L2-normalised, so texts sharing vocabulary land close together
/// under Euclidean distance.
#[derive(Debug, Clone)]
pub struct HashEncoder {
    model: String,
    dimension: usize,
}

impl HashEncoder {
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self { model: model.into(), dimension: dimension.max(1) }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];

        for tok in &tokens {
            self.accumulate(&mut vector, tok, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, BIGRAM_WEIGHT);
        }

        l2_normalize(&mut vector);
        vector
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let h = seahash::hash_seeded(feature.as_bytes(), SEED.0, SEED.1, SEED.2, SEED.3);
        let bucket = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashEncoder {
    fn default() -> Self {
        Self::new("hash-v1", DEFAULT_DIMENSION)
    }
}

/// Lowercased word tokens. `+`, `#` and inner `.` stay attached so that
/// `C++`, `C#` and `Node.js` survive as single tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl TextEncoder for HashEncoder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        Ok(self.encode(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint serving a
/// pretrained sentence-embedding model.
pub struct RemoteEncoder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

impl RemoteEncoder {
    /// Every request is bounded by `timeout`; an expired deadline is `EncodingError::Timeout`.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EncodingError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
            dimension,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError> {
        let mut req = self.client.post(&self.url).json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EncodingError::Status { status: status.as_u16(), body });
        }

        let parsed: EmbeddingResponse = resp.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(EncodingError::Malformed(format!(
                "{} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        let data = order_by_index(parsed.data)?;

        let mut out = Vec::with_capacity(data.len());
        for d in data {
            if d.embedding.len() != self.dimension {
                return Err(EncodingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: d.embedding.len(),
                });
            }
            out.push(d.embedding);
        }
        debug!(count = out.len(), model = %self.model, "remote embeddings received");
        Ok(out)
    }
}

/// Restores input order. Indices must be all absent (response order is kept)
/// or all present and exactly `0..n`.
fn order_by_index(data: Vec<EmbeddingDatum>) -> Result<Vec<EmbeddingDatum>, EncodingError> {
    let n = data.len();
    if data.iter().all(|d| d.index.is_none()) {
        return Ok(data);
    }

    let mut slots: Vec<Option<EmbeddingDatum>> = (0..n).map(|_| None).collect();
    for d in data {
        let i = d
            .index
            .ok_or_else(|| EncodingError::Malformed("embedding index missing on some entries".into()))?;
        match slots.get_mut(i) {
            None => return Err(EncodingError::Malformed(format!("embedding index {i} out of range for {n} inputs"))),
            Some(slot) if slot.is_some() => {
                return Err(EncodingError::Malformed(format!("duplicate embedding index {i}")))
            }
            Some(slot) => *slot = Some(d),
        }
    }
    // n distinct indices in 0..n fill every slot.
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl TextEncoder for RemoteEncoder {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        let mut v = self.request(&[text.to_string()]).await?;
        v.pop().ok_or_else(|| EncodingError::Malformed("empty embedding list".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}
