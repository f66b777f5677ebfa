//! Embedding encoders.
//!
//! The comparison core only needs text → vector with order preserved and
//! deterministic output for a fixed model. Each document is encoded with a
//! single batched call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::{DiffError, DiffResult};

/// Fixed-length embedding of one paragraph.
pub type Embedding = Vec<f32>;

/// Maps a batch of texts to a batch of vectors, same length, same order.
pub trait Encoder: Send + Sync {
    fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>>;
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
        (**self).encode(texts)
    }
}

impl<E: Encoder + ?Sized> Encoder for &E {
    fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
        (**self).encode(texts)
    }
}

/// Encode one document's texts and check the batch shape.
pub(crate) fn encode_checked<E: Encoder + ?Sized>(
    encoder: &E,
    texts: &[&str],
) -> DiffResult<Vec<Embedding>> {
    let vectors = encoder.encode(texts)?;
    if vectors.len() != texts.len() {
        return Err(DiffError::encoding(format!(
            "encoder returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        )));
    }
    if let Some(first) = vectors.first() {
        if let Some(bad) = vectors.iter().position(|v| v.len() != first.len()) {
            return Err(DiffError::encoding(format!(
                "vector {} has {} dimensions, expected {}",
                bad,
                vectors[bad].len(),
                first.len()
            )));
        }
    }
    Ok(vectors)
}

// ============ HASHING ENCODER ============

/// Offline bag-of-words encoder using the hashing trick.
///
/// Lowercased words and adjacent word pairs are hashed into a fixed number of
/// signed buckets and the result is L2-normalized. Output depends only on
/// the text and the dimension count.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimensions: usize,
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl HashingEncoder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimensions];
        let words: Vec<String> = text.unicode_words().map(str::to_lowercase).collect();

        for word in &words {
            self.add_feature(&mut vector, word.as_bytes());
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, bigram.as_bytes());
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8]) {
        let hash = xxh3_64(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }
}

impl Encoder for HashingEncoder {
    fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

// ============ HTTP ENCODER ============

/// Blocking client for OpenAI-compatible `/embeddings` endpoints.
///
/// Every call is attempted once; the timeout bounds the whole request.
pub struct HttpEncoder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEncoder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl HttpEncoder {
    /// `base_url` is the API root, e.g. `http://localhost:8080/v1`.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Encoder for HttpEncoder {
    fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key.trim()));
        }

        tracing::debug!(endpoint = %self.endpoint, batch = texts.len(), "requesting embeddings");
        let response = request
            .send_json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .map_err(|e| DiffError::encoding(format!("{}: {}", self.endpoint, e)))?;

        let body: EmbeddingResponse = response
            .into_json()
            .map_err(|e| DiffError::encoding(format!("malformed embedding response: {}", e)))?;

        parse_response(body, texts.len())
    }
}

/// Order response items by `index`. Indices must cover `0..expected` exactly
/// once; items without one take their position in `data`.
fn parse_response(body: EmbeddingResponse, expected: usize) -> DiffResult<Vec<Embedding>> {
    if body.data.len() != expected {
        return Err(DiffError::encoding(format!(
            "embedding response has {} items for {} texts",
            body.data.len(),
            expected
        )));
    }

    let mut slots: Vec<Option<Embedding>> = vec![None; expected];
    for (position, item) in body.data.into_iter().enumerate() {
        let index = item.index.unwrap_or(position);
        match slots.get_mut(index) {
            Some(slot) if slot.is_none() => *slot = Some(item.embedding),
            Some(_) => {
                return Err(DiffError::encoding(format!(
                    "embedding response repeats index {}",
                    index
                )))
            }
            None => {
                return Err(DiffError::encoding(format!(
                    "embedding response index {} out of range for {} texts",
                    index, expected
                )))
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    struct ShortEncoder;

    impl Encoder for ShortEncoder {
        fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    struct RaggedEncoder;

    impl Encoder for RaggedEncoder {
        fn encode(&self, texts: &[&str]) -> DiffResult<Vec<Embedding>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![1.0; i + 1])
                .collect())
        }
    }

    #[test]
    fn hashing_encoder_is_deterministic() {
        let encoder = HashingEncoder::default();
        let first = encoder.encode(&["Limit of liability $1,000,000"]).unwrap();
        let second = encoder.encode(&["Limit of liability $1,000,000"]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].len(), 512);
    }

    #[test]
    fn hashing_encoder_ranks_related_text_higher() {
        let encoder = HashingEncoder::default();
        let vectors = encoder
            .encode(&[
                "The insurer shall pay all sums the insured becomes legally obligated to pay",
                "The insurer shall pay all sums the insured becomes legally obligated to pay as damages",
                "Flood and earthquake are excluded from coverage",
            ])
            .unwrap();
        let related = cosine_similarity(&vectors[0], &vectors[1]);
        let unrelated = cosine_similarity(&vectors[0], &vectors[2]);
        assert!(related > unrelated, "{} <= {}", related, unrelated);
        assert!(related > 0.8);
    }

    #[test]
    fn hashing_encoder_empty_text_is_zero_vector() {
        let vectors = HashingEncoder::new(8).encode(&["", "   "]).unwrap();
        assert!(vectors.iter().all(|v| v.iter().all(|x| *x == 0.0)));
    }

    #[test]
    fn encode_checked_rejects_short_batches() {
        let err = encode_checked(&ShortEncoder, &["a", "b"]).unwrap_err();
        assert!(matches!(err, DiffError::Encoding { .. }));
    }

    #[test]
    fn encode_checked_rejects_ragged_batches() {
        let err = encode_checked(&RaggedEncoder, &["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("dimensions"));
    }

    #[test]
    fn http_encoder_builds_embeddings_endpoint() {
        let encoder = HttpEncoder::new(
            "http://localhost:8080/v1/",
            "all-MiniLM-L6-v2",
            Some("  ".to_string()),
            Duration::from_secs(5),
        );
        assert_eq!(encoder.endpoint(), "http://localhost:8080/v1/embeddings");
        assert!(format!("{:?}", encoder).contains("has_api_key: false"));
    }

    #[test]
    fn http_encoder_skips_request_for_empty_batch() {
        let encoder = HttpEncoder::new("http://127.0.0.1:9", "m", None, Duration::from_millis(10));
        assert!(encoder.encode(&[]).unwrap().is_empty());
    }

    fn parse(json: &str, expected: usize) -> DiffResult<Vec<Embedding>> {
        parse_response(serde_json::from_str(json).unwrap(), expected)
    }

    #[test]
    fn response_items_are_ordered_by_index() {
        let vectors = parse(
            r#"{"data": [{"index": 1, "embedding": [0.0, 1.0]}, {"index": 0, "embedding": [1.0, 0.0]}]}"#,
            2,
        )
        .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn response_without_indices_keeps_position() {
        let vectors = parse(r#"{"data": [{"embedding": [1.0]}, {"embedding": [2.0]}]}"#, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let err = parse(
            r#"{"data": [{"index": 0, "embedding": [1.0]}, {"index": 0, "embedding": [2.0]}]}"#,
            2,
        )
        .unwrap_err();
        assert!(err.to_string().contains("repeats index 0"));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let err = parse(
            r#"{"data": [{"index": 0, "embedding": [1.0]}, {"index": 5, "embedding": [2.0]}]}"#,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::Encoding { .. }));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn short_response_is_rejected() {
        let err = parse(r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#, 2).unwrap_err();
        assert!(err.to_string().contains("1 items for 2 texts"));
    }

    /// Answers a single HTTP request with a fixed status line and body.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        use std::io::{BufRead, BufReader, Read, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();
            let mut stream = reader.into_inner();
            write!(
                stream,
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        });
        format!("http://{}/v1", address)
    }

    #[test]
    fn http_encoder_reads_embeddings() {
        let base = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"data": [{"index": 1, "embedding": [0.0, 1.0]}, {"index": 0, "embedding": [1.0, 0.0]}]}"#,
        );
        let encoder = HttpEncoder::new(&base, "m", None, Duration::from_secs(5));
        let vectors = encode_checked(&encoder, &["first", "second"]).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn http_error_status_is_an_encoding_error() {
        let base = serve_once("HTTP/1.1 500 Internal Server Error", r#"{"error": "boom"}"#);
        let encoder = HttpEncoder::new(&base, "m", None, Duration::from_secs(5));
        let err = encoder.encode(&["text"]).unwrap_err();
        assert!(matches!(err, DiffError::Encoding { .. }));
    }

    #[test]
    fn malformed_body_is_an_encoding_error() {
        let base = serve_once("HTTP/1.1 200 OK", "not json");
        let encoder = HttpEncoder::new(&base, "m", None, Duration::from_secs(5));
        let err = encoder.encode(&["text"]).unwrap_err();
        assert!(err.to_string().contains("malformed embedding response"));
    }
}
