//! Cloudinary media hosting — signed uploads, chunked for large videos.

use async_trait::async_trait;
use postclaw_core::config::CloudinaryConfig;
use postclaw_core::error::{PostClawError, Result};
use postclaw_core::traits::ObjectStore;
use postclaw_core::{MediaKind, UploadedMedia};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// Cloudinary upload client.
pub struct CloudinaryStore {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

/// Fields we read from an upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    public_id: Option<String>,
    duration: Option<f64>,
    error: Option<UploadErrorBody>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn upload_url(&self, kind: MediaKind) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base,
            self.config.cloud_name,
            kind.resource_type()
        )
    }

    /// Signed request fields, sorted by key.
    fn signed_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("folder", self.config.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = sign(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params.push(("signature_algorithm", "sha256".into()));
        params
    }

    fn form(&self, bytes: Vec<u8>, params: &[(&'static str, String)]) -> Form {
        params.iter().fold(
            Form::new().part("file", Part::bytes(bytes).file_name("upload")),
            |form, (key, value)| form.text(*key, value.clone()),
        )
    }

    async fn post(
        &self,
        kind: MediaKind,
        form: Form,
        chunk: Option<ChunkHeaders<'_>>,
    ) -> Result<UploadResponse> {
        let mut request = self.client.post(self.upload_url(kind)).multipart(form);
        if let Some(chunk) = chunk {
            request = request
                .header("X-Unique-Upload-Id", chunk.upload_id)
                .header("Content-Range", chunk.content_range);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PostClawError::Upload(format!("Cloudinary request failed: {e}")))?;
        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PostClawError::Upload(format!("Invalid Cloudinary response: {e}")))?;

        if let Some(error) = body.error {
            return Err(PostClawError::Upload(error.message));
        }
        if !status.is_success() {
            return Err(PostClawError::Upload(format!("Cloudinary HTTP {status}")));
        }
        Ok(body)
    }

    async fn upload_chunked(
        &self,
        bytes: Vec<u8>,
        kind: MediaKind,
        params: &[(&'static str, String)],
    ) -> Result<UploadResponse> {
        let total = bytes.len();
        let upload_id = uuid::Uuid::new_v4().to_string();
        let ranges = chunk_ranges(total, self.config.chunk_size);
        tracing::info!("☁️ Chunked upload {upload_id}: {total} bytes in {} parts", ranges.len());

        let mut last = None;
        for (start, end) in ranges {
            let content_range = format!("bytes {start}-{}/{total}", end - 1);
            let form = self.form(bytes[start..end].to_vec(), params);
            let chunk = ChunkHeaders {
                upload_id: &upload_id,
                content_range: &content_range,
            };
            last = Some(self.post(kind, form, Some(chunk)).await?);
        }
        last.ok_or_else(|| PostClawError::Upload("Empty payload".into()))
    }
}

struct ChunkHeaders<'a> {
    upload_id: &'a str,
    content_range: &'a str,
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload(&self, bytes: Vec<u8>, kind: MediaKind) -> Result<UploadedMedia> {
        let params = self.signed_params(chrono::Utc::now().timestamp());

        let response = if kind == MediaKind::Video && bytes.len() > self.config.chunk_size {
            self.upload_chunked(bytes, kind, &params).await?
        } else {
            let form = self.form(bytes, &params);
            self.post(kind, form, None).await?
        };

        let url = response
            .secure_url
            .ok_or_else(|| PostClawError::Upload("Cloudinary returned no secure_url".into()))?;
        tracing::info!("✅ Cloudinary upload ok: {url}");
        Ok(UploadedMedia {
            url,
            kind,
            public_id: response.public_id,
            duration_secs: response.duration,
        })
    }
}

/// `sha256("k1=v1&k2=v2" + secret)` over the already sorted params, hex.
fn sign(params: &[(&str, String)], secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha256::new();
    hasher.update(format!("{joined}{secret}"));
    format!("{:x}", hasher.finalize())
}

/// Half-open byte ranges covering `total` in steps of `chunk_size`.
fn chunk_ranges(total: usize, chunk_size: usize) -> Vec<(usize, usize)> {
    let step = chunk_size.max(1);
    (0..total)
        .step_by(step)
        .map(|start| (start, (start + step).min(total)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CloudinaryStore {
        CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            ..CloudinaryConfig::default()
        })
    }

    #[test]
    fn test_signature_is_sha256_of_sorted_params() {
        let params = vec![
            ("folder", "telegram_instagram".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];
        let expected = {
            let mut h = Sha256::new();
            h.update("folder=telegram_instagram&timestamp=1700000000secret");
            format!("{:x}", h.finalize())
        };
        assert_eq!(sign(&params, "secret"), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_signed_params_carry_key_but_do_not_sign_it() {
        let params = store().signed_params(1700000000);
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["folder", "timestamp", "api_key", "signature", "signature_algorithm"]
        );
        let signature = &params[3].1;
        assert_eq!(*signature, sign(&params[..2], "secret"));
    }

    #[test]
    fn test_upload_url_by_kind() {
        let s = store();
        assert_eq!(
            s.upload_url(MediaKind::Video),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        assert_eq!(
            s.upload_url(MediaKind::Image),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_chunk_ranges_cover_payload() {
        assert_eq!(chunk_ranges(10, 4), vec![(0, 4), (4, 8), (8, 10)]);
        assert_eq!(chunk_ranges(8, 4), vec![(0, 4), (4, 8)]);
        assert!(chunk_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_response_parsing() {
        let ok: UploadResponse = serde_json::from_str(
            r#"{"secure_url":"https://res.cloudinary.com/x.mp4","public_id":"telegram_instagram/x","duration":12.4}"#,
        )
        .unwrap();
        assert_eq!(ok.duration, Some(12.4));
        assert!(ok.error.is_none());

        let err: UploadResponse =
            serde_json::from_str(r#"{"error":{"message":"Invalid Signature"}}"#).unwrap();
        assert_eq!(err.error.unwrap().message, "Invalid Signature");
    }
}
