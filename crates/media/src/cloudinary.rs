//! Cloudinary upload API adapter.

use std::fmt;

use async_trait::async_trait;
use bookworm_kernel::settings::MediaSettings;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{public_id_from_url, MediaError, MediaHost};

/// Signed client for the `image/upload` and `image/destroy` endpoints.
pub struct CloudinaryHost {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryHost {
    pub fn from_settings(settings: &MediaSettings) -> Result<Self, MediaError> {
        let cloud_name = required(&settings.cloud_name, "media.cloud_name")?;
        let api_key = required(&settings.api_key, "media.api_key")?;
        let api_secret = required(&settings.api_secret, "media.api_secret")?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
            folder: settings.folder.clone().filter(|folder| !folder.is_empty()),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/image/{}", self.api_base, self.cloud_name, action)
    }

    fn sign(&self, params: &[(&'static str, String)]) -> String {
        let digest = Sha256::digest(string_to_sign(params, &self.api_secret).as_bytes());
        hex::encode(digest)
    }

    /// POST `signed` params plus credentials and signature to `action`.
    async fn post_signed(
        &self,
        action: &str,
        mut signed: Vec<(&'static str, String)>,
        unsigned: Vec<(&'static str, String)>,
    ) -> Result<reqwest::Response, MediaError> {
        signed.push(("timestamp", chrono::Utc::now().timestamp().to_string()));
        let signature = self.sign(&signed);

        let mut form = signed;
        form.extend(unsigned);
        form.push(("api_key", self.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response = self
            .client
            .post(self.endpoint(action))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error.message,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn asset_id(&self, url: &str) -> Result<String, MediaError> {
        let id = public_id_from_url(url).ok_or_else(|| MediaError::UnknownAsset(url.to_string()))?;
        Ok(match &self.folder {
            Some(folder) => format!("{}/{}", folder, id),
            None => id.to_string(),
        })
    }
}

#[async_trait]
impl MediaHost for CloudinaryHost {
    async fn upload(&self, payload: &str) -> Result<String, MediaError> {
        let mut signed = Vec::new();
        if let Some(folder) = &self.folder {
            signed.push(("folder", folder.clone()));
        }

        let response = self
            .post_signed("upload", signed, vec![("file", payload.to_string())])
            .await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|err| MediaError::InvalidResponse(err.to_string()))?;

        tracing::info!(url = %body.secure_url, "image uploaded to cloudinary");
        Ok(body.secure_url)
    }

    fn hosts(&self, url: &str) -> bool {
        url.contains("cloudinary")
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let public_id = self.asset_id(url)?;

        let response = self
            .post_signed("destroy", vec![("public_id", public_id.clone())], Vec::new())
            .await?;
        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|err| MediaError::InvalidResponse(err.to_string()))?;

        match body.result.as_str() {
            "ok" => {
                tracing::info!(%public_id, "image deleted from cloudinary");
                Ok(())
            }
            "not found" => {
                tracing::warn!(%public_id, "image already absent from cloudinary");
                Ok(())
            }
            other => Err(MediaError::InvalidResponse(format!(
                "destroy returned result '{}'",
                other
            ))),
        }
    }
}

impl fmt::Debug for CloudinaryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryHost")
            .field("api_base", &self.api_base)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .finish()
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, MediaError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(MediaError::Misconfigured(key))
}

/// Parameters sorted by name as `k=v` pairs joined by `&`, then the secret.
fn string_to_sign(params: &[(&'static str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by_key(|(key, _)| *key);

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}{}", joined, api_secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookworm_kernel::settings::MediaProvider;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host_for(server: &MockServer, folder: Option<&str>) -> CloudinaryHost {
        CloudinaryHost::from_settings(&MediaSettings {
            provider: MediaProvider::Cloudinary,
            cloud_name: Some("demo".to_string()),
            api_key: Some("key-123".to_string()),
            api_secret: Some("shh".to_string()),
            api_base: format!("{}/", server.uri()),
            folder: folder.map(str::to_string),
        })
        .unwrap()
    }

    #[test]
    fn string_to_sign_sorts_parameters() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
        ];
        assert_eq!(
            string_to_sign(&params, "abcd"),
            "public_id=sample_image&timestamp=1315060510abcd"
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let host = CloudinaryHost::from_settings(&MediaSettings {
            provider: MediaProvider::Cloudinary,
            cloud_name: Some("demo".to_string()),
            api_key: Some("key".to_string()),
            api_secret: Some("very-secret".to_string()),
            ..MediaSettings::default()
        })
        .unwrap();
        assert!(!format!("{host:?}").contains("very-secret"));
    }

    #[tokio::test]
    async fn upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .and(body_string_contains("api_key=key-123"))
            .and(body_string_contains("signature="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "abc123",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/abc123.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = host_for(&server, None)
            .upload("data:image/png;base64,iVBORw0KGgo=")
            .await
            .unwrap();

        assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/v1/abc123.png");
    }

    #[tokio::test]
    async fn upload_surfaces_rejection_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"error": {"message": "Invalid image file"}})),
            )
            .mount(&server)
            .await;

        let err = host_for(&server, None).upload("garbage").await.unwrap_err();

        match err {
            MediaError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid image file");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_sends_public_id_with_folder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/destroy"))
            .and(body_string_contains("public_id=books%2Fabc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        host_for(&server, Some("books"))
            .delete("https://res.cloudinary.com/demo/image/upload/v1/books/abc123.png")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_of_missing_asset_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/destroy"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"result": "not found"})),
            )
            .mount(&server)
            .await;

        let result = host_for(&server, None)
            .delete("https://res.cloudinary.com/demo/image/upload/v1/abc123.png")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delete_fails_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/destroy"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = host_for(&server, None)
            .delete("https://res.cloudinary.com/demo/image/upload/v1/abc123.png")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Rejected { status: 503, .. }));
    }

    #[test]
    fn hosts_only_cloudinary_urls() {
        let host = CloudinaryHost::from_settings(&MediaSettings {
            provider: MediaProvider::Cloudinary,
            cloud_name: Some("demo".to_string()),
            api_key: Some("key".to_string()),
            api_secret: Some("secret".to_string()),
            ..MediaSettings::default()
        })
        .unwrap();

        assert!(host.hosts("https://res.cloudinary.com/demo/image/upload/abc.png"));
        assert!(!host.hosts("https://example.com/abc.png"));
    }
}
