//! Public image hosting.
//!
//! The Graph API only accepts carousel children by URL, so each rendered
//! image is uploaded to a public host first. Two hosts are supported:
//!
//! | Host | Endpoint | File field | Retries |
//! |---|---|---|---|
//! | imgbb | `api.imgbb.com/1/upload?key&expiration` | `image` | policy (3 × `2^n` s) |
//! | freeimage | `freeimage.host/api/1/upload` | `source` | none |

use crate::credentials::{CredentialBundle, CredentialField, MissingCredential};
use crate::http::{FilePart, HttpResponse, Transport, TransportError};
use crate::imaging::{ImagingError, Quality, encode_jpeg};
use crate::retry::{RetryPolicy, Sleeper};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

pub const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";
pub const FREEIMAGE_UPLOAD_URL: &str = "https://freeimage.host/api/1/upload";

#[derive(Error, Debug)]
pub enum HostingError {
    #[error(transparent)]
    MissingCredential(#[from] MissingCredential),
    #[error("Could not encode image: {0}")]
    Encode(#[from] ImagingError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Upload returned HTTP {status}: {body}")]
    Status { status: u16, body: Value },
    #[error("Upload rejected: {0}")]
    Rejected(String),
    #[error("Upload response has no URL: {0}")]
    MissingUrl(Value),
    #[error("Upload failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

pub trait ImageHost {
    fn name(&self) -> &'static str;

    /// Upload `image` and return its public URL.
    fn upload(
        &self,
        image: &RgbImage,
        filename: &str,
        creds: &CredentialBundle,
    ) -> Result<String, HostingError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostProvider {
    Imgbb,
    #[default]
    FreeImage,
}

impl HostProvider {
    pub fn credential(self) -> CredentialField {
        match self {
            Self::Imgbb => CredentialField::ImgbbToken,
            Self::FreeImage => CredentialField::FreeImageToken,
        }
    }
}

impl fmt::Display for HostProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Imgbb => "imgbb",
            Self::FreeImage => "freeimage",
        })
    }
}

fn status_error(resp: HttpResponse) -> HostingError {
    HostingError::Status {
        status: resp.status,
        body: resp.body,
    }
}

// =========================================================================
// imgbb
// =========================================================================

pub struct ImgbbHost<'a> {
    transport: &'a dyn Transport,
    sleeper: &'a dyn Sleeper,
    pub policy: RetryPolicy,
    pub upload_url: String,
    /// Seconds before imgbb deletes the upload.
    pub expiration: u32,
    pub quality: Quality,
}

impl<'a> ImgbbHost<'a> {
    pub fn new(transport: &'a dyn Transport, sleeper: &'a dyn Sleeper, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            upload_url: IMGBB_UPLOAD_URL.to_string(),
            expiration: 60,
            quality: Quality::default(),
        }
    }

    /// One upload attempt.
    pub fn try_upload(&self, jpeg: &[u8], filename: &str, key: &str) -> Result<String, HostingError> {
        let expiration = self.expiration.to_string();
        let resp = self.transport.post_multipart(
            &self.upload_url,
            &[("key", key), ("expiration", &expiration)],
            &[],
            &FilePart::jpeg("image", filename, jpeg.to_vec()),
        )?;
        if !resp.is_success() {
            return Err(status_error(resp));
        }
        match resp.str_at("/data/url") {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(HostingError::MissingUrl(resp.body)),
        }
    }

    /// Every attempt under the policy; `None` once they are exhausted.
    pub fn upload_with_retry(&self, jpeg: &[u8], filename: &str, key: &str) -> Option<String> {
        self.policy.run("imgbb upload", self.sleeper, |_| {
            self.try_upload(jpeg, filename, key)
        })
    }
}

impl ImageHost for ImgbbHost<'_> {
    fn name(&self) -> &'static str {
        "imgbb"
    }

    fn upload(
        &self,
        image: &RgbImage,
        filename: &str,
        creds: &CredentialBundle,
    ) -> Result<String, HostingError> {
        let key = creds.require(CredentialField::ImgbbToken)?;
        let jpeg = encode_jpeg(image, self.quality)?;
        self.upload_with_retry(&jpeg, filename, key)
            .ok_or(HostingError::Exhausted {
                attempts: self.policy.max_attempts(),
            })
    }
}

// =========================================================================
// freeimage.host
// =========================================================================

pub struct FreeImageHost<'a> {
    transport: &'a dyn Transport,
    pub upload_url: String,
    pub quality: Quality,
}

impl<'a> FreeImageHost<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self {
            transport,
            upload_url: FREEIMAGE_UPLOAD_URL.to_string(),
            quality: Quality::default(),
        }
    }
}

impl ImageHost for FreeImageHost<'_> {
    fn name(&self) -> &'static str {
        "freeimage"
    }

    fn upload(
        &self,
        image: &RgbImage,
        filename: &str,
        creds: &CredentialBundle,
    ) -> Result<String, HostingError> {
        let key = creds.require(CredentialField::FreeImageToken)?;
        let jpeg = encode_jpeg(image, self.quality)?;
        let resp = self.transport.post_multipart(
            &self.upload_url,
            &[],
            &[("key", key), ("action", "upload"), ("format", "json")],
            &FilePart::jpeg("source", filename, jpeg),
        )?;
        if resp.status != 200 {
            return Err(status_error(resp));
        }
        if resp.body.get("status_code").and_then(Value::as_u64) != Some(200) {
            let reason = resp.str_at("/status_txt").unwrap_or("unknown error");
            return Err(HostingError::Rejected(reason.to_string()));
        }
        match resp.str_at("/image/display_url") {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(HostingError::MissingUrl(resp.body)),
        }
    }
}

/// Build the configured host.
pub fn build_host<'a>(
    provider: HostProvider,
    transport: &'a dyn Transport,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
    quality: Quality,
    imgbb_expiration: u32,
) -> Box<dyn ImageHost + 'a> {
    match provider {
        HostProvider::Imgbb => {
            let mut host = ImgbbHost::new(transport, sleeper, policy);
            host.quality = quality;
            host.expiration = imgbb_expiration;
            Box::new(host)
        }
        HostProvider::FreeImage => {
            let mut host = FreeImageHost::new(transport);
            host.quality = quality;
            Box::new(host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockTransport, RecordingSleeper, sample_bundle};
    use image::Rgb;
    use serde_json::json;
    use std::time::Duration;

    fn image() -> RgbImage {
        RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]))
    }

    fn imgbb<'a>(transport: &'a MockTransport, sleeper: &'a RecordingSleeper) -> ImgbbHost<'a> {
        ImgbbHost::new(
            transport,
            sleeper,
            RetryPolicy::exponential(3, Duration::from_secs(1)),
        )
    }

    // =========================================================================
    // imgbb
    // =========================================================================

    #[test]
    fn imgbb_fail_fail_succeed_returns_third_url() {
        let transport = MockTransport::new();
        transport.respond_sequence(
            "POST",
            IMGBB_UPLOAD_URL,
            vec![
                HttpResponse::new(500, json!({"error": "busy"})),
                HttpResponse::new(503, json!({"error": "busy"})),
                HttpResponse::ok(json!({"data": {"url": "https://i.ibb.co/3.jpg"}})),
            ],
        );
        let sleeper = RecordingSleeper::default();
        let url = imgbb(&transport, &sleeper)
            .upload(&image(), "sudoku_puzzle.jpg", &sample_bundle())
            .unwrap();

        assert_eq!(url, "https://i.ibb.co/3.jpg");
        assert_eq!(transport.count("POST", IMGBB_UPLOAD_URL), 3);
        assert_eq!(
            sleeper.slept(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn imgbb_always_failing_gives_up_after_three_attempts() {
        let transport = MockTransport::new();
        transport.fail("POST", IMGBB_UPLOAD_URL);
        let sleeper = RecordingSleeper::default();
        let host = imgbb(&transport, &sleeper);

        let jpeg = encode_jpeg(&image(), Quality::default()).unwrap();
        assert_eq!(host.upload_with_retry(&jpeg, "a.jpg", "k"), None);
        assert_eq!(transport.count("POST", IMGBB_UPLOAD_URL), 3);

        assert!(matches!(
            host.upload(&image(), "a.jpg", &sample_bundle()),
            Err(HostingError::Exhausted { attempts: 3 })
        ));
    }

    #[test]
    fn imgbb_sends_key_expiration_and_image_field() {
        let transport = MockTransport::new();
        transport.respond(
            "POST",
            IMGBB_UPLOAD_URL,
            HttpResponse::ok(json!({"data": {"url": "https://i.ibb.co/x.jpg"}})),
        );
        let sleeper = RecordingSleeper::default();
        imgbb(&transport, &sleeper)
            .upload(&image(), "sudoku_solution.jpg", &sample_bundle())
            .unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.param("key"), Some("imgbb-key"));
        assert_eq!(call.param("expiration"), Some("60"));
        let (field, filename, size) = call.file.clone().unwrap();
        assert_eq!(field, "image");
        assert_eq!(filename, "sudoku_solution.jpg");
        assert!(size > 0);
    }

    #[test]
    fn imgbb_missing_url_is_retried() {
        let transport = MockTransport::new();
        transport.respond_sequence(
            "POST",
            IMGBB_UPLOAD_URL,
            vec![
                HttpResponse::ok(json!({"data": {}})),
                HttpResponse::ok(json!({"data": {"url": "https://i.ibb.co/2.jpg"}})),
            ],
        );
        let sleeper = RecordingSleeper::default();
        let url = imgbb(&transport, &sleeper)
            .upload(&image(), "a.jpg", &sample_bundle())
            .unwrap();
        assert_eq!(url, "https://i.ibb.co/2.jpg");
        assert_eq!(sleeper.slept(), vec![Duration::from_secs(1)]);
    }

    #[test]
    fn imgbb_without_token_makes_no_request() {
        let transport = MockTransport::new();
        let sleeper = RecordingSleeper::default();
        let creds = CredentialBundle {
            imgbb_token: None,
            ..sample_bundle()
        };
        assert!(matches!(
            imgbb(&transport, &sleeper).upload(&image(), "a.jpg", &creds),
            Err(HostingError::MissingCredential(_))
        ));
        assert!(transport.calls().is_empty());
    }

    // =========================================================================
    // freeimage
    // =========================================================================

    #[test]
    fn freeimage_returns_display_url() {
        let transport = MockTransport::new();
        transport.respond(
            "POST",
            FREEIMAGE_UPLOAD_URL,
            HttpResponse::ok(json!({
                "status_code": 200,
                "image": {"display_url": "https://iili.io/abc.jpg"}
            })),
        );
        let url = FreeImageHost::new(&transport)
            .upload(&image(), "sudoku_puzzle.jpg", &sample_bundle())
            .unwrap();
        assert_eq!(url, "https://iili.io/abc.jpg");

        let call = &transport.calls()[0];
        assert_eq!(call.param("key"), Some("free-key"));
        assert_eq!(call.param("action"), Some("upload"));
        assert_eq!(call.param("format"), Some("json"));
        assert_eq!(call.file.as_ref().unwrap().0, "source");
    }

    #[test]
    fn freeimage_body_status_is_checked() {
        let transport = MockTransport::new();
        transport.respond(
            "POST",
            FREEIMAGE_UPLOAD_URL,
            HttpResponse::ok(json!({"status_code": 400, "status_txt": "Bad key"})),
        );
        let err = FreeImageHost::new(&transport)
            .upload(&image(), "a.jpg", &sample_bundle())
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload rejected: Bad key");
    }

    #[test]
    fn freeimage_http_error_is_single_attempt() {
        let transport = MockTransport::new();
        transport.respond(
            "POST",
            FREEIMAGE_UPLOAD_URL,
            HttpResponse::new(502, json!("Bad Gateway")),
        );
        assert!(matches!(
            FreeImageHost::new(&transport).upload(&image(), "a.jpg", &sample_bundle()),
            Err(HostingError::Status { status: 502, .. })
        ));
        assert_eq!(transport.count("POST", FREEIMAGE_UPLOAD_URL), 1);
    }

    #[test]
    fn provider_picks_host_and_credential() {
        let transport = MockTransport::new();
        let sleeper = RecordingSleeper::default();
        for (provider, name) in [
            (HostProvider::Imgbb, "imgbb"),
            (HostProvider::FreeImage, "freeimage"),
        ] {
            let host = build_host(
                provider,
                &transport,
                &sleeper,
                RetryPolicy::once(),
                Quality::default(),
                60,
            );
            assert_eq!(host.name(), name);
            assert_eq!(provider.to_string(), name);
        }
        assert_eq!(HostProvider::default(), HostProvider::FreeImage);
        assert_eq!(HostProvider::Imgbb.credential(), CredentialField::ImgbbToken);
    }
}
