//! HTTP plumbing shared by every remote call.
//!
//! Remote components talk to a [`Transport`] rather than to `reqwest`
//! directly, so tests can script responses without a network. Bodies are
//! decoded as JSON when possible and kept as a JSON string otherwise.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Status code plus decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// String at a JSON pointer such as `/data/url`.
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }
}

/// A file attached to a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: &'static str,
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn jpeg(field: &'static str, filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            field,
            filename: filename.to_string(),
            mime: "image/jpeg",
            bytes,
        }
    }
}

pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    fn post_multipart(
        &self,
        url: &str,
        query: &[(&str, &str)],
        fields: &[(&str, &str)],
        file: &FilePart,
    ) -> Result<HttpResponse, TransportError>;
}

/// Production transport over a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).query(query).send()?;
        into_response(response)
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let response = self.client.post(url).form(form).send()?;
        into_response(response)
    }

    fn post_multipart(
        &self,
        url: &str,
        query: &[(&str, &str)],
        fields: &[(&str, &str)],
        file: &FilePart,
    ) -> Result<HttpResponse, TransportError> {
        let part = reqwest::blocking::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(file.mime)?;
        let form = fields
            .iter()
            .fold(reqwest::blocking::multipart::Form::new(), |form, (k, v)| {
                form.text(k.to_string(), v.to_string())
            })
            .part(file.field, part);
        let response = self.client.post(url).query(query).multipart(form).send()?;
        into_response(response)
    }
}

fn into_response(response: reqwest::blocking::Response) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let text = response.text()?;
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok(HttpResponse { status, body })
}
