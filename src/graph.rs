//! Instagram Graph API calls.
//!
//! Thin typed wrappers: each method issues one request and pulls out the
//! one thing the caller needs. Access tokens travel as request parameters and
//! are never logged.

use crate::http::{HttpResponse, Transport, TransportError};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v20.0";

#[derive(Error, Debug)]
pub enum GraphError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Graph API returned {status}: {body}")]
    Api { status: u16, body: Value },
    #[error("Graph API response has no `{field}`: {body}")]
    MissingField { field: &'static str, body: Value },
    #[error("Unexpected Graph API payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaSummary {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
struct Listing<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Clone)]
pub struct GraphClient<'a> {
    transport: &'a dyn Transport,
    base_url: String,
}

impl<'a> GraphClient<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Swap a long-lived token for a fresh one.
    pub fn exchange_token(
        &self,
        app_id: &str,
        app_secret: &str,
        token: &str,
    ) -> Result<String, GraphError> {
        let resp = self.transport.get(
            &self.url("oauth/access_token"),
            &[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app_id),
                ("client_secret", app_secret),
                ("fb_exchange_token", token),
            ],
        )?;
        match resp.str_at("/access_token") {
            Some(t) if !t.is_empty() => Ok(t.to_string()),
            _ if !resp.is_success() => Err(api_error(resp)),
            _ => Err(GraphError::MissingField {
                field: "access_token",
                body: resp.body,
            }),
        }
    }

    /// Unix timestamp at which the token's data access expires.
    pub fn data_access_expiry(&self, token: &str) -> Result<i64, GraphError> {
        let resp = self.transport.get(
            &self.url("debug_token"),
            &[("input_token", token), ("access_token", token)],
        )?;
        if !resp.is_success() {
            return Err(api_error(resp));
        }
        resp.body
            .pointer("/data/data_access_expires_at")
            .and_then(Value::as_i64)
            .ok_or(GraphError::MissingField {
                field: "data.data_access_expires_at",
                body: resp.body,
            })
    }

    pub fn recent_media(
        &self,
        user_id: &str,
        token: &str,
        limit: usize,
    ) -> Result<Vec<MediaSummary>, GraphError> {
        let limit = limit.to_string();
        let resp = self.transport.get(
            &self.url(&format!("{user_id}/media")),
            &[
                ("fields", "id,caption"),
                ("access_token", token),
                ("limit", &limit),
            ],
        )?;
        listing(resp)
    }

    pub fn comments(&self, media_id: &str, token: &str) -> Result<Vec<Comment>, GraphError> {
        let resp = self.transport.get(
            &self.url(&format!("{media_id}/comments")),
            &[("access_token", token)],
        )?;
        listing(resp)
    }

    pub fn reply(&self, comment_id: &str, token: &str, message: &str) -> Result<(), GraphError> {
        let resp = self.transport.post_form(
            &self.url(&format!("{comment_id}/replies")),
            &[("message", message), ("access_token", token)],
        )?;
        if resp.is_success() {
            Ok(())
        } else {
            Err(api_error(resp))
        }
    }

    /// Media container for one carousel child.
    pub fn create_carousel_item(
        &self,
        user_id: &str,
        token: &str,
        image_url: &str,
    ) -> Result<String, GraphError> {
        let resp = self.transport.post_form(
            &self.url(&format!("{user_id}/media")),
            &[
                ("image_url", image_url),
                ("is_carousel_item", "true"),
                ("access_token", token),
            ],
        )?;
        created_id(resp)
    }

    /// Parent `CAROUSEL` container referencing the children.
    pub fn create_carousel(
        &self,
        user_id: &str,
        token: &str,
        children: &[String],
        caption: &str,
    ) -> Result<String, GraphError> {
        let children = children.join(",");
        let resp = self.transport.post_form(
            &self.url(&format!("{user_id}/media")),
            &[
                ("access_token", token),
                ("caption", caption),
                ("media_type", "CAROUSEL"),
                ("children", &children),
            ],
        )?;
        created_id(resp)
    }

    pub fn publish(
        &self,
        user_id: &str,
        token: &str,
        creation_id: &str,
    ) -> Result<String, GraphError> {
        let resp = self.transport.post_form(
            &self.url(&format!("{user_id}/media_publish")),
            &[("creation_id", creation_id), ("access_token", token)],
        )?;
        created_id(resp)
    }
}

fn api_error(resp: HttpResponse) -> GraphError {
    GraphError::Api {
        status: resp.status,
        body: resp.body,
    }
}

/// The Graph API answers creations with `{"id": ...}`; ids may be numeric.
fn created_id(resp: HttpResponse) -> Result<String, GraphError> {
    match resp.body.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ if !resp.is_success() => Err(api_error(resp)),
        _ => Err(GraphError::MissingField {
            field: "id",
            body: resp.body,
        }),
    }
}

fn listing<T: for<'de> Deserialize<'de>>(resp: HttpResponse) -> Result<Vec<T>, GraphError> {
    if !resp.is_success() {
        return Err(api_error(resp));
    }
    let listing: Listing<T> = serde_json::from_value(resp.body)?;
    Ok(listing.data)
}
