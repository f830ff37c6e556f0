//! Shared test doubles for the publisher test suite.
//!
//! Provides a scripted HTTP transport, an in-memory secret backend with
//! failure injection, a sleeper that records instead of blocking, and a
//! complete credential bundle.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let transport = MockTransport::new();
//! transport.respond("GET", "https://graph.test/debug_token", HttpResponse::ok(json!({})));
//! let graph = GraphClient::new(&transport, "https://graph.test");
//! // ...
//! assert_eq!(transport.count("GET", "https://graph.test/debug_token"), 1);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::credentials::{CredentialBundle, SecretBackend, StoreError, VersionInfo, VersionState};
use crate::http::{FilePart, HttpResponse, Transport, TransportError};
use crate::retry::Sleeper;

// =========================================================================
// Fixtures
// =========================================================================

/// A bundle with every field set.
pub fn sample_bundle() -> CredentialBundle {
    CredentialBundle {
        access_token: Some("token-0".into()),
        app_id: Some("app-1".into()),
        app_secret: Some("shh".into()),
        instagram_user_id: Some("42".into()),
        imgbb_token: Some("imgbb-key".into()),
        free_image_token: Some("free-key".into()),
        extra: Default::default(),
    }
}

// =========================================================================
// Transport
// =========================================================================

/// One request as the mock saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    /// Query, form and multipart text fields, in order.
    pub params: Vec<(String, String)>,
    /// `(field, filename, size)` of an attached file.
    pub file: Option<(String, String, usize)>,
}

impl RecordedCall {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// `None` fails the request at the transport level.
type Scripted = Option<HttpResponse>;

/// Transport answering from per-route scripts keyed by method and URL.
///
/// A route's responses are consumed in order and the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

/// A real `reqwest` failure produced offline: the URL does not parse, so
/// the request fails while being built.
pub fn request_error() -> TransportError {
    let err = reqwest::blocking::Client::new()
        .get("http://[unparseable")
        .send()
        .expect_err("malformed URL cannot be sent");
    TransportError::Request(err)
}

fn route_key(method: &str, url: &str) -> String {
    format!("{method} {url}")
}

fn to_params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `response` on this route.
    pub fn respond(&self, method: &str, url: &str, response: HttpResponse) {
        self.script(method, url, vec![Some(response)]);
    }

    /// Answer these in order; the last one repeats.
    pub fn respond_sequence(&self, method: &str, url: &str, responses: Vec<HttpResponse>) {
        self.script(method, url, responses.into_iter().map(Some).collect());
    }

    /// Fail every request on this route at the transport level.
    pub fn fail(&self, method: &str, url: &str) {
        self.script(method, url, vec![None]);
    }

    fn script(&self, method: &str, url: &str, responses: Vec<Scripted>) {
        self.routes
            .lock()
            .unwrap()
            .insert(route_key(method, url), responses.into());
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    /// Calls whose URL ends with `suffix`.
    pub fn calls_to(&self, suffix: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.url.ends_with(suffix))
            .collect()
    }

    fn answer(&self, call: RecordedCall) -> Result<HttpResponse, TransportError> {
        let key = route_key(call.method, &call.url);
        self.calls.lock().unwrap().push(call);
        let mut routes = self.routes.lock().unwrap();
        let scripted = match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        match scripted {
            Some(Some(resp)) => Ok(resp),
            Some(None) => Err(request_error()),
            None => Ok(HttpResponse::new(404, json!({"error": "unscripted route"}))),
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.answer(RecordedCall {
            method: "GET",
            url: url.to_string(),
            params: to_params(query),
            file: None,
        })
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        self.answer(RecordedCall {
            method: "POST",
            url: url.to_string(),
            params: to_params(form),
            file: None,
        })
    }

    fn post_multipart(
        &self,
        url: &str,
        query: &[(&str, &str)],
        fields: &[(&str, &str)],
        file: &FilePart,
    ) -> Result<HttpResponse, TransportError> {
        let mut params = to_params(query);
        params.extend(to_params(fields));
        self.answer(RecordedCall {
            method: "POST",
            url: url.to_string(),
            params,
            file: Some((
                file.field.to_string(),
                file.filename.clone(),
                file.bytes.len(),
            )),
        })
    }
}

// =========================================================================
// Secret backend
// =========================================================================

/// In-memory secret versions; destruction of chosen ids can be made to fail.
#[derive(Default)]
pub struct MemorySecretBackend {
    versions: Mutex<Vec<(VersionInfo, Option<String>)>>,
    failing: Mutex<HashSet<u64>>,
}

impl MemorySecretBackend {
    pub fn fail_destroy(&self, id: u64) {
        self.failing.lock().unwrap().insert(id);
    }

    pub fn active_ids(&self) -> Vec<u64> {
        self.versions
            .lock()
            .unwrap()
            .iter()
            .filter(|(info, _)| info.is_active())
            .map(|(info, _)| info.id)
            .collect()
    }
}

impl SecretBackend for MemorySecretBackend {
    fn add_version(&self, payload: &str) -> Result<u64, StoreError> {
        let mut versions = self.versions.lock().unwrap();
        let id = versions.len() as u64 + 1;
        versions.push((
            VersionInfo {
                id,
                state: VersionState::Enabled,
                created_at: Utc::now(),
            },
            Some(payload.to_string()),
        ));
        Ok(id)
    }

    fn list_versions(&self) -> Result<Vec<VersionInfo>, StoreError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .map(|(info, _)| info.clone())
            .collect())
    }

    fn access_version(&self, id: u64) -> Result<String, StoreError> {
        let versions = self.versions.lock().unwrap();
        let (_, payload) = versions
            .iter()
            .find(|(info, _)| info.id == id)
            .ok_or(StoreError::VersionNotFound(id))?;
        payload.clone().ok_or(StoreError::VersionDestroyed(id))
    }

    fn destroy_version(&self, id: u64) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(&id) {
            return Err(StoreError::Backend(format!("permission denied on {id}")));
        }
        let mut versions = self.versions.lock().unwrap();
        let entry = versions
            .iter_mut()
            .find(|(info, _)| info.id == id)
            .ok_or(StoreError::VersionNotFound(id))?;
        entry.0.state = VersionState::Destroyed;
        entry.1 = None;
        Ok(())
    }
}

// =========================================================================
// Sleeper
// =========================================================================

#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
