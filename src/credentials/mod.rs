//! Credential bundle, versioned storage and token refresh.
//!
//! A [`CredentialBundle`] is the JSON document stored in each secret version.
//! [`CredentialStore`] keeps exactly one live version; [`TokenRefresher`]
//! decides when the access token must be exchanged and drives the rotation.

mod refresh;
mod store;

pub use refresh::{DEFAULT_REFRESH_THRESHOLD_DAYS, TokenRefresher, VerifyOutcome};
pub use store::{
    CredentialStore, FileSecretBackend, RotationReport, SecretBackend, StoreError, VersionInfo,
    VersionState,
};

use crate::graph::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Credential `{0}` is missing")]
pub struct MissingCredential(pub CredentialField);

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Token refresh failed: {0}")]
    Refresh(#[source] GraphError),
    #[error("Token verification failed: {0}")]
    Verification(#[source] GraphError),
    #[error(transparent)]
    Missing(#[from] MissingCredential),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    AccessToken,
    AppId,
    AppSecret,
    InstagramUserId,
    ImgbbToken,
    FreeImageToken,
}

impl CredentialField {
    pub fn key(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::AppId => "app_id",
            Self::AppSecret => "app_secret",
            Self::InstagramUserId => "instagram_user_id",
            Self::ImgbbToken => "imgbb_token",
            Self::FreeImageToken => "free_image_token",
        }
    }
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every credential the publisher may need.
///
/// Fields are optional: a bundle that lacks, say, the imgbb token is still
/// valid when the configured host does not need it. Unknown keys survive a
/// load/rotate cycle through `extra`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imgbb_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_image_token: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CredentialBundle");
        for field in [
            CredentialField::AccessToken,
            CredentialField::AppId,
            CredentialField::AppSecret,
            CredentialField::InstagramUserId,
            CredentialField::ImgbbToken,
            CredentialField::FreeImageToken,
        ] {
            let shown = if self.get(field).is_some() { "<redacted>" } else { "<unset>" };
            s.field(field.key(), &shown);
        }
        s.finish_non_exhaustive()
    }
}

impl CredentialBundle {
    pub fn get(&self, field: CredentialField) -> Option<&str> {
        let value = match field {
            CredentialField::AccessToken => &self.access_token,
            CredentialField::AppId => &self.app_id,
            CredentialField::AppSecret => &self.app_secret,
            CredentialField::InstagramUserId => &self.instagram_user_id,
            CredentialField::ImgbbToken => &self.imgbb_token,
            CredentialField::FreeImageToken => &self.free_image_token,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// The field's value, or an error naming it. Empty strings count as missing.
    pub fn require(&self, field: CredentialField) -> Result<&str, MissingCredential> {
        self.get(field).ok_or(MissingCredential(field))
    }

    pub fn with_access_token(&self, token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()),
            ..self.clone()
        }
    }

    /// Parse a stored payload. Legacy payloads written with single quotes
    /// are accepted by swapping them for double quotes.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str(payload) {
            Ok(bundle) => Ok(bundle),
            Err(e) if payload.contains('\'') => {
                serde_json::from_str(&payload.replace('\'', "\"")).map_err(|_| e)
            }
            Err(e) => Err(e),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_bundle;

    #[test]
    fn require_reports_missing_field() {
        let bundle = CredentialBundle::default();
        let err = bundle.require(CredentialField::AppSecret).unwrap_err();
        assert_eq!(err.to_string(), "Credential `app_secret` is missing");
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let bundle = CredentialBundle {
            access_token: Some(String::new()),
            ..Default::default()
        };
        assert!(bundle.require(CredentialField::AccessToken).is_err());
    }

    #[test]
    fn single_quoted_payload_is_accepted() {
        let bundle =
            CredentialBundle::from_payload("{'access_token': 'abc', 'app_id': '1'}").unwrap();
        assert_eq!(bundle.get(CredentialField::AccessToken), Some("abc"));
        assert_eq!(bundle.get(CredentialField::AppId), Some("1"));
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let bundle = CredentialBundle::from_payload(r#"{"access_token":"a","region":"eu"}"#).unwrap();
        let again = CredentialBundle::from_payload(&bundle.to_payload().unwrap()).unwrap();
        assert_eq!(again.extra.get("region"), Some(&serde_json::json!("eu")));
    }

    #[test]
    fn with_access_token_keeps_other_fields() {
        let rotated = sample_bundle().with_access_token("new");
        assert_eq!(rotated.get(CredentialField::AccessToken), Some("new"));
        assert_eq!(rotated.app_id, sample_bundle().app_id);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let shown = format!("{:?}", sample_bundle());
        assert!(!shown.contains("token-0"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn garbage_payload_is_error() {
        assert!(CredentialBundle::from_payload("not json").is_err());
    }
}
