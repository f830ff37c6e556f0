use super::{CredentialBundle, CredentialError, CredentialField, CredentialStore, RotationReport};
use crate::graph::GraphClient;
use chrono::{DateTime, TimeDelta, Utc};

/// Default minimum remaining token lifetime.
pub const DEFAULT_REFRESH_THRESHOLD_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The token outlives the threshold; nothing was written.
    Fresh { expires_at: DateTime<Utc> },
    Rotated(RotationReport),
}

pub struct TokenRefresher<'a> {
    graph: GraphClient<'a>,
    threshold: TimeDelta,
}

impl<'a> TokenRefresher<'a> {
    pub fn new(graph: GraphClient<'a>, threshold: TimeDelta) -> Self {
        Self { graph, threshold }
    }

    /// Exchange the bundle's token for a fresh long-lived one.
    pub fn refresh(&self, bundle: &CredentialBundle) -> Result<String, CredentialError> {
        let app_id = bundle.require(CredentialField::AppId)?;
        let app_secret = bundle.require(CredentialField::AppSecret)?;
        let token = bundle.require(CredentialField::AccessToken)?;
        self.graph
            .exchange_token(app_id, app_secret, token)
            .map_err(CredentialError::Refresh)
    }

    /// When the token's data access runs out.
    pub fn expiry(&self, bundle: &CredentialBundle) -> Result<DateTime<Utc>, CredentialError> {
        let token = bundle.require(CredentialField::AccessToken)?;
        let timestamp = self
            .graph
            .data_access_expiry(token)
            .map_err(CredentialError::Verification)?;
        Ok(DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    pub fn needs_refresh(&self, bundle: &CredentialBundle) -> Result<bool, CredentialError> {
        self.needs_refresh_at(bundle, Utc::now())
    }

    pub fn needs_refresh_at(
        &self,
        bundle: &CredentialBundle,
        now: DateTime<Utc>,
    ) -> Result<bool, CredentialError> {
        Ok(self.expiry(bundle)? - now < self.threshold)
    }

    /// Refresh and rotate only when the token is close to expiry.
    pub fn verify_and_rotate(
        &self,
        store: &CredentialStore<'_>,
        bundle: &CredentialBundle,
    ) -> Result<VerifyOutcome, CredentialError> {
        self.verify_and_rotate_at(store, bundle, Utc::now())
    }

    pub fn verify_and_rotate_at(
        &self,
        store: &CredentialStore<'_>,
        bundle: &CredentialBundle,
        now: DateTime<Utc>,
    ) -> Result<VerifyOutcome, CredentialError> {
        let expires_at = self.expiry(bundle)?;
        let remaining = expires_at - now;
        if remaining >= self.threshold {
            tracing::info!(days_left = remaining.num_days(), "access token still valid");
            return Ok(VerifyOutcome::Fresh { expires_at });
        }

        tracing::info!(days_left = remaining.num_days(), "access token near expiry, refreshing");
        let token = self.refresh(bundle)?;
        let report = store.rotate(bundle, &token)?;
        Ok(VerifyOutcome::Rotated(report))
    }
}
