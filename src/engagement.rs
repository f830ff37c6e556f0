//! Replies to the top comments on the account's latest posts.
//!
//! Purely best-effort: a reply that fails is logged and counted, and the
//! caller treats the whole step as optional.

use crate::credentials::{CredentialBundle, CredentialField, MissingCredential};
use crate::graph::{GraphClient, GraphError};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub const DEFAULT_REPLIES: &[&str] = &[
    "Thanks for playing! A new grid drops tomorrow.",
    "Great to see you here! How long did this one take you?",
    "Nice work! Did you spot the tricky cell?",
    "Thank you! Share it with a friend who loves puzzles.",
    "Appreciate you! Tomorrow's grid might be a different shape.",
    "Love it! Keep that streak going.",
];

#[derive(Error, Debug)]
pub enum EngagementError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("No posts found")]
    NoPosts,
    #[error(transparent)]
    Missing(#[from] MissingCredential),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngagementSummary {
    pub posts: usize,
    pub replied: usize,
    pub failed: usize,
}

pub struct SocialEngagement<'a> {
    graph: GraphClient<'a>,
    pub post_limit: usize,
    pub comment_limit: usize,
    pub replies: Vec<String>,
}

impl<'a> SocialEngagement<'a> {
    pub fn new(graph: GraphClient<'a>) -> Self {
        Self {
            graph,
            post_limit: 2,
            comment_limit: 3,
            replies: DEFAULT_REPLIES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn engage(&self, bundle: &CredentialBundle) -> Result<EngagementSummary, EngagementError> {
        self.engage_with(bundle, &mut rand::thread_rng())
    }

    /// Reply once to each of the first comments on the most recent posts.
    ///
    /// Only the post listing is fatal to the step; comment and reply
    /// failures are counted and skipped.
    pub fn engage_with<R: Rng + ?Sized>(
        &self,
        bundle: &CredentialBundle,
        rng: &mut R,
    ) -> Result<EngagementSummary, EngagementError> {
        let user_id = bundle.require(CredentialField::InstagramUserId)?;
        let token = bundle.require(CredentialField::AccessToken)?;

        let posts = self.graph.recent_media(user_id, token, self.post_limit)?;
        if posts.is_empty() {
            return Err(EngagementError::NoPosts);
        }

        let mut summary = EngagementSummary {
            posts: posts.len(),
            ..Default::default()
        };
        for post in posts.iter().take(self.post_limit) {
            let comments = match self.graph.comments(&post.id, token) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(post = %post.id, error = %e, "could not read comments");
                    summary.failed += 1;
                    continue;
                }
            };
            for comment in comments.iter().take(self.comment_limit) {
                let Some(message) = self.replies.choose(rng) else {
                    continue;
                };
                match self.graph.reply(&comment.id, token, message) {
                    Ok(()) => {
                        tracing::info!(comment = %comment.id, "replied to comment");
                        summary.replied += 1;
                    }
                    Err(e) => {
                        tracing::warn!(comment = %comment.id, error = %e, "failed to reply");
                        summary.failed += 1;
                    }
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::test_helpers::{MockTransport, sample_bundle};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    const BASE: &str = "https://graph.test/v20.0";

    fn engagement(transport: &MockTransport) -> SocialEngagement<'_> {
        SocialEngagement::new(GraphClient::new(transport, BASE))
    }

    fn comments(ids: &[&str]) -> HttpResponse {
        let data: Vec<_> = ids.iter().map(|id| json!({"id": id, "text": "hi"})).collect();
        HttpResponse::ok(json!({ "data": data }))
    }

    fn feed(transport: &MockTransport) {
        transport.respond(
            "GET",
            &format!("{BASE}/42/media"),
            HttpResponse::ok(json!({"data": [{"id": "p1"}, {"id": "p2"}]})),
        );
    }

    #[test]
    fn replies_to_first_three_comments_per_post() {
        let transport = MockTransport::new();
        feed(&transport);
        transport.respond(
            "GET",
            &format!("{BASE}/p1/comments"),
            comments(&["c1", "c2", "c3", "c4"]),
        );
        transport.respond("GET", &format!("{BASE}/p2/comments"), comments(&["c5"]));
        for c in ["c1", "c2", "c3", "c5"] {
            transport.respond(
                "POST",
                &format!("{BASE}/{c}/replies"),
                HttpResponse::ok(json!({"id": format!("r-{c}")})),
            );
        }

        let summary = engagement(&transport)
            .engage_with(&sample_bundle(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(
            summary,
            EngagementSummary {
                posts: 2,
                replied: 4,
                failed: 0
            }
        );
        assert_eq!(transport.count("POST", &format!("{BASE}/c4/replies")), 0);
        assert_eq!(transport.calls_to("/replies").len(), 4);

        let listing = &transport.calls()[0];
        assert_eq!(listing.param("fields"), Some("id,caption"));
        assert_eq!(listing.param("limit"), Some("2"));
    }

    #[test]
    fn reply_text_comes_from_templates() {
        let transport = MockTransport::new();
        transport.respond(
            "GET",
            &format!("{BASE}/42/media"),
            HttpResponse::ok(json!({"data": [{"id": "p1"}]})),
        );
        transport.respond("GET", &format!("{BASE}/p1/comments"), comments(&["c1"]));
        let mut engage = engagement(&transport);
        engage.replies = vec!["only reply".into()];

        engage
            .engage_with(&sample_bundle(), &mut StdRng::seed_from_u64(2))
            .unwrap();
        let reply = &transport.calls_to("/replies")[0];
        assert_eq!(reply.param("message"), Some("only reply"));
    }

    #[test]
    fn failed_replies_are_counted_not_fatal() {
        let transport = MockTransport::new();
        feed(&transport);
        transport.respond("GET", &format!("{BASE}/p1/comments"), comments(&["c1", "c2"]));
        transport.fail("GET", &format!("{BASE}/p2/comments"));
        transport.respond(
            "POST",
            &format!("{BASE}/c1/replies"),
            HttpResponse::ok(json!({"id": "r1"})),
        );
        // c2 is unscripted and answers 404

        let summary = engagement(&transport)
            .engage_with(&sample_bundle(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(summary.replied, 1);
        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn empty_feed_is_no_posts() {
        let transport = MockTransport::new();
        transport.respond(
            "GET",
            &format!("{BASE}/42/media"),
            HttpResponse::ok(json!({"data": []})),
        );
        assert!(matches!(
            engagement(&transport).engage(&sample_bundle()),
            Err(EngagementError::NoPosts)
        ));
    }

    #[test]
    fn missing_user_id_is_reported_before_any_call() {
        let transport = MockTransport::new();
        let bundle = CredentialBundle {
            instagram_user_id: None,
            ..sample_bundle()
        };
        let err = engagement(&transport).engage(&bundle).unwrap_err();
        assert!(matches!(
            err,
            EngagementError::Missing(MissingCredential(CredentialField::InstagramUserId))
        ));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn feed_error_is_reported() {
        let transport = MockTransport::new();
        transport.respond(
            "GET",
            &format!("{BASE}/42/media"),
            HttpResponse::new(400, json!({"error": "bad"})),
        );
        assert!(matches!(
            engagement(&transport).engage(&sample_bundle()),
            Err(EngagementError::Graph(GraphError::Api { status: 400, .. }))
        ));
    }
}
