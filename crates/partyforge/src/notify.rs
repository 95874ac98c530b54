//! Notification hook: how joined users get their access link.
//!
//! Partyforge never talks to the chat platform itself. After a join has
//! been committed, the gateway hands the deliveries to a [`Notifier`]
//! supplied by the embedding application (a bot that sends direct
//! messages, a webhook poster, or [`LogNotifier`] during development).
//!
//! Delivery failures are logged and otherwise ignored: the join they
//! belong to has already happened and is not rolled back.

use std::future::Future;

use partyforge_protocol::{SessionId, UserId};

/// A private access link for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLink {
    /// Who receives the link.
    pub user: UserId,
    pub session_id: SessionId,
    pub host: UserId,
    pub mode: String,
    pub access_code: String,
    /// `access_code` rendered through the configured link template.
    pub url: String,
}

/// Public announcement that a session just filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub session_id: SessionId,
    pub host: UserId,
    pub mode: String,
    pub region: String,
    pub access_code: String,
    /// Final member list, host first.
    pub members: Vec<UserId>,
    pub url: String,
}

/// Delivery failure reported by a [`Notifier`].
#[derive(Debug, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Delivers access links and completion announcements.
///
/// # Example
///
/// ```rust
/// use partyforge::{AccessLink, Completion, Notifier, NotifyError};
///
/// struct Silent;
///
/// impl Notifier for Silent {
///     async fn deliver_access_link(&self, _link: AccessLink) -> Result<(), NotifyError> {
///         Ok(())
///     }
///
///     async fn announce_completion(&self, _done: Completion) -> Result<(), NotifyError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Notifier: Send + Sync + 'static {
    /// Sends `link` to `link.user`. Called once per accepted join.
    fn deliver_access_link(
        &self,
        link: AccessLink,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Announces that a session filled. Called exactly once per session,
    /// after the completing member's link was delivered.
    fn announce_completion(
        &self,
        completion: Completion,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// A [`Notifier`] that only writes `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn deliver_access_link(&self, link: AccessLink) -> Result<(), NotifyError> {
        tracing::info!(
            user = %link.user,
            session_id = %link.session_id,
            mode = %link.mode,
            url = %link.url,
            "access link delivered"
        );
        Ok(())
    }

    async fn announce_completion(&self, completion: Completion) -> Result<(), NotifyError> {
        tracing::info!(
            session_id = %completion.session_id,
            host = %completion.host,
            mode = %completion.mode,
            region = %completion.region,
            members = completion.members.len(),
            "party is full"
        );
        Ok(())
    }
}
