//! Notification plumbing: persisted in-app messages plus best-effort email.

use super::domain::{Message, MessageId, MessageLinks, UserId};
use super::repository::{LedgerStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Outbound mail transport. Real delivery lives outside this crate; the
/// service binary plugs in its own adapter.
pub trait EmailGateway: Send + Sync {
    fn send(&self, recipient: &UserId, subject: &str, body: &str) -> Result<(), EmailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("recipient {0:?} has no mail address on file")]
    NoAddress(UserId),
}

/// Records a message and, when asked, attempts email delivery.
///
/// Every send is best-effort: a failed delivery is logged and swallowed so
/// it can never abort the persistence that triggered it.
pub struct Notifier<S, E> {
    store: Arc<S>,
    mail: Arc<E>,
}

impl<S, E> Notifier<S, E>
where
    S: LedgerStore,
    E: EmailGateway,
{
    pub fn new(store: Arc<S>, mail: Arc<E>) -> Self {
        Self { store, mail }
    }

    /// Persist an in-app message. Storage failure is the only way this fails.
    pub fn record(
        &self,
        recipient: &UserId,
        links: MessageLinks,
        body: &str,
        at: DateTime<Utc>,
    ) -> Result<MessageId, StoreError> {
        let message = self.store.insert_message(Message::new(
            recipient.clone(),
            links,
            body.to_string(),
            at,
        ))?;
        Ok(message.id)
    }

    /// Persist an in-app message, then attempt email delivery.
    pub fn record_and_email(
        &self,
        recipient: &UserId,
        subject: &str,
        body: &str,
        links: MessageLinks,
        at: DateTime<Utc>,
    ) -> Result<MessageId, StoreError> {
        let id = self.record(recipient, links, body, at)?;
        if let Err(err) = self.mail.send(recipient, subject, body) {
            warn!(recipient = %recipient.0, %subject, error = %err, "email delivery failed");
        }
        Ok(id)
    }
}

// Manual impl: `derive(Clone)` would demand S: Clone and E: Clone.
impl<S, E> Clone for Notifier<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mail: Arc::clone(&self.mail),
        }
    }
}
