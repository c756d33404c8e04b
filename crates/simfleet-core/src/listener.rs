// ── Listener subscription controller ──
//
// A single-subscription toggle state machine plus the shared inbound
// message buffer. The subscription slot is client-global: at most one
// topic is held at a time, and the lifecycle strictly alternates
// unset -> subscribed(topic) -> unset. The buffer is decoupled from the
// subscription: messages may arrive for any topic the server relays.

use std::sync::Arc;

use tokio::sync::watch;

use simfleet_api::models::InboundMessage;

use crate::error::CoreError;

// ── SubscriptionState ───────────────────────────────────────────────

/// The single subscription slot's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubscriptionState {
    #[default]
    Unsubscribed,
    Subscribed {
        topic: String,
    },
}

impl SubscriptionState {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed { .. })
    }

    pub fn topic(&self) -> Option<&str> {
        match self {
            Self::Unsubscribed => None,
            Self::Subscribed { topic } => Some(topic),
        }
    }
}

// ── ListenerSlot ────────────────────────────────────────────────────

/// Pure state machine for the single subscription slot.
///
/// The controller performs the network calls; this type only guards the
/// transitions. `check_subscribe` runs BEFORE the request (validation
/// failures never reach the network) and `commit_subscribe` after a
/// successful one, so a failed request leaves the slot untouched.
#[derive(Debug, Default)]
pub struct ListenerSlot {
    state: SubscriptionState,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SubscriptionState {
        &self.state
    }

    /// Validate a subscribe attempt without touching the slot.
    pub fn check_subscribe(&self, topic: &str) -> Result<(), CoreError> {
        if topic.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "subscription topic must not be empty".into(),
            });
        }
        if let SubscriptionState::Subscribed { topic: held } = &self.state {
            return Err(CoreError::AlreadySubscribed {
                topic: held.clone(),
            });
        }
        Ok(())
    }

    /// Record a server-confirmed subscription.
    pub fn commit_subscribe(&mut self, topic: String) {
        self.state = SubscriptionState::Subscribed { topic };
    }

    /// Begin an unsubscribe: release the slot and hand back the held
    /// topic for the (best-effort) server request. The slot returns to
    /// `Unsubscribed` regardless of how that request fares.
    pub fn begin_unsubscribe(&mut self) -> Result<String, CoreError> {
        match std::mem::take(&mut self.state) {
            SubscriptionState::Unsubscribed => Err(CoreError::NotSubscribed),
            SubscriptionState::Subscribed { topic } => Ok(topic),
        }
    }
}

// ── ListenerBuffer ──────────────────────────────────────────────────

/// The shared inbound-message buffer, refreshed by the listener poll
/// task while the panel is open and observable through a watch channel.
pub(crate) struct ListenerBuffer {
    messages: watch::Sender<Arc<Vec<InboundMessage>>>,
}

impl ListenerBuffer {
    pub(crate) fn new() -> Self {
        let (messages, _) = watch::channel(Arc::new(Vec::new()));
        Self { messages }
    }

    /// Replace the buffer with the latest server view.
    pub(crate) fn apply(&self, messages: Vec<InboundMessage>) {
        self.messages.send_modify(|m| *m = Arc::new(messages));
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<InboundMessage>> {
        self.messages.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<InboundMessage>>> {
        self.messages.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_rejects_empty_topic_before_any_request() {
        let slot = ListenerSlot::new();
        let err = slot.check_subscribe("   ").unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(!slot.state().is_subscribed());
    }

    #[test]
    fn subscribe_is_illegal_while_subscribed() {
        let mut slot = ListenerSlot::new();
        slot.check_subscribe("fleet/#").unwrap();
        slot.commit_subscribe("fleet/#".into());

        let err = slot.check_subscribe("other/#").unwrap_err();
        match err {
            CoreError::AlreadySubscribed { topic } => assert_eq!(topic, "fleet/#"),
            other => panic!("expected AlreadySubscribed, got: {other:?}"),
        }
        // The held subscription is untouched.
        assert_eq!(slot.state().topic(), Some("fleet/#"));
    }

    #[test]
    fn lifecycle_strictly_alternates() {
        let mut slot = ListenerSlot::new();
        assert!(matches!(
            slot.begin_unsubscribe(),
            Err(CoreError::NotSubscribed)
        ));

        slot.commit_subscribe("fleet/#".into());
        let topic = slot.begin_unsubscribe().unwrap();
        assert_eq!(topic, "fleet/#");
        assert!(!slot.state().is_subscribed());

        // And again from the top.
        slot.check_subscribe("fleet/#").unwrap();
    }

    #[test]
    fn failed_subscribe_leaves_slot_unsubscribed() {
        // The controller only commits after server success; a failure
        // path never calls commit_subscribe.
        let slot = ListenerSlot::new();
        slot.check_subscribe("fleet/#").unwrap();
        assert!(!slot.state().is_subscribed());
    }

    #[test]
    fn buffer_replaces_wholesale() {
        let buffer = ListenerBuffer::new();
        buffer.apply(vec![InboundMessage {
            topic: "t".into(),
            payload: serde_json::json!("1"),
            timestamp: 1,
        }]);
        assert_eq!(buffer.snapshot().len(), 1);

        buffer.apply(Vec::new());
        assert!(buffer.snapshot().is_empty());
    }
}
