// Bus endpoints
//
// Server-side subscription management, the shared listener buffer, and
// manual publishing. These replies carry no data the client needs, so
// the write operations discard their bodies.

use tracing::debug;

use crate::client::PanelClient;
use crate::error::Error;
use crate::models::{InboundMessage, PublishRequest, TopicRequest};

impl PanelClient {
    /// Open a server-side bus subscription on behalf of the UI.
    ///
    /// `POST /api/mqtt/subscribe`
    pub async fn subscribe(&self, topic: &str) -> Result<(), Error> {
        let url = self.api_url("mqtt/subscribe");
        debug!(topic, "subscribing");
        self.post_unit(
            url,
            &TopicRequest {
                topic: topic.to_owned(),
            },
        )
        .await
    }

    /// Close a server-side bus subscription.
    ///
    /// `POST /api/mqtt/unsubscribe`
    pub async fn unsubscribe(&self, topic: &str) -> Result<(), Error> {
        let url = self.api_url("mqtt/unsubscribe");
        debug!(topic, "unsubscribing");
        self.post_unit(
            url,
            &TopicRequest {
                topic: topic.to_owned(),
            },
        )
        .await
    }

    /// Fetch the shared listener buffer, oldest first.
    ///
    /// `GET /api/mqtt/listener-messages`
    pub async fn listener_messages(&self) -> Result<Vec<InboundMessage>, Error> {
        let url = self.api_url("mqtt/listener-messages");
        self.get(url).await
    }

    /// Purge the shared listener buffer.
    ///
    /// `DELETE /api/mqtt/listener-messages`
    pub async fn clear_listener_messages(&self) -> Result<(), Error> {
        let url = self.api_url("mqtt/listener-messages");
        debug!("clearing listener messages");
        self.delete_unit(url).await
    }

    /// Publish a message through the server's broker connection.
    ///
    /// `POST /api/mqtt/publish`
    pub async fn publish(&self, request: &PublishRequest) -> Result<(), Error> {
        let url = self.api_url("mqtt/publish");
        debug!(topic = %request.topic, "publishing");
        self.post_unit(url, request).await
    }
}
