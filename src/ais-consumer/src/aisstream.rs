use futures::{SinkExt, Stream, StreamExt};
use snafu::ResultExt;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info};

use crate::{
    error::{
        Result,
        error::{ConnectSnafu, SerializeSnafu, StreamSnafu, SubscribeSnafu},
    },
    models::{BoundingBox, Subscription},
};

pub const DEFAULT_AISSTREAM_URL: &str = "wss://stream.aisstream.io/v0/stream";

pub struct AisStreamClient {
    url: String,
    api_key: String,
    bounding_boxes: Vec<BoundingBox>,
    message_types: Vec<String>,
}

impl AisStreamClient {
    pub fn new(
        url: String,
        api_key: String,
        bounding_boxes: Vec<BoundingBox>,
        message_types: Vec<String>,
    ) -> AisStreamClient {
        AisStreamClient {
            url,
            api_key,
            bounding_boxes,
            message_types,
        }
    }

    /// Connects, subscribes and returns the raw messages as a stream. The stream ends when the
    /// server closes the connection.
    pub async fn streamer(&self) -> Result<impl Stream<Item = Result<String>> + use<>> {
        let (mut ws, _) = connect_async(self.url.as_str())
            .await
            .context(ConnectSnafu { url: &self.url })?;

        let subscription = serde_json::to_string(&Subscription {
            api_key: &self.api_key,
            bounding_boxes: &self.bounding_boxes,
            filter_message_types: &self.message_types,
        })
        .context(SerializeSnafu)?;

        ws.send(Message::Text(subscription))
            .await
            .context(SubscribeSnafu)?;

        info!(
            url = %self.url,
            num_bounding_boxes = self.bounding_boxes.len(),
            "subscribed to ais stream"
        );

        let stream = ws
            .take_while(|m| futures::future::ready(!matches!(m, Ok(Message::Close(_)))))
            .filter_map(|m| futures::future::ready(into_text(m)));

        Ok(stream)
    }
}

fn into_text(
    message: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Option<Result<String>> {
    match message {
        Ok(Message::Text(text)) => Some(Ok(text)),
        // aisstream delivers its json payloads as binary frames
        Ok(Message::Binary(bytes)) => Some(Ok(String::from_utf8_lossy(&bytes).into_owned())),
        Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
        Ok(Message::Close(frame)) => {
            debug!("ais stream closed: {frame:?}");
            None
        }
        Err(e) => Some(Err::<String, _>(e).context(StreamSnafu)),
    }
}
