use std::sync::Arc;

use async_channel::Sender;
use chrono::Utc;
use futures::{Stream, StreamExt};
use tracing::{instrument, warn};
use tracker_core::{DataMessage, LiveFeedStats};

use crate::{
    error::{
        Result,
        error::{ChannelClosedSnafu, StreamClosedSnafu},
    },
    parser::{ParsedMessage, parse_message},
};

pub struct Consumer {
    commit_interval: std::time::Duration,
    stats: Arc<LiveFeedStats>,
}

impl Consumer {
    pub fn new(commit_interval: std::time::Duration, stats: Arc<LiveFeedStats>) -> Consumer {
        Consumer {
            commit_interval,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<LiveFeedStats> {
        &self.stats
    }

    /// Reads raw messages from `source` and forwards them in batches every `commit_interval`.
    ///
    /// Only returns on error, a source that ends is reported as [`crate::Error::StreamClosed`].
    pub async fn run<S>(&self, source: S, sender: Sender<DataMessage>) -> Result<()>
    where
        S: Stream<Item = Result<String>>,
    {
        let mut source = std::pin::pin!(source);

        // This vector is never deallocated and will match the size of
        // highest amount of messages received during a commit interval.
        let mut buffer = Vec::new();

        let mut interval = tokio::time::interval(self.commit_interval);

        loop {
            tokio::select! {
                message = source.next() => {
                    match message {
                        Some(message) => {
                            self.stats.record_message(Utc::now());
                            buffer.push(message);
                        }
                        None => {
                            if !buffer.is_empty() {
                                self.process_messages(buffer.drain(..), &sender).await?;
                            }
                            return StreamClosedSnafu.fail();
                        }
                    }
                }
                _ = interval.tick() => {
                    if !buffer.is_empty() {
                        self.process_messages(buffer.drain(..), &sender).await?;
                    }
                }
            }
        }
    }

    #[instrument(skip_all, fields(app.num_messages))]
    async fn process_messages<T>(&self, messages: T, sender: &Sender<DataMessage>) -> Result<()>
    where
        T: IntoIterator<Item = Result<String>>,
    {
        let received_at = Utc::now();
        let mut data_message = DataMessage::default();
        let mut num_messages = 0;

        for message in messages {
            num_messages += 1;
            match message {
                Err(e) => {
                    self.stats.record_parse_failure();
                    warn!("failed to consume ais message: {e:?}");
                }
                Ok(message) => match parse_message(&message, received_at) {
                    Err(e) => {
                        self.stats.record_parse_failure();
                        warn!("dropped ais message: {e}");
                    }
                    Ok(ParsedMessage::Position(p)) => data_message.positions.push(p),
                    Ok(ParsedMessage::Static(s)) => data_message.static_messages.push(s),
                    Ok(ParsedMessage::Ignored) => {}
                },
            }
        }

        tracing::Span::current().record("app.num_messages", num_messages);

        if data_message.is_empty() {
            return Ok(());
        }

        // Can only fail if the channel is closed.
        sender
            .send(data_message)
            .await
            .map_err(|_| ChannelClosedSnafu.build())
    }
}
