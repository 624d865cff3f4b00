use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to connect to the ais stream at '{url}'"))]
    Connect {
        #[snafu(implicit)]
        location: Location,
        url: String,
        #[snafu(source(from(tokio_tungstenite::tungstenite::Error, Box::new)))]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[snafu(display("Failed to send the subscription message"))]
    Subscribe {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source(from(tokio_tungstenite::tungstenite::Error, Box::new)))]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[snafu(display("Failed to serialize the subscription message"))]
    Serialize {
        #[snafu(implicit)]
        location: Location,
        source: serde_json::Error,
    },
    #[snafu(display("No api key has been configured for the ais stream"))]
    MissingApiKey {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Ais stream closed unexpectedly"))]
    StreamClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Ais stream returned an error"))]
    Stream {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source(from(tokio_tungstenite::tungstenite::Error, Box::new)))]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },
    #[snafu(display("Internal ingest channel closed unexpectedly"))]
    ChannelClosed {
        #[snafu(implicit)]
        location: Location,
    },
}

/// Reasons a single live feed message is dropped.
#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum ParseError {
    #[snafu(display("Message is not valid json"))]
    Json {
        #[snafu(implicit)]
        location: Location,
        source: serde_json::Error,
    },
    #[snafu(display("Message of type '{message_type}' is missing '{field}'"))]
    MissingField {
        #[snafu(implicit)]
        location: Location,
        message_type: &'static str,
        field: &'static str,
    },
    #[snafu(display("Message has an invalid identity"))]
    InvalidIdentity {
        #[snafu(implicit)]
        location: Location,
        source: tracker_core::Error,
    },
    #[snafu(display("Message has an invalid position"))]
    InvalidPosition {
        #[snafu(implicit)]
        location: Location,
        source: tracker_core::Error,
    },
}
