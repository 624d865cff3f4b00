use std::{
    panic,
    sync::{Arc, Once},
    time::Duration,
};

use futures::{Future, SinkExt, StreamExt};
use live_server::{hub::BroadcastHub, settings::Settings, startup::App};
use registry::VesselRegistry;
use serde_json::Value;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::FmtSubscriber;
use tracker_core::{Environment, LiveFeedStats};

static TRACING: Once = Once::new();

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestHelper {
    pub port: u16,
    pub registry: Arc<VesselRegistry>,
    pub hub: Arc<BroadcastHub>,
    pub stats: Arc<LiveFeedStats>,
    pub cancellation: CancellationToken,
}

pub struct Viewer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestHelper {
    fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    pub async fn try_connect(&self) -> Result<Viewer, tungstenite::Error> {
        let (ws, _) = connect_async(self.url()).await?;
        Ok(Viewer { ws })
    }

    /// Connects a viewer and consumes its `connection_established` message.
    pub async fn connect(&self) -> (Viewer, Value) {
        let mut viewer = self.try_connect().await.unwrap();
        let welcome = viewer.next_of_type("connection_established").await;
        (viewer, welcome)
    }

    pub async fn wait_for_clients(&self, expected: usize) {
        for _ in 0..200 {
            if self.hub.len() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {expected} clients, found {}", self.hub.len());
    }

    /// Issues a plain HTTP/1.1 GET and returns the raw response.
    pub async fn get(&self, path: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        tokio::time::timeout(RECEIVE_TIMEOUT, stream.read_to_string(&mut response))
            .await
            .unwrap()
            .unwrap();
        response
    }
}

impl Viewer {
    pub async fn send(&mut self, value: Value) {
        self.send_text(value.to_string()).await
    }

    pub async fn send_text(&mut self, text: String) {
        self.ws.send(Message::Text(text)).await.unwrap();
    }

    /// The next JSON message, skipping control frames.
    pub async fn next_json(&mut self) -> Value {
        loop {
            let message = tokio::time::timeout(RECEIVE_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a message")
                .expect("connection closed")
                .unwrap();

            match message {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                Message::Close(frame) => panic!("connection closed: {frame:?}"),
                _ => continue,
            }
        }
    }

    /// The next message with the given `type`, messages of other types are discarded.
    pub async fn next_of_type(&mut self, message_type: &str) -> Value {
        loop {
            let value = self.next_json().await;
            if value["type"] == message_type {
                return value;
            }
        }
    }

    /// Waits for the server to close the connection and returns whether a close frame was sent.
    pub async fn wait_for_close(&mut self) -> bool {
        loop {
            match tokio::time::timeout(RECEIVE_TIMEOUT, self.ws.next()).await {
                Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) | Ok(None) => return false,
                Err(_) => panic!("timed out waiting for close"),
            }
        }
    }

    pub async fn close(mut self) {
        self.ws.close(None).await.unwrap();
    }
}

pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut + panic::UnwindSafe + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    test_with_settings(|_| {}, test_closure).await
}

pub async fn test_with_settings<S, T, Fut>(modify_settings: S, test_closure: T)
where
    S: FnOnce(&mut Settings),
    T: FnOnce(TestHelper) -> Fut + panic::UnwindSafe + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    TRACING.call_once(|| {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_max_level(tracing::Level::INFO)
                .finish(),
        )
        .unwrap();
    });

    let mut settings = Settings::from_environment(Environment::Test).unwrap();
    modify_settings(&mut settings);

    let app = App::build(&settings).await.unwrap();

    let helper = TestHelper {
        port: app.port(),
        registry: app.registry(),
        hub: app.hub(),
        stats: app.stats(),
        cancellation: app.cancellation_token(),
    };
    let cancellation = helper.cancellation.clone();

    let server = tokio::spawn(app.run());

    test_closure(helper).await;

    cancellation.cancel();
    server.await.unwrap().unwrap();
}
