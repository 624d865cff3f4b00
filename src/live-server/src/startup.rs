use std::{sync::Arc, time::Duration};

use ais_consumer::startup::{LiveFeed, ingest_loop};
use axum::{
    Json, Router,
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use registry::VesselRegistry;
use simulator::RouteMotionSimulator;
use snafu::ResultExt;
use tokio::{net::TcpListener, sync::Semaphore};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracker_core::{Environment, LiveFeedStats, VesselOutbound};

use crate::{
    error::{
        Result,
        error::{BindSnafu, ServeSnafu, SimulationSnafu},
    },
    hub::BroadcastHub,
    session::run_session,
    settings::Settings,
    summary::FleetSummary,
    ticker::Ticker,
};

/// Shared by every request handler and viewer session.
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub vessels: Arc<dyn VesselOutbound>,
    pub stats: Arc<LiveFeedStats>,
    pub max_age: Duration,
    pub update_interval: Duration,
    pub max_clients: usize,
    /// One permit per viewer, held for the lifetime of its session.
    pub connection_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn fleet_summary(&self) -> FleetSummary {
        FleetSummary::generate(
            &self.vessels.active_snapshot(self.max_age),
            self.hub.len(),
            self.update_interval,
        )
    }
}

pub struct App {
    listener: TcpListener,
    port: u16,
    environment: Environment,
    state: Arc<AppState>,
    registry: Arc<VesselRegistry>,
    live_feed: LiveFeed,
    ticker: Ticker,
    cancellation: CancellationToken,
}

impl App {
    pub async fn build(settings: &Settings) -> Result<Self> {
        let address = settings.api.listener_address();
        let listener = TcpListener::bind(&address)
            .await
            .context(BindSnafu { address: &address })?;
        let port = listener
            .local_addr()
            .context(BindSnafu { address: &address })?
            .port();

        let now = Utc::now();
        let registry = Arc::new(VesselRegistry::new(&settings.registry));
        let stats = Arc::new(LiveFeedStats::default());
        let hub = Arc::new(BroadcastHub::new(&settings.broadcast));

        let live_feed = LiveFeed::build(&settings.aisstream, stats.clone());
        let simulator = RouteMotionSimulator::from_settings(&settings.simulation, now)
            .context(SimulationSnafu)?;

        let mut ticker = Ticker::new(
            registry.clone(),
            hub.clone(),
            simulator,
            settings.simulation.tick_interval,
            settings.broadcast.fleet_summary_probability,
        );
        // Populates the registry with the simulated fleet before any viewer connects.
        ticker.tick(now, false);

        let state = Arc::new(AppState {
            hub,
            vessels: registry.clone(),
            stats,
            max_age: settings.registry.max_age,
            update_interval: settings.simulation.tick_interval,
            max_clients: settings.broadcast.max_clients,
            connection_slots: Arc::new(Semaphore::new(settings.broadcast.max_clients)),
        });

        info!(
            port,
            live_feed = live_feed.is_enabled(),
            fleet_size = settings.simulation.fleet_size,
            "vessel tracker built"
        );

        Ok(App {
            listener,
            port,
            environment: settings.environment,
            state,
            registry,
            live_feed,
            ticker,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Cancelling the token shuts the whole app down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn registry(&self) -> Arc<VesselRegistry> {
        self.registry.clone()
    }

    pub fn hub(&self) -> Arc<BroadcastHub> {
        self.state.hub.clone()
    }

    pub fn stats(&self) -> Arc<LiveFeedStats> {
        self.state.stats.clone()
    }

    pub async fn run(self) -> Result<()> {
        let App {
            listener,
            environment,
            state,
            registry,
            live_feed,
            ticker,
            cancellation,
            ..
        } = self;

        let ingest = tokio::spawn(ingest_loop(live_feed.receiver(), registry));
        let feed = tokio::spawn(live_feed.run(cancellation.clone()));
        let tick = tokio::spawn(ticker.run(cancellation.clone()));

        let shutdown = cancellation.clone();
        let served = axum::serve(listener, router(state.clone(), environment))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .context(ServeSnafu);

        if let Err(e) = &served {
            error!("server failed: {e:?}");
        }
        cancellation.cancel();
        state.hub.close_all().await;

        for (name, task) in [("live feed", feed), ("tick loop", tick), ("ingest", ingest)] {
            if let Err(e) = task.await {
                error!("{name} task failed: {e:?}");
            }
        }

        info!("vessel tracker stopped");
        served
    }
}

fn router(state: Arc<AppState>, environment: Environment) -> Router {
    let mut router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http());

    if environment != Environment::Production {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(slot) = state.connection_slots.clone().try_acquire_owned() else {
        warn!(
            max_clients = state.max_clients,
            "viewer rejected, too many connections"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    ws.on_upgrade(move |socket| run_session(socket, state, slot))
        .into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "clients": state.hub.len(),
        "max_clients": state.max_clients,
        "vessels": state.vessels.len(),
        "live_feed": state.stats.snapshot(Utc::now()),
    }))
}
