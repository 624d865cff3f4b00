#![deny(warnings)]
#![deny(rust_2018_idioms)]

use live_server::{Result, error::error::ConfigSnafu, settings::Settings, startup::App};
use snafu::ResultExt;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context(ConfigSnafu)?;
    tracker_core::init_tracing(settings.log_level);

    let app = App::build(&settings).await?;
    info!(
        port = app.port(),
        environment = settings.environment.as_str(),
        "starting vessel tracker"
    );

    let cancellation = app.cancellation_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                cancellation.cancel();
            }
            Err(e) => error!("failed to listen for shutdown signal: {e}"),
        }
    });

    app.run().await
}
