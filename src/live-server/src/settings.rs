use std::time::Duration;

use ais_consumer::settings::AisStreamSettings;
use config::{Config, ConfigError, File};
use registry::RegistrySettings;
use serde::Deserialize;
use simulator::SimulationSettings;
use tracker_core::{Environment, LogLevel};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub log_level: LogLevel,
    pub api: ApiSettings,
    pub aisstream: AisStreamSettings,
    pub registry: RegistrySettings,
    pub simulation: SimulationSettings,
    pub broadcast: BroadcastSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastSettings {
    /// Messages queued per viewer before further messages to that viewer are dropped.
    pub session_buffer_size: usize,
    /// Chance per tick of pushing a `fleet_summary_update` to every viewer.
    pub fleet_summary_probability: f64,
    pub max_clients: usize,
    #[serde(with = "humantime_serde")]
    pub close_timeout: Duration,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::from_env())
    }

    /// Reads `config/<environment>.yml`, an optional `config/<environment>.secret.yml` and
    /// `VESSEL_TRACKER__*` environment variables, in increasing order of precedence.
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let environment = environment.as_str();

        Config::builder()
            .add_source(File::with_name(&format!("config/{environment}")).required(true))
            .add_source(File::with_name(&format!("config/{environment}.secret")).required(false))
            .add_source(config::Environment::with_prefix("VESSEL_TRACKER").separator("__"))
            .set_override("environment", environment)?
            .build()?
            .try_deserialize()
    }
}

impl ApiSettings {
    pub fn listener_address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            session_buffer_size: 64,
            fleet_summary_probability: 0.1,
            max_clients: 100,
            close_timeout: Duration::from_secs(2),
        }
    }
}
