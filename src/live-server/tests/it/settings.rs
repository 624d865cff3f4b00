use std::time::Duration;

use live_server::settings::Settings;
use tracker_core::Environment;

#[test]
fn test_every_environment_has_valid_settings() {
    for environment in [
        Environment::Local,
        Environment::Development,
        Environment::Production,
        Environment::Test,
    ] {
        let settings = Settings::from_environment(environment)
            .unwrap_or_else(|e| panic!("{}: {e}", environment.as_str()));
        assert_eq!(settings.environment, environment);
        assert!(settings.simulation.fleet_size > 0);
        assert!(settings.broadcast.max_clients > 0);
    }
}

#[test]
fn test_production_defaults() {
    let settings = Settings::from_environment(Environment::Production).unwrap();
    assert_eq!(settings.registry.max_age, Duration::from_secs(6 * 60 * 60));
    assert_eq!(settings.registry.live_stale_after, Duration::from_secs(60 * 60));
    assert_eq!(settings.simulation.tick_interval, Duration::from_secs(15));
    assert_eq!(settings.broadcast.close_timeout, Duration::from_secs(2));
    assert_eq!(settings.broadcast.fleet_summary_probability, 0.1);
    assert_eq!(settings.aisstream.reconnect_delay, Duration::from_secs(5));
}
