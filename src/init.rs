use crate::client::BatchClient;
use crate::layer::RecordLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{Layer, Registry};

/// Targets whose events are never shipped: this crate and the HTTP stack
/// it ships with.
const SILENCED_TARGETS: &[&str] = &["flare_log_sink", "hyper", "reqwest", "h2", "rustls", "mio"];

/// Configuration of the `tracing` integration.
///
/// **Fields**
/// - `max_level`: most verbose level that gets shipped (and printed).
/// - `enable_stdout`: if `true`, a `fmt` layer printing to stdout is
///   installed next to the shipping layer.
#[derive(Clone, Debug)]
pub struct InitConfig {
    pub max_level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::INFO,
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that ships events through
/// `client`.
///
/// **Parameters**
/// - `client`: [`BatchClient`] receiving one record per event.
/// - `config`: [`InitConfig`] controlling what is shipped and whether
///   events are echoed to stdout.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`RecordLayer`] as the
/// global default subscriber. Events emitted by this crate and by the HTTP
/// client are never shipped.
///
/// **Returns**
/// - `Err(TryInitError)` if a global subscriber is already installed.
pub fn init_tracing_with_config(client: &BatchClient, config: InitConfig) -> Result<(), TryInitError> {
    let filter = SILENCED_TARGETS
        .iter()
        .fold(Targets::new().with_default(config.max_level), |targets, target| {
            targets.with_target(*target, LevelFilter::OFF)
        });
    let ship_layer = RecordLayer::new(client.clone()).with_filter(filter);

    let stdout_layer = config
        .enable_stdout
        .then(|| tracing_subscriber::fmt::layer().with_filter(config.max_level));

    Registry::default()
        .with(ship_layer)
        .with(stdout_layer)
        .try_init()
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with
/// [`InitConfig::default`]. This is the recommended entrypoint for
/// typical services.
pub fn init_tracing(client: &BatchClient) -> Result<(), TryInitError> {
    init_tracing_with_config(client, InitConfig::default())
}
