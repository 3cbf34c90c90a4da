use once_cell::sync::OnceCell;
use tracing::{debug, error};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceCell<Handle<EnvFilter, Registry>> = OnceCell::new();

/// Log filter for a verbosity level, used unless `RUST_LOG` is set.
fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,spacequest=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,spacequest=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,spacequest=info",
        // Show debug from the binary and its libraries
        Verbosity::Verbose(2) => "off,spacequest=debug",
        Verbosity::Verbose(3) => "off,spacequest=trace",
        // Also show debug from dependencies, e.g. the HTTP stack
        Verbosity::Verbose(4) => "debug,spacequest=trace",
        Verbosity::Verbose(_) => "trace",
    }
}

pub fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        let (subscriber, reload_handle) = create_registry_and_filter_reload_handle();
        subscriber.init();
        reload_handle
    });

    update_filters(filter_handle, log_filter(verbosity));
}

fn update_filters(filter_handle: &Handle<EnvFilter, Registry>, log_filter: &str) {
    let result = filter_handle.modify(|layer| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_filter)) {
            Ok(new_filter) => *layer = new_filter,
            Err(err) => {
                error!("Updating logger filter failed: {}", err);
            },
        };
    });
    if let Err(err) = result {
        error!("Updating logger filter failed: {}", err);
    }
}

fn create_registry_and_filter_reload_handle() -> (
    impl tracing::Subscriber + Send + Sync + 'static,
    Handle<EnvFilter, Registry>,
) {
    debug!("Initializing logger (how are you seeing this?)");
    // Start wide open; `init_logger` narrows the filter right after.
    let filter = EnvFilter::new("trace");
    let (filter, filter_reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    let registry = tracing_subscriber::registry().with(log_layer);

    (registry, filter_reload_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_filter_parses() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Verbose(0),
            Verbosity::Verbose(1),
            Verbosity::Verbose(2),
            Verbosity::Verbose(3),
            Verbosity::Verbose(4),
            Verbosity::Verbose(9),
        ] {
            assert!(EnvFilter::try_new(log_filter(verbosity)).is_ok());
        }
    }

    #[test]
    fn default_verbosity_shows_warnings() {
        assert_eq!(log_filter(Verbosity::default()), "off,spacequest=warn");
    }
}
