use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;

static LOGGER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Initialize the global logger, or update its filter if already initialized.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let verbosity = verbosity.unwrap_or_default();
    let log_filter = log_filter(verbosity);

    let filter_handle = LOGGER_HANDLE.get_or_init(|| {
        // Start out permissive, the filter is narrowed right below.
        let filter = EnvFilter::new("trace");
        let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
        let log_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        tracing_subscriber::registry()
            .with(filter)
            .with(log_layer)
            .init();
        reload_handle
    });

    update_filters(filter_handle, log_filter);
}

fn log_filter(verbosity: Verbosity) -> &'static str {
    match verbosity {
        // Show only errors
        Verbosity::Quiet => "off,mtg=error,mtg_catalog=error",
        // Only show warnings
        Verbosity::Verbose(0) => "off,mtg=warn,mtg_catalog=warn",
        // Show our own info logs
        Verbosity::Verbose(1) => "off,mtg=info,mtg_catalog=info",
        // Also show requests and paging
        Verbosity::Verbose(2) => "off,mtg=debug,mtg_catalog=debug",
        Verbosity::Verbose(3) => "off,mtg=trace,mtg_catalog=trace",
        // Also show the HTTP stack
        Verbosity::Verbose(4) => "debug,mtg=trace,mtg_catalog=trace",
        Verbosity::Verbose(_) => "trace",
    }
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
