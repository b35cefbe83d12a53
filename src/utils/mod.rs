use std::{env, path::PathBuf, sync::Once};

use tracing::warn;

/// Overrides the tracker home (config and ledger document) when set.
pub const HOME_ENV: &str = "CREDIT_TRACKER_HOME";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        match "credit_tracker=info".parse::<Directive>() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(err) => eprintln!("invalid default tracing directive: {err}"),
        }

        if fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_err()
        {
            warn!("global tracing subscriber already installed");
        }
    });
}

/// The `CREDIT_TRACKER_HOME` override, ignoring empty values.
pub fn home_override() -> Option<PathBuf> {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
