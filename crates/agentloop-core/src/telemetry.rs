//! Tracing initialisation for the agentloop CLI and anything embedding the loop.
//!
//! Call [`init_tracing`] once at program start. It installs a global
//! subscriber with an `EnvFilter` and either human-readable or JSON output.
//!
//! Every line goes to stderr. Step records are printed on stdout, so
//! `agentloop run > steps.txt` captures the loop output without log noise.
//!
//! A second call is a no-op: the global subscriber can only be set once per
//! process, and the error from `try_init` is discarded.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP stack crates that are chatty at debug level. Kept at `warn` unless
/// `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Filter used when `RUST_LOG` is unset: `level` for everything, with the
/// HTTP stack held at `warn` so `--verbose` shows loop events and model
/// prompts rather than connection pool chatter.
pub fn default_filter(level: Level) -> EnvFilter {
    let mut directives = level.as_str().to_ascii_lowercase();
    for target in QUIET_TARGETS {
        directives.push_str(&format!(",{target}=warn"));
    }
    EnvFilter::new(directives)
}

/// Initialise the global tracing subscriber.
///
/// * `json`: emit newline-delimited JSON, one object per event, with the
///   active run span (`run_id`, `task`) attached.
/// * `level`: verbosity when `RUST_LOG` is not set. See [`default_filter`].
///
/// `RUST_LOG` always wins when present and parseable.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_http_stack() {
        let rendered = default_filter(Level::DEBUG).to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("reqwest=warn"));
        assert!(rendered.contains("hyper=warn"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing(false, Level::INFO);
        init_tracing(true, Level::DEBUG);
        tracing::info!("still logging after repeated init");
    }
}
