//! Diagnostic tracing for docfill.
//!
//! Output goes to stderr so it never mixes with rendered documents or field
//! orders printed on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for diagnostic logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset, which still shows
/// every rejected model reply.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=docfill=debug docfill fill letter.toml --input user='"Jane"'
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
