use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "bimgraph=info,bimgraph_recon=info,bimgraph_io=info";

/// Install the stderr subscriber. `RUST_LOG` overrides the default levels;
/// `verbose` raises the bimgraph crates to debug. Records from the `log`
/// facade used by the library crates are forwarded into it.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("bimgraph=debug,bimgraph_recon=debug,bimgraph_io=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
