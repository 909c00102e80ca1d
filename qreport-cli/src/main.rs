use clap::Parser;

use qreport_core::error::{ConfigError, FetchError, RenderError, ReportError};

mod generate;

#[derive(Parser, Debug)]
#[command(
    name = "qreport",
    version,
    about = "Render an HTML quality report for one project of a SonarQube server"
)]
struct Cli {
    #[command(flatten)]
    args: generate::GenerateArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

/// Classify an error into a process exit code by the library error type
/// found in its chain.
///
/// Exit codes:
///   0  success
///   1  general/unknown error
///   2  configuration error
///   5  server API error (network, HTTP status, unexpected JSON)
///   7  render failed (charts or HTML)
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(report) = cause.downcast_ref::<ReportError>() {
            return match report {
                ReportError::Config(_) => 2,
                ReportError::Fetch(_) => 5,
                ReportError::Render(_) => 7,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if cause.downcast_ref::<FetchError>().is_some() {
            return 5;
        }
        if cause.downcast_ref::<RenderError>().is_some() {
            return 7;
        }
    }
    1
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG overrides the flag-derived level
    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Already-installed provider is fine
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(generate::run(cli.args, cli.quiet)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
