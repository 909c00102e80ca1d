use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use qreport_core::config::ReportConfig;
use qreport_core::fetch::HttpSonarClient;
use qreport_core::pipeline::{ReportPipeline, ReportRequest};
use qreport_core::progress::{IndicatifReporter, NoopReporter, ProgressReporter};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Server base URL, e.g. https://sonar.example.com
    #[arg(long, env = "SONAR_HOST")]
    pub host: String,

    /// Project key
    #[arg(long, env = "SONAR_PROJECT")]
    pub project: String,

    /// Authentication token (sent as basic-auth user)
    #[arg(long, env = "SONAR_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory for the chart images
    #[arg(long)]
    pub charts_dir: PathBuf,

    /// Path of the HTML report
    #[arg(long)]
    pub output: PathBuf,

    /// Optional TOML config (page size, metric keys, chart files, escaping)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: GenerateArgs, quiet: bool) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => ReportConfig::default(),
    };

    let client = HttpSonarClient::new(&args.host, args.token, config.concurrency());
    let pipeline = ReportPipeline::new(config);
    let request = ReportRequest {
        project_key: args.project,
        charts_dir: args.charts_dir,
        output: args.output,
    };

    let progress: Box<dyn ProgressReporter> = if quiet {
        Box::new(NoopReporter)
    } else {
        Box::new(IndicatifReporter::new())
    };

    say(quiet, "Fetching data from SonarQube...");
    let data = pipeline
        .fetch(&client, &request, progress.as_ref())
        .await
        .with_context(|| format!("Fetching {} from {} failed", request.project_key, client.base_url()))?;

    say(quiet, "Generating HTML report...");
    pipeline
        .render(&data, &request)
        .context("Rendering failed")?;

    say(
        quiet,
        &format!("Report saved to {}", request.output.display()),
    );
    Ok(())
}

fn say(quiet: bool, msg: &str) {
    if !quiet {
        println!("{msg}");
    }
}
