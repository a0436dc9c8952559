//! Health check command - checks a running currex server.

use std::time::Duration;

use serde::Deserialize;

use crate::cli::{Format, HealthArgs};

#[derive(Debug, Deserialize, serde::Serialize)]
struct HealthReport {
    status: String,
    backend: String,
}

/// The `/health` endpoint under `base`, tolerating a trailing slash or a
/// base that already names the endpoint.
fn health_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with("/health") {
        base.to_string()
    } else {
        format!("{base}/health")
    }
}

/// Run the health check command
///
/// Exits with status 1 when the server is unreachable or not healthy.
pub async fn run(args: &HealthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = health_url(&args.url);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("unhealthy: failed to connect to {url}: {e}");
            std::process::exit(1);
        }
    };

    if !response.status().is_success() {
        eprintln!(
            "unhealthy: server returned HTTP status {}",
            response.status()
        );
        std::process::exit(1);
    }

    let report: HealthReport = response.json().await?;
    if report.status != "healthy" {
        eprintln!("unhealthy: server reported status {}", report.status);
        std::process::exit(1);
    }

    match args.format {
        Format::Human => println!("healthy ({} backend)", report.backend),
        Format::Json => crate::output::print_json(&report)?,
    }
    Ok(())
}
