mod config;

use anyhow::Context;
use serde::Serialize;
use std::io::Write;

use nem12_insights::{Dashboard, RawTable};

#[derive(Serialize)]
struct Output<'a> {
    source: String,
    generated_at: String,
    dashboard: &'a Dashboard,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nem12_insights=info".into()),
        )
        .init();

    let cfg = config::Config::from_env()?;
    tracing::info!(path = %cfg.csv_path.display(), strategy = ?cfg.strategy, "Reading NEM12 file");

    let table = RawTable::from_path(&cfg.csv_path)
        .with_context(|| format!("failed to load {}", cfg.csv_path.display()))?;
    let dashboard = nem12_insights::analyze(&table, &cfg.strategy)?;

    tracing::info!(
        consumption = dashboard.summary.total_consumption,
        generation = dashboard.summary.total_generation,
        net = dashboard.summary.net,
        "Analysis complete"
    );

    let output = Output {
        source: cfg.csv_path.display().to_string(),
        generated_at: chrono::Utc::now()
            .with_timezone(&chrono_tz::Australia::Brisbane)
            .format("%Y-%m-%dT%H:%M:%S%:z")
            .to_string(),
        dashboard: &dashboard,
    };

    let json = if cfg.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &cfg.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote dashboard");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
