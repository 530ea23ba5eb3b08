use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use nem12_insights::data::blocks::DEFAULT_TAG_COLUMN;
use nem12_insights::BlockStrategy;

pub struct Config {
    pub csv_path: PathBuf,
    pub strategy: BlockStrategy,
    pub output: Option<PathBuf>,
    pub pretty: bool,
}

impl Config {
    /// Read settings from the environment; a first CLI argument overrides
    /// `NEM12_CSV`.
    pub fn from_env() -> Result<Self> {
        let csv_path = std::env::args()
            .nth(1)
            .or_else(|| std::env::var("NEM12_CSV").ok())
            .map(PathBuf::from)
            .context("no input file: pass a path or set NEM12_CSV")?;

        let strategy = match std::env::var("NEM12_STRATEGY")
            .unwrap_or_else(|_| "positional".into())
            .to_ascii_lowercase()
            .as_str()
        {
            "positional" => BlockStrategy::Positional,
            "tagged" => BlockStrategy::Tagged {
                column: match std::env::var("NEM12_CHANNEL_COLUMN") {
                    Ok(s) => s
                        .parse()
                        .with_context(|| format!("NEM12_CHANNEL_COLUMN {s:?} is not a column index"))?,
                    Err(_) => DEFAULT_TAG_COLUMN,
                },
                consumption_tag: std::env::var("NEM12_CONSUMPTION_TAG").unwrap_or_else(|_| "E1".into()),
                generation_tag: std::env::var("NEM12_GENERATION_TAG").unwrap_or_else(|_| "B1".into()),
            },
            other => bail!("NEM12_STRATEGY must be 'positional' or 'tagged', got {other:?}"),
        };

        Ok(Self {
            csv_path,
            strategy,
            output: std::env::var("NEM12_OUTPUT").ok().map(PathBuf::from),
            pretty: std::env::var("NEM12_PRETTY")
                .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}
