//! Run command implementation

use crate::config::Config;
use crate::monitor::Monitor;
use crate::report::ReportFormat;
use clap::{Args, ValueEnum};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override race.blocks_per_aggregate
    #[arg(long)]
    pub blocks_per_aggregate: Option<u64>,

    /// Override report.format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(n) = self.blocks_per_aggregate {
            config.race.blocks_per_aggregate = n;
        }
        if let Some(format) = self.format {
            config.report.format = format.into();
        }
    }

    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        self.apply(&mut config);
        let monitor = Monitor::from_config(&config)?;

        tracing::info!("Racing block feeds, press Ctrl-C to stop");
        let snapshot = monitor
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await?;

        tracing::info!(blocks = snapshot.block_count, "Race finished");
        Ok(())
    }
}
