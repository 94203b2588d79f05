//! Race monitor
//!
//! Connects one [`BlockFeed`] per contestant to a shared
//! [`SettlementEngine`] and runs until shutdown.

use crate::authority::HttpTimeAuthority;
use crate::config::{Config, ConfigError};
use crate::feed::{BlockFeed, NewHeadsFeed};
use crate::race::{AggregateSnapshot, SettlementEngine};
use crate::report::{stdout_reporter, Reporter};
use crate::ws::WsConfig;
use futures_util::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// How often outstanding work is logged
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on waiting for queued settlements at shutdown
const FLUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Feeds plus the engine they report into
pub struct Monitor {
    engine: Arc<SettlementEngine>,
    feeds: Vec<Box<dyn BlockFeed>>,
    reporter: Arc<dyn Reporter>,
    status_interval: Duration,
}

impl Monitor {
    pub fn new(
        engine: Arc<SettlementEngine>,
        feeds: Vec<Box<dyn BlockFeed>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            engine,
            feeds,
            reporter,
            status_interval: STATUS_INTERVAL,
        }
    }

    /// Build the live setup described by `config`: a `newHeads` feed per
    /// contestant and timestamps from the primary's HTTP endpoint
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        config.validate()?;
        let roster = config.roster()?;

        let primary = config
            .primary()
            .ok_or_else(|| ConfigError::UnknownPrimary(config.race.primary.clone()))?;
        let http_url = primary
            .http_url
            .as_deref()
            .ok_or_else(|| ConfigError::PrimaryWithoutHttpUrl(primary.name.clone()))?;
        let authority = HttpTimeAuthority::new(http_url, config.feed.request_timeout())?;

        let feeds: Vec<Box<dyn BlockFeed>> = roster
            .ids()
            .zip(&config.contestants)
            .map(|(id, contestant)| {
                Box::new(NewHeadsFeed::new(
                    id,
                    contestant.name.clone(),
                    WsConfig::from_feed(contestant.ws_url.clone(), &config.feed),
                )) as Box<dyn BlockFeed>
            })
            .collect();

        let reporter = stdout_reporter(config.report.format);
        let engine = SettlementEngine::new(
            roster,
            Arc::new(authority),
            Arc::clone(&reporter),
            config.race.blocks_per_aggregate,
        );

        tracing::info!(
            contestants = config.contestants.len(),
            primary = %primary.name,
            blocks_per_aggregate = config.race.blocks_per_aggregate,
            "Race configured"
        );

        Ok(Self::new(Arc::new(engine), feeds, reporter))
    }

    /// Set how often outstanding work is logged
    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    /// The engine arrivals are fed into
    pub fn engine(&self) -> &Arc<SettlementEngine> {
        &self.engine
    }

    /// Race until `shutdown` resolves or every feed has ended
    ///
    /// Settlements already queued are allowed to finish; the final
    /// aggregate snapshot is reported and returned.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> anyhow::Result<AggregateSnapshot> {
        let mut forwarders = Vec::with_capacity(self.feeds.len());
        for feed in &self.feeds {
            let mut notices = feed.subscribe().await?;
            let engine = Arc::clone(&self.engine);
            forwarders.push(tokio::spawn(async move {
                while let Some(notice) = notices.recv().await {
                    engine.on_arrival(
                        notice.contestant,
                        notice.block,
                        notice.received_at.timestamp_millis(),
                    );
                }
            }));
        }
        let aborts: Vec<_> = forwarders.iter().map(|f| f.abort_handle()).collect();

        let feeds_done = join_all(forwarders);
        tokio::pin!(shutdown);
        tokio::pin!(feeds_done);

        let mut status = tokio::time::interval(self.status_interval);
        status.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        status.tick().await;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = &mut feeds_done => {
                    tracing::warn!("All block feeds ended");
                    break;
                }
                _ = status.tick() => {
                    tracing::info!(
                        pending_blocks = self.engine.pending_blocks(),
                        queued_settlements = self.engine.queued_settlements(),
                        settled = self.engine.snapshot().block_count,
                        "Race status"
                    );
                }
            }
        }

        for abort in aborts {
            abort.abort();
        }

        if tokio::time::timeout(FLUSH_TIMEOUT, self.engine.flush())
            .await
            .is_err()
        {
            tracing::warn!(
                queued_settlements = self.engine.queued_settlements(),
                "Gave up waiting for queued settlements"
            );
        }

        let snapshot = self.engine.snapshot();
        self.reporter.aggregate(&snapshot);
        Ok(snapshot)
    }
}
