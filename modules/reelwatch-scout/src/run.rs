use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use discord_webhook::{WebhookClient, WebhookPayload};
use reelwatch_common::{Config, Executor, RetryPolicy, VideoItem};
use vimeo_client::VimeoClient;

use crate::ledger::Ledger;
use crate::notify;

/// Fetch seam for the upstream listing endpoints, so the run loop can be
/// exercised with a fake source.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search(&self, query: &str, per_page: u32) -> reelwatch_common::Result<Vec<VideoItem>>;
    async fn user_uploads(
        &self,
        user_id: &str,
        per_page: u32,
    ) -> reelwatch_common::Result<Vec<VideoItem>>;
}

#[async_trait]
impl VideoSource for VimeoClient {
    async fn search(&self, query: &str, per_page: u32) -> reelwatch_common::Result<Vec<VideoItem>> {
        VimeoClient::search(self, query, per_page).await
    }

    async fn user_uploads(
        &self,
        user_id: &str,
        per_page: u32,
    ) -> reelwatch_common::Result<Vec<VideoItem>> {
        VimeoClient::user_uploads(self, user_id, per_page).await
    }
}

/// Delivery seam for the webhook endpoint.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &WebhookPayload) -> reelwatch_common::Result<()>;
}

#[async_trait]
impl Notifier for WebhookClient {
    async fn send(&self, payload: &WebhookPayload) -> reelwatch_common::Result<()> {
        WebhookClient::send(self, payload).await
    }
}

/// Stats from one poll cycle.
#[derive(Debug, Default)]
pub struct RunStats {
    pub sources_polled: u32,
    pub sources_failed: u32,
    pub items_seen: u32,
    pub items_new: u32,
    pub batches_sent: u32,
    pub batches_failed: u32,
    pub links_committed: u32,
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Scout Run Complete ===")?;
        writeln!(f, "Sources polled:   {}", self.sources_polled)?;
        writeln!(f, "Sources failed:   {}", self.sources_failed)?;
        writeln!(f, "Items seen:       {}", self.items_seen)?;
        writeln!(f, "Items new:        {}", self.items_new)?;
        writeln!(f, "Batches sent:     {}", self.batches_sent)?;
        writeln!(f, "Batches failed:   {}", self.batches_failed)?;
        writeln!(f, "Links committed:  {}", self.links_committed)?;
        Ok(())
    }
}

/// Ties one poll cycle together: fetch, filter against the ledger, group,
/// format, deliver, persist.
pub struct Scout<S: VideoSource, N: Notifier> {
    config: Config,
    source: S,
    notifier: N,
}

impl Scout<VimeoClient, WebhookClient> {
    pub fn new(config: Config) -> Self {
        let vimeo = VimeoClient::new(
            config.vimeo_access_token.clone(),
            Executor::new(RetryPolicy::default()),
        );
        let webhook = WebhookClient::new(
            config.discord_webhook_url.clone(),
            Executor::new(RetryPolicy::default()),
        );
        Self::with_clients(config, vimeo, webhook)
    }
}

impl<S: VideoSource, N: Notifier> Scout<S, N> {
    pub fn with_clients(config: Config, source: S, notifier: N) -> Self {
        Self {
            config,
            source,
            notifier,
        }
    }

    /// Run one full cycle. Per-source and per-batch failures are contained
    /// here; the single ledger commit always runs once filtering has
    /// happened, so the file never regresses on partial failure.
    pub async fn run(&self) -> Result<RunStats> {
        let mut stats = RunStats::default();

        let mut ledger = Ledger::load(&self.config.ledger_path)?;
        info!(known = ledger.len(), "Ledger loaded");

        let items = self.poll_sources(&mut stats).await;
        stats.items_seen = items.len() as u32;

        let groups = group_new_items(&mut ledger, items);
        stats.items_new = groups.iter().map(|(_, members)| members.len() as u32).sum();

        if groups.is_empty() {
            info!("No new videos found");
        }

        for (reason, members) in &groups {
            let batches = notify::build_batches(reason, members);
            for (index, payload) in batches.iter().enumerate() {
                match self.notifier.send(payload).await {
                    Ok(()) => {
                        stats.batches_sent += 1;
                        info!(reason, batch = index + 1, embeds = payload.embeds.len(), "Batch delivered");
                    }
                    Err(e) => {
                        stats.batches_failed += 1;
                        warn!(reason, batch = index + 1, error = %e, "Batch delivery failed");
                        if !self.config.mark_failed_deliveries_seen {
                            for embed in &payload.embeds {
                                ledger.release(&embed.url);
                            }
                        }
                    }
                }
            }
        }

        stats.links_committed = ledger.commit()? as u32;
        info!(committed = stats.links_committed, "Ledger committed");

        Ok(stats)
    }

    /// Poll every configured keyword and publisher in order. A failed
    /// source is logged and skipped; a partial cycle beats a failed cycle.
    async fn poll_sources(&self, stats: &mut RunStats) -> Vec<VideoItem> {
        let mut items = Vec::new();

        for query in &self.config.search_queries {
            let query = query.trim();
            if query.is_empty() {
                continue;
            }
            stats.sources_polled += 1;
            match self.source.search(query, self.config.per_page).await {
                Ok(found) => items.extend(found),
                Err(e) => {
                    stats.sources_failed += 1;
                    warn!(query, error = %e, "Search poll failed, skipping");
                }
            }
        }

        for user_id in &self.config.monitored_users {
            let user_id = user_id.trim();
            if user_id.is_empty() {
                continue;
            }
            stats.sources_polled += 1;
            match self.source.user_uploads(user_id, self.config.per_page).await {
                Ok(found) => items.extend(found),
                Err(e) => {
                    stats.sources_failed += 1;
                    warn!(user_id, error = %e, "User uploads poll failed, skipping");
                }
            }
        }

        items
    }
}

/// Filter raw items against the ledger and group survivors by match reason.
/// First claim wins: an item surfaced by two sources in one run lands in the
/// group of whichever source found it first. Group order and member order
/// follow discovery order.
fn group_new_items(ledger: &mut Ledger, items: Vec<VideoItem>) -> Vec<(String, Vec<VideoItem>)> {
    let mut groups: Vec<(String, Vec<VideoItem>)> = Vec::new();
    for item in items {
        if !ledger.claim(&item.link) {
            continue;
        }
        match groups.iter_mut().find(|(reason, _)| *reason == item.match_reason) {
            Some((_, members)) => members.push(item),
            None => groups.push((item.match_reason.clone(), vec![item])),
        }
    }
    groups
}
