use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded once from environment variables and
/// passed to every component. No ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    // Upstream (Vimeo)
    pub vimeo_access_token: String,
    pub search_queries: Vec<String>,
    pub monitored_users: Vec<String>,
    /// Upstream page size per query/publisher poll.
    pub per_page: u32,

    // Downstream (Discord webhook)
    pub discord_webhook_url: String,

    // Persistence
    pub ledger_path: PathBuf,
    /// When true (default), items whose notification delivery failed are
    /// still committed as seen; when false they stay unseen and the next
    /// run retries delivery.
    pub mark_failed_deliveries_seen: bool,

    // Single-instance lock
    pub lock_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            vimeo_access_token: std::env::var("VIMEO_ACCESS_TOKEN")
                .context("VIMEO_ACCESS_TOKEN is required")?,
            search_queries: split_list(&std::env::var("SEARCH_QUERIES").unwrap_or_default()),
            monitored_users: split_list(&std::env::var("MONITORED_USERS").unwrap_or_default()),
            per_page: std::env::var("PER_PAGE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("PER_PAGE must be a number")?,
            discord_webhook_url: std::env::var("DISCORD_WEBHOOK_URL")
                .context("DISCORD_WEBHOOK_URL is required")?,
            ledger_path: std::env::var("KNOWN_LINKS_FILE")
                .context("KNOWN_LINKS_FILE is required")?
                .into(),
            mark_failed_deliveries_seen: std::env::var("MARK_FAILED_DELIVERIES_SEEN")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            lock_path: std::env::var("LOCK_FILE")
                .unwrap_or_else(|_| "/tmp/reelwatch-scout.lock".to_string())
                .into(),
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  VIMEO_ACCESS_TOKEN: {}", preview(&self.vimeo_access_token));
        tracing::info!("  DISCORD_WEBHOOK_URL: {}", preview(&self.discord_webhook_url));
        tracing::info!("  SEARCH_QUERIES: {} entries", self.search_queries.len());
        tracing::info!("  MONITORED_USERS: {} entries", self.monitored_users.len());
        tracing::info!("  PER_PAGE: {}", self.per_page);
        tracing::info!("  KNOWN_LINKS_FILE: {}", self.ledger_path.display());
        tracing::info!(
            "  MARK_FAILED_DELIVERIES_SEEN: {}",
            self.mark_failed_deliveries_seen
        );
    }
}

/// Redacted secret preview for the startup log. Counts chars, not bytes,
/// so a value opening with a multibyte character cannot split a codepoint.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{head}...({} chars)", val.len())
}

/// Comma-separated list, entries trimmed. Blank entries are kept here and
/// skipped by the poller, so a stray trailing comma is visible in the logs
/// rather than silently swallowed.
fn split_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_char_boundary_safe() {
        assert_eq!(preview("ünterwegs-token"), "ünter...(16 chars)");
        assert_eq!(preview("ab"), "ab...(2 chars)");
        assert_eq!(preview(""), "...(0 chars)");
    }

    #[test]
    fn split_list_trims_and_keeps_blanks() {
        assert_eq!(
            split_list("climbing, alpine film ,,trail running"),
            vec!["climbing", "alpine film", "", "trail running"]
        );
        assert!(split_list("").is_empty());
        assert!(split_list("   ").is_empty());
    }
}
