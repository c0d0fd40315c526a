pub mod embed;

pub use embed::{Embed, EmbedAuthor, EmbedField, EmbedImage, WebhookPayload};

use reelwatch_common::{Executor, Result};

/// Discord webhook ceilings. One message carries at most ten embeds, and an
/// embed's title, description and field texts must sum to at most 6000
/// characters.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;
pub const MAX_EMBED_TOTAL_CHARS: usize = 6000;
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;

/// Delivery client for one webhook URL. Retries and 429 pacing live in the
/// executor; this crate owns the payload shape.
pub struct WebhookClient {
    client: reqwest::Client,
    executor: Executor,
    url: String,
}

impl WebhookClient {
    pub fn new(url: String, executor: Executor) -> Self {
        Self {
            client: reqwest::Client::new(),
            executor,
            url,
        }
    }

    /// Deliver one message. Success is a bare signal; Discord returns no
    /// body worth decoding on a webhook POST.
    pub async fn send(&self, payload: &WebhookPayload) -> Result<()> {
        tracing::debug!(embeds = payload.embeds.len(), "Posting webhook message");
        self.executor
            .post(|| self.client.post(&self.url).json(payload))
            .await
    }
}
