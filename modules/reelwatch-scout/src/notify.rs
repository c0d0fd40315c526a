// Converts normalized items into size-bounded webhook payloads.

use chrono::{DateTime, NaiveDateTime, Utc};

use discord_webhook::{
    Embed, EmbedAuthor, EmbedField, EmbedImage, WebhookPayload, MAX_DESCRIPTION_CHARS,
    MAX_EMBEDS_PER_MESSAGE, MAX_EMBED_TOTAL_CHARS, MAX_FIELD_VALUE_CHARS, MAX_TITLE_CHARS,
};
use reelwatch_common::VideoItem;

/// Truncate to a character budget, appending `...` when cut. Counts chars,
/// not bytes, so multibyte titles never split a codepoint.
pub fn trim_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Render seconds as H:MM:SS, `N/A` when unavailable.
pub fn format_duration(secs: Option<u64>) -> String {
    match secs {
        Some(s) => format!("{}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60),
        None => "N/A".to_string(),
    }
}

fn resolution(width: Option<u32>, height: Option<u32>) -> String {
    let fmt = |d: Option<u32>| d.map_or_else(|| "N/A".to_string(), |d| d.to_string());
    format!("{}x{}", fmt(width), fmt(height))
}

/// Accept an ISO-8601 creation time, tolerating a missing offset the way
/// the upstream sometimes emits it (naive instants are taken as UTC).
/// Unparseable input is dropped, never an error.
fn parse_timestamp(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).to_rfc3339());
    }
    NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().to_rfc3339())
}

/// Re-truncate the description so title + description + field texts stay
/// within the total embed ceiling. Last-resort clamp; runs after all
/// per-piece truncation.
fn clamp_to_total(title: &str, fields: &[EmbedField], description: String) -> String {
    let fixed: usize = title.chars().count()
        + fields
            .iter()
            .map(|f| f.name.chars().count() + f.value.chars().count())
            .sum::<usize>();
    if fixed + description.chars().count() <= MAX_EMBED_TOTAL_CHARS {
        return description;
    }
    trim_text(&description, MAX_EMBED_TOTAL_CHARS.saturating_sub(fixed))
}

/// Build one embed for an item, honoring every per-piece ceiling and the
/// total-size ceiling.
pub fn build_embed(item: &VideoItem) -> Embed {
    let title = trim_text(&item.title, MAX_TITLE_CHARS);
    let description = trim_text(&item.description, MAX_DESCRIPTION_CHARS);

    let fields = vec![
        EmbedField {
            name: "Matched Keyword".to_string(),
            value: trim_text(&item.match_reason, MAX_FIELD_VALUE_CHARS),
            inline: true,
        },
        EmbedField {
            name: "Resolution".to_string(),
            value: resolution(item.width, item.height),
            inline: true,
        },
        EmbedField {
            name: "Duration".to_string(),
            value: format_duration(item.duration_secs),
            inline: true,
        },
    ];

    let description = clamp_to_total(&title, &fields, description);

    Embed {
        title,
        url: item.link.clone(),
        description,
        image: item
            .thumbnail_url
            .clone()
            .map(|url| EmbedImage { url }),
        author: Some(EmbedAuthor {
            name: item.publisher_name.clone(),
            url: item.publisher_url.clone(),
            icon_url: item.publisher_avatar_url.clone(),
        }),
        fields,
        timestamp: item.created_time.as_deref().and_then(parse_timestamp),
    }
}

/// Split one match-reason group into webhook payloads, ten embeds apiece.
/// Only the first payload carries the leading content line; later chunks of
/// the same group carry embeds only.
pub fn build_batches(reason: &str, items: &[VideoItem]) -> Vec<WebhookPayload> {
    items
        .chunks(MAX_EMBEDS_PER_MESSAGE)
        .enumerate()
        .map(|(i, chunk)| WebhookPayload {
            content: (i == 0).then(|| format!("New videos matching {reason}")),
            embeds: chunk.iter().map(build_embed).collect(),
        })
        .collect()
}
