use serde::Deserialize;
use serde_json::Value;

use reelwatch_common::VideoItem;

/// One page of a listing response.
#[derive(Debug, Deserialize)]
pub struct VideoPage {
    #[serde(default)]
    pub data: Vec<VideoRecord>,
}

/// Raw video record as Vimeo returns it. Every nested field is optional;
/// normalization decides what degrades to a placeholder and what makes the
/// record unusable.
#[derive(Debug, Deserialize)]
pub struct VideoRecord {
    pub link: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Usually an integer second count, but left loose so a stray float or
    /// string degrades to "unavailable" instead of failing the whole page.
    pub duration: Option<Value>,
    pub created_time: Option<String>,
    pub pictures: Option<Pictures>,
    pub user: Option<UserRecord>,
}

#[derive(Debug, Deserialize)]
pub struct Pictures {
    #[serde(default)]
    pub sizes: Vec<PictureSize>,
}

/// Sizes are ranked smallest to largest; the last entry is the
/// highest-resolution variant.
#[derive(Debug, Deserialize)]
pub struct PictureSize {
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserRecord {
    pub name: Option<String>,
    pub link: Option<String>,
    pub pictures: Option<Pictures>,
}

impl VideoRecord {
    /// Normalize into the shared item shape, tagged with the query or
    /// publisher that surfaced it. Returns `None` when the record has no
    /// link: the link is the dedup key, so the record is unusable.
    pub fn into_item(self, match_reason: &str) -> Option<VideoItem> {
        let link = self.link?;

        let (publisher_name, publisher_url, publisher_avatar_url) = match self.user {
            Some(user) => (
                user.name.unwrap_or_else(|| "Unknown publisher".to_string()),
                user.link,
                highest_resolution(user.pictures),
            ),
            None => ("Unknown publisher".to_string(), None, None),
        };

        Some(VideoItem {
            link,
            title: self.name.unwrap_or_else(|| "No title".to_string()),
            description: self.description.unwrap_or_default(),
            thumbnail_url: highest_resolution(self.pictures),
            width: self.width,
            height: self.height,
            duration_secs: coerce_duration(self.duration),
            created_time: self.created_time,
            publisher_name,
            publisher_url,
            publisher_avatar_url,
            match_reason: match_reason.to_string(),
        })
    }
}

pub(crate) fn normalize_page(page: VideoPage, match_reason: &str) -> Vec<VideoItem> {
    page.data
        .into_iter()
        .filter_map(|record| record.into_item(match_reason))
        .collect()
}

fn highest_resolution(pictures: Option<Pictures>) -> Option<String> {
    let mut sizes = pictures?.sizes;
    sizes.pop()?.link
}

/// Coerce an upstream duration to whole seconds. Integers pass through,
/// floats round down, numeric strings parse; anything else is unavailable.
fn coerce_duration(value: Option<Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> VideoRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_record_normalizes() {
        let rec = record(json!({
            "link": "https://vimeo.com/123",
            "name": "Summit Push",
            "description": "An alpine film.",
            "width": 1920,
            "height": 1080,
            "duration": 754,
            "created_time": "2026-02-10T08:30:00+00:00",
            "pictures": { "sizes": [
                { "link": "https://i.vimeocdn.com/small" },
                { "link": "https://i.vimeocdn.com/large" }
            ]},
            "user": {
                "name": "Alpine Films",
                "link": "https://vimeo.com/alpinefilms",
                "pictures": { "sizes": [{ "link": "https://i.vimeocdn.com/avatar" }] }
            }
        }));

        let item = rec.into_item("alpine").unwrap();
        assert_eq!(item.link, "https://vimeo.com/123");
        assert_eq!(item.title, "Summit Push");
        assert_eq!(item.thumbnail_url.as_deref(), Some("https://i.vimeocdn.com/large"));
        assert_eq!(item.duration_secs, Some(754));
        assert_eq!(item.publisher_name, "Alpine Films");
        assert_eq!(item.publisher_avatar_url.as_deref(), Some("https://i.vimeocdn.com/avatar"));
        assert_eq!(item.match_reason, "alpine");
    }

    #[test]
    fn record_without_link_is_dropped() {
        let rec = record(json!({ "name": "No link here" }));
        assert!(rec.into_item("alpine").is_none());
    }

    #[test]
    fn missing_nested_fields_degrade_to_placeholders() {
        let rec = record(json!({ "link": "https://vimeo.com/456" }));
        let item = rec.into_item("alpine").unwrap();
        assert_eq!(item.title, "No title");
        assert_eq!(item.description, "");
        assert_eq!(item.publisher_name, "Unknown publisher");
        assert!(item.thumbnail_url.is_none());
        assert!(item.publisher_avatar_url.is_none());
        assert!(item.width.is_none());
    }

    #[test]
    fn duration_coercion() {
        assert_eq!(coerce_duration(Some(json!(90))), Some(90));
        assert_eq!(coerce_duration(Some(json!(90.9))), Some(90));
        assert_eq!(coerce_duration(Some(json!("120"))), Some(120));
        assert_eq!(coerce_duration(Some(json!("soon"))), None);
        assert_eq!(coerce_duration(Some(json!(null))), None);
        assert_eq!(coerce_duration(None), None);
    }

    #[test]
    fn page_normalization_skips_unusable_records() {
        let page: VideoPage = serde_json::from_value(json!({
            "data": [
                { "link": "https://vimeo.com/1", "name": "One" },
                { "name": "Linkless" },
                { "link": "https://vimeo.com/2", "name": "Two" }
            ]
        }))
        .unwrap();

        let items = normalize_page(page, "User: staffpicks");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, "https://vimeo.com/1");
        assert_eq!(items[1].link, "https://vimeo.com/2");
        assert!(items.iter().all(|i| i.match_reason == "User: staffpicks"));
    }
}
