/// One upstream video record, normalized from the provider's wire shape.
///
/// `link` is the stable identifier and the dedup key; a record without one
/// is unusable and never becomes a `VideoItem`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoItem {
    pub link: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in whole seconds. None when the upstream value is missing
    /// or not coercible to an integer.
    pub duration_secs: Option<u64>,
    /// Raw upstream creation timestamp. Parsed (or dropped) at format time.
    pub created_time: Option<String>,
    pub publisher_name: String,
    pub publisher_url: Option<String>,
    pub publisher_avatar_url: Option<String>,
    /// The keyword or publisher id that surfaced this item.
    pub match_reason: String,
}
