use serde::Serialize;

/// One webhook message: optional leading text plus up to ten embeds.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

/// One rich-message block. Optional pieces are skipped on the wire rather
/// than sent as nulls; Discord rejects explicit-null subobjects.
#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    pub fields: Vec<EmbedField>,
    /// ISO-8601 instant. Present only when the upstream creation time parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_optionals_are_omitted_from_the_wire() {
        let payload = WebhookPayload {
            content: None,
            embeds: vec![Embed {
                title: "Summit Push".to_string(),
                url: "https://vimeo.com/123".to_string(),
                description: String::new(),
                image: None,
                author: None,
                fields: Vec::new(),
                timestamp: None,
            }],
        };

        let wire = serde_json::to_value(&payload).unwrap();
        assert!(wire.get("content").is_none());
        let embed = &wire["embeds"][0];
        assert!(embed.get("timestamp").is_none());
        assert!(embed.get("image").is_none());
        assert!(embed.get("author").is_none());
        assert_eq!(embed["title"], "Summit Push");
    }

    #[test]
    fn author_icon_is_omitted_when_unknown() {
        let author = EmbedAuthor {
            name: "Alpine Films".to_string(),
            url: Some("https://vimeo.com/alpinefilms".to_string()),
            icon_url: None,
        };
        let wire = serde_json::to_value(&author).unwrap();
        assert!(wire.get("icon_url").is_none());
        assert_eq!(wire["url"], "https://vimeo.com/alpinefilms");
    }
}
