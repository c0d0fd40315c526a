pub mod types;

pub use types::{PictureSize, Pictures, UserRecord, VideoPage, VideoRecord};

use reelwatch_common::{Executor, Result, VideoItem};

const BASE_URL: &str = "https://api.vimeo.com";

/// Field selection for every listing call. Keeps response bodies small and
/// pins the shape `types::VideoRecord` decodes.
const FIELDS: &str = "uri,name,link,description,pictures.sizes,user.link,user.name,user.pictures.sizes,width,height,created_time,duration";

/// Client for the two Vimeo listing endpoints the poller consumes:
/// keyword search and per-user uploads, both newest-first.
pub struct VimeoClient {
    client: reqwest::Client,
    executor: Executor,
    token: String,
}

impl VimeoClient {
    pub fn new(token: String, executor: Executor) -> Self {
        Self {
            client: reqwest::Client::new(),
            executor,
            token,
        }
    }

    /// Search videos matching a keyword. Returned items carry the keyword
    /// as their match reason.
    pub async fn search(&self, query: &str, per_page: u32) -> Result<Vec<VideoItem>> {
        let url = format!("{BASE_URL}/videos");
        let per_page = per_page.to_string();
        let page: VideoPage = self
            .executor
            .get_json(|| {
                self.client.get(&url).bearer_auth(&self.token).query(&[
                    ("query", query),
                    ("per_page", per_page.as_str()),
                    ("fields", FIELDS),
                    ("sort", "date"),
                    ("direction", "desc"),
                ])
            })
            .await?;

        let items = types::normalize_page(page, query);
        tracing::info!(query, count = items.len(), "Fetched search results");
        Ok(items)
    }

    /// List a publisher's latest uploads. Returned items carry
    /// `User: {user_id}` as their match reason.
    pub async fn user_uploads(&self, user_id: &str, per_page: u32) -> Result<Vec<VideoItem>> {
        let url = format!("{BASE_URL}/users/{user_id}/videos");
        let per_page = per_page.to_string();
        let page: VideoPage = self
            .executor
            .get_json(|| {
                self.client.get(&url).bearer_auth(&self.token).query(&[
                    ("per_page", per_page.as_str()),
                    ("fields", FIELDS),
                    ("sort", "date"),
                    ("direction", "desc"),
                ])
            })
            .await?;

        let items = types::normalize_page(page, &format!("User: {user_id}"));
        tracing::info!(user_id, count = items.len(), "Fetched user uploads");
        Ok(items)
    }
}
