//! News feed endpoints.

use serde::de::IgnoredAny;

use crate::domain::community::{LinkPreview, NewsDraft, NewsPost, UploadedImage};
use crate::domain::foundation::NewsId;
use crate::ports::ApiError;

use super::client::{ApiClient, FilePart, RequestBody};

/// `/news/*` endpoints.
#[derive(Debug, Clone)]
pub struct NewsClient {
    client: ApiClient,
}

impl NewsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<NewsPost>, ApiError> {
        self.client.get("/news").await
    }

    pub async fn create(&self, draft: &NewsDraft) -> Result<NewsPost, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client.post("/news", draft).await
    }

    pub async fn update(&self, news_id: &NewsId, draft: &NewsDraft) -> Result<NewsPost, ApiError> {
        draft
            .validate()
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        self.client.put(&format!("/news/{}", news_id), draft).await
    }

    pub async fn delete(&self, news_id: &NewsId) -> Result<(), ApiError> {
        let _: IgnoredAny = self.client.delete(&format!("/news/{}", news_id)).await?;
        Ok(())
    }

    /// Uploads an image (field `image`) and returns its hosted URL.
    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedImage, ApiError> {
        let body = RequestBody::file(FilePart::new("image", file_name, content_type, bytes));
        self.client
            .request(reqwest::Method::POST, "/news/upload-image", body)
            .await
    }

    /// Asks the server to scrape title/description/image for `url`.
    pub async fn link_preview(&self, url: &str) -> Result<LinkPreview, ApiError> {
        self.client
            .get_with_query("/news/link-preview", &[("url", url)])
            .await
    }
}
