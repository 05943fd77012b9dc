//! Friends, friend requests and matches.

use serde::de::IgnoredAny;

use crate::domain::foundation::{FriendRequestId, UserId};
use crate::domain::social::{FriendRequest, FriendRequests, Match};
use crate::domain::user::UserProfile;
use crate::ports::ApiError;

use super::client::ApiClient;
use super::dto::FriendRequestBody;

/// `/friends/*` and `/matches` endpoints.
#[derive(Debug, Clone)]
pub struct FriendsClient {
    client: ApiClient,
}

impl FriendsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_friends(&self) -> Result<Vec<UserProfile>, ApiError> {
        self.client.get("/friends").await
    }

    pub async fn list_requests(&self) -> Result<FriendRequests, ApiError> {
        self.client.get("/friends/requests").await
    }

    pub async fn send_request(&self, user_id: &UserId) -> Result<FriendRequest, ApiError> {
        self.client
            .post(
                "/friends/requests",
                &FriendRequestBody {
                    user_id: user_id.as_str(),
                },
            )
            .await
    }

    pub async fn accept(&self, request_id: &FriendRequestId) -> Result<FriendRequest, ApiError> {
        self.respond(request_id, "accept").await
    }

    pub async fn reject(&self, request_id: &FriendRequestId) -> Result<FriendRequest, ApiError> {
        self.respond(request_id, "reject").await
    }

    pub async fn remove(&self, friend_id: &UserId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/friends/{}", friend_id))
            .await?;
        Ok(())
    }

    /// Searches users by name. A blank query returns no results without
    /// a request.
    pub async fn search(&self, query: &str) -> Result<Vec<UserProfile>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.client
            .get_with_query("/friends/search", &[("q", query)])
            .await
    }

    pub async fn list_matches(&self) -> Result<Vec<Match>, ApiError> {
        self.client.get("/matches").await
    }

    async fn respond(
        &self,
        request_id: &FriendRequestId,
        action: &str,
    ) -> Result<FriendRequest, ApiError> {
        let path = format!("/friends/requests/{}/{}", request_id, action);
        self.client
            .request(reqwest::Method::POST, &path, Default::default())
            .await
    }
}
