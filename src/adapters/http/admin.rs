//! Admin endpoints for editing assessment question trees.

use serde::de::IgnoredAny;
use serde::Serialize;

use crate::domain::assessment::{
    AssessmentType, QuestionDraft, QuestionNode, QuestionTree, ReorderEntry,
};
use crate::domain::foundation::QuestionId;
use crate::ports::ApiError;

use super::client::ApiClient;

#[derive(Debug, Serialize)]
struct ReorderRequest<'a> {
    entries: &'a [ReorderEntry],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestoreDefaultsRequest {
    assessment_type: AssessmentType,
}

/// `/admin/questions/*` endpoints.
#[derive(Debug, Clone)]
pub struct AdminQuestionsClient {
    client: ApiClient,
}

impl AdminQuestionsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn fetch_tree(&self, assessment_type: AssessmentType) -> Result<QuestionTree, ApiError> {
        let questions: Vec<QuestionNode> = self
            .client
            .get_with_query("/admin/questions", &[("type", assessment_type.as_str())])
            .await?;
        Ok(QuestionTree::new(assessment_type, questions))
    }

    pub async fn create(&self, draft: &QuestionDraft) -> Result<QuestionNode, ApiError> {
        self.client.post("/admin/questions", draft).await
    }

    pub async fn update(
        &self,
        question_id: &QuestionId,
        draft: &QuestionDraft,
    ) -> Result<QuestionNode, ApiError> {
        self.client
            .put(&format!("/admin/questions/{}", question_id), draft)
            .await
    }

    pub async fn delete(&self, question_id: &QuestionId) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .client
            .delete(&format!("/admin/questions/{}", question_id))
            .await?;
        Ok(())
    }

    /// Validates `entries` against `tree`, applies them locally and sends
    /// the reorder. `tree` is left untouched if validation fails.
    pub async fn reorder(
        &self,
        tree: &mut QuestionTree,
        entries: &[ReorderEntry],
    ) -> Result<(), ApiError> {
        let mut reordered = tree.clone();
        reordered
            .apply_reorder(entries)
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;

        let _: IgnoredAny = self
            .client
            .put("/admin/questions/reorder", &ReorderRequest { entries })
            .await?;

        *tree = reordered;
        Ok(())
    }

    /// Replaces the tree with the server's built-in defaults.
    pub async fn restore_defaults(
        &self,
        assessment_type: AssessmentType,
    ) -> Result<QuestionTree, ApiError> {
        let questions: Vec<QuestionNode> = self
            .client
            .post(
                "/admin/questions/restore-defaults",
                &RestoreDefaultsRequest { assessment_type },
            )
            .await?;
        Ok(QuestionTree::new(assessment_type, questions))
    }
}
