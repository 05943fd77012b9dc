//! Assessment submission and history.

use crate::domain::assessment::{
    score_submission, Answer, AssessmentResult, AssessmentSubmission, AssessmentType,
    QuestionTree,
};
use crate::domain::foundation::UserId;
use crate::ports::ApiError;

use super::client::ApiClient;

/// `/assessments/*` endpoints.
#[derive(Debug, Clone)]
pub struct AssessmentClient {
    client: ApiClient,
}

impl AssessmentClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn submit(
        &self,
        submission: &AssessmentSubmission,
    ) -> Result<AssessmentResult, ApiError> {
        self.client.post("/assessments", submission).await
    }

    /// Scores `answers` against `tree` locally, then submits them.
    pub async fn score_and_submit(
        &self,
        tree: &QuestionTree,
        answers: Vec<Answer>,
    ) -> Result<AssessmentResult, ApiError> {
        let score = score_submission(tree, &answers)
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        let submission = AssessmentSubmission {
            assessment_type: tree.assessment_type,
            answers,
            score,
        };
        self.submit(&submission).await
    }

    /// All stored results of one type for one user, oldest first.
    pub async fn fetch(
        &self,
        assessment_type: AssessmentType,
        user_id: &UserId,
    ) -> Result<Vec<AssessmentResult>, ApiError> {
        self.client
            .get(&format!("/assessments/{}/users/{}", assessment_type, user_id))
            .await
    }
}
