//! Assessment scoring and tag aggregation.
//!
//! Scoring is plain arithmetic: the chosen option's points against the best
//! option's points, summed over answered questions. Every tag of a question
//! accumulates the same numbers, giving per-tag series for skill charts.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, OptionId, QuestionId, Timestamp, UserId};

use super::question::{AssessmentType, QuestionTree};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// Points earned against points available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagScore {
    pub points: u32,
    pub max_points: u32,
}

impl TagScore {
    /// Share of available points, 0-100. Zero when nothing was available.
    pub fn percentage(&self) -> f64 {
        percentage(self.points, self.max_points)
    }
}

/// Score of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentScore {
    pub total_points: u32,
    pub max_points: u32,
    pub percentage: f64,
    #[serde(default)]
    pub by_tag: BTreeMap<String, TagScore>,
}

/// Answers sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSubmission {
    pub assessment_type: AssessmentType,
    pub answers: Vec<Answer>,
    pub score: AssessmentScore,
}

/// A stored submission as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub user_id: UserId,
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub score: AssessmentScore,
    #[serde(default)]
    pub submitted_at: Option<Timestamp>,
}

/// Averaged tag percentage across several results.
#[derive(Debug, Clone, PartialEq)]
pub struct TagAggregate {
    pub tag: String,
    pub average_percentage: f64,
    pub samples: usize,
}

/// Scores `answers` against `tree`.
///
/// # Errors
///
/// - `QuestionNotFound` if an answer names a question outside the tree
/// - `OptionNotFound` if the chosen option does not belong to the question
/// - `DuplicateEntry` if a question is answered twice
pub fn score_submission(tree: &QuestionTree, answers: &[Answer]) -> Result<AssessmentScore, DomainError> {
    let mut answered = HashSet::with_capacity(answers.len());
    let mut total_points = 0u32;
    let mut max_points = 0u32;
    let mut by_tag: BTreeMap<String, TagScore> = BTreeMap::new();

    for answer in answers {
        if !answered.insert(&answer.question_id) {
            return Err(DomainError::new(ErrorCode::DuplicateEntry, "Question answered twice")
                .with_detail("question_id", answer.question_id.as_str()));
        }
        let question = tree.find(&answer.question_id).ok_or_else(|| {
            DomainError::new(ErrorCode::QuestionNotFound, "Question not found")
                .with_detail("question_id", answer.question_id.as_str())
        })?;
        let option = question.option(&answer.option_id).ok_or_else(|| {
            DomainError::new(ErrorCode::OptionNotFound, "Option not found")
                .with_detail("question_id", answer.question_id.as_str())
                .with_detail("option_id", answer.option_id.as_str())
        })?;

        let best = question.max_points();
        total_points += option.points;
        max_points += best;
        for tag in &question.tags {
            let entry = by_tag.entry(tag.clone()).or_default();
            entry.points += option.points;
            entry.max_points += best;
        }
    }

    Ok(AssessmentScore {
        total_points,
        max_points,
        percentage: percentage(total_points, max_points),
        by_tag,
    })
}

/// Averages each tag's percentage across `scores`, sorted by tag name.
pub fn aggregate_tags<'a, I>(scores: I) -> Vec<TagAggregate>
where
    I: IntoIterator<Item = &'a AssessmentScore>,
{
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for score in scores {
        for (tag, tag_score) in &score.by_tag {
            let entry = sums.entry(tag.as_str()).or_insert((0.0, 0));
            entry.0 += tag_score.percentage();
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(tag, (sum, samples))| TagAggregate {
            tag: tag.to_string(),
            average_percentage: sum / samples as f64,
            samples,
        })
        .collect()
}

fn percentage(points: u32, max_points: u32) -> f64 {
    if max_points == 0 {
        return 0.0;
    }
    f64::from(points) / f64::from(max_points) * 100.0
}
