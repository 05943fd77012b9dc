//! Skill self-assessments: question trees and scoring.

mod question;
mod scoring;

pub use question::{
    AnswerOption, AssessmentType, OptionDraft, QuestionDraft, QuestionNode, QuestionTree,
    ReorderEntry,
};
pub use scoring::{
    aggregate_tags, score_submission, Answer, AssessmentResult, AssessmentScore,
    AssessmentSubmission, TagAggregate, TagScore,
};
