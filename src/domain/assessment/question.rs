//! Assessment question tree.
//!
//! Questions form a tree: a top-level question may carry follow-up
//! questions as children. Siblings are displayed by ascending `order`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, OptionId, QuestionId};

/// Kind of assessment a question tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Skills,
    Interests,
}

impl AssessmentType {
    /// Path segment used by the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Skills => "skills",
            AssessmentType::Interests => "interests",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
    pub id: OptionId,
    pub label: String,
    pub points: u32,
}

/// A question and its follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionNode {
    pub id: QuestionId,
    pub prompt: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub children: Vec<QuestionNode>,
}

impl QuestionNode {
    /// Highest points any option of this question awards.
    pub fn max_points(&self) -> u32 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }

    /// Looks up an option by id.
    pub fn option(&self, id: &OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|o| &o.id == id)
    }
}

/// New or edited question (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub assessment_type: AssessmentType,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<QuestionId>,
    pub order: u32,
    pub options: Vec<OptionDraft>,
    pub tags: Vec<String>,
}

/// New or edited answer option (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionDraft {
    pub label: String,
    pub points: u32,
}

/// One entry of a bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderEntry {
    pub id: QuestionId,
    pub order: u32,
}

/// The full question tree of one assessment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTree {
    pub assessment_type: AssessmentType,
    #[serde(default)]
    pub questions: Vec<QuestionNode>,
}

impl QuestionTree {
    /// Creates a tree, sorting every sibling list by order.
    pub fn new(assessment_type: AssessmentType, questions: Vec<QuestionNode>) -> Self {
        let mut tree = Self {
            assessment_type,
            questions,
        };
        sort_siblings(&mut tree.questions);
        tree
    }

    /// Depth-first iteration over every question.
    pub fn iter(&self) -> impl Iterator<Item = &QuestionNode> {
        let mut stack: Vec<&QuestionNode> = self.questions.iter().rev().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Number of questions at every depth.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Looks up a question anywhere in the tree.
    pub fn find(&self, id: &QuestionId) -> Option<&QuestionNode> {
        self.iter().find(|q| &q.id == id)
    }

    /// Applies a bulk reorder locally, mirroring what the server will do.
    ///
    /// Every id must exist and appear at most once. Questions not listed
    /// keep their order.
    pub fn apply_reorder(&mut self, entries: &[ReorderEntry]) -> Result<(), DomainError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(&entry.id) {
                return Err(DomainError::new(
                    ErrorCode::DuplicateEntry,
                    "Question listed twice in reorder",
                )
                .with_detail("question_id", entry.id.as_str()));
            }
            if self.find(&entry.id).is_none() {
                return Err(DomainError::new(
                    ErrorCode::QuestionNotFound,
                    "Question not found",
                )
                .with_detail("question_id", entry.id.as_str()));
            }
        }

        let orders: HashMap<&QuestionId, u32> =
            entries.iter().map(|e| (&e.id, e.order)).collect();
        assign_orders(&mut self.questions, &orders);
        sort_siblings(&mut self.questions);
        Ok(())
    }
}

fn assign_orders(nodes: &mut [QuestionNode], orders: &HashMap<&QuestionId, u32>) {
    for node in nodes {
        if let Some(order) = orders.get(&node.id) {
            node.order = *order;
        }
        assign_orders(&mut node.children, orders);
    }
}

fn sort_siblings(nodes: &mut [QuestionNode]) {
    nodes.sort_by_key(|n| n.order);
    for node in nodes {
        sort_siblings(&mut node.children);
    }
}
