//! Canonical answer identity.
//!
//! Two annotators recording the same logical classification must produce
//! byte-identical identity keys for their votes to be matched across
//! sources. The canonical key (`fq_name`) is the precedence-sorted,
//! `&`-joined list of `question=answer` parts; precedence comes from the
//! ontology index, so the key is independent of the order parts arrive in.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::label_row::{AnswerPart, ClassificationAnswer, FrameClassification};
use crate::ontology::OntologyIndex;
use crate::types::Precedence;

// ---------------------------------------------------------------------------
// FQPart
// ---------------------------------------------------------------------------

/// One (question, answer) leaf of a canonicalized classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FQPart {
    pub question: String,
    pub answer: String,
    /// `"question=answer"`, the unit the canonical key is joined from.
    pub fq_part: String,
    /// Feature hash of the question node, used to resolve precedence.
    pub feature_hash: String,
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// A canonicalized classification answer.
///
/// Equality and hashing consider only `fq_name`: answers from different
/// sources with the same canonical key are the same answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The cross-source join key.
    pub fq_name: String,
    /// Parts in ascending precedence order.
    pub fq_parts: Vec<FQPart>,
    /// Display name of the classification attribute.
    pub name: String,
    /// Machine value of the classification attribute.
    pub value: String,
    /// Feature hash of the classification attribute.
    pub feature_hash: String,
    /// Raw answer payload carried through for export.
    pub payload: Vec<AnswerPart>,
}

impl PartialEq for Answer {
    fn eq(&self, other: &Self) -> bool {
        self.fq_name == other.fq_name
    }
}

impl Eq for Answer {}

impl Hash for Answer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fq_name.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Why a classification was excluded from consensus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A question part recorded more than one answer value; only
    /// single-valued answers participate in consensus.
    MultiValuedAnswer { question: String, answer_count: usize },
    /// A question part recorded no answer value at all.
    MissingAnswer { question: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultiValuedAnswer {
                question,
                answer_count,
            } => write!(
                f,
                "question '{question}' has {answer_count} recorded answers; only single-valued answers are supported"
            ),
            Self::MissingAnswer { question } => {
                write!(f, "question '{question}' has no recorded answer")
            }
        }
    }
}

/// Outcome of canonicalizing one classification instance.
#[derive(Debug, Clone)]
pub enum Canonicalization {
    /// The classification participates in consensus under this answer.
    Answer(Answer),
    /// The classification is unsupported and must be skipped with a
    /// data-quality warning.
    Skipped(SkipReason),
}

/// Canonicalize a frame classification against its side-table payload.
///
/// Parts are sorted ascending by ontology precedence before joining, so the
/// resulting `fq_name` does not depend on payload order. Ontology lookup
/// failures are fatal; unsupported answer shapes are reported as
/// [`Canonicalization::Skipped`] for the caller to record.
pub fn canonicalize_classification(
    entry: &FrameClassification,
    answer_entry: &ClassificationAnswer,
    index: &OntologyIndex,
) -> Result<Canonicalization, CoreError> {
    let mut parts: Vec<(FQPart, Precedence)> =
        Vec::with_capacity(answer_entry.classifications.len());

    for part in &answer_entry.classifications {
        let chosen = match part.answers.as_slice() {
            [single] => single,
            [] => {
                return Ok(Canonicalization::Skipped(SkipReason::MissingAnswer {
                    question: part.value.clone(),
                }))
            }
            many => {
                return Ok(Canonicalization::Skipped(SkipReason::MultiValuedAnswer {
                    question: part.value.clone(),
                    answer_count: many.len(),
                }))
            }
        };

        let precedence = index.precedence(&entry.feature_hash, &part.feature_hash)?;
        let question = part.value.clone();
        let answer = chosen.value.clone();
        let fq_part = format!("{question}={answer}");
        parts.push((
            FQPart {
                question,
                answer,
                fq_part,
                feature_hash: part.feature_hash.clone(),
            },
            precedence,
        ));
    }

    parts.sort_by_key(|(_, precedence)| *precedence);

    let fq_name = parts
        .iter()
        .map(|(part, _)| part.fq_part.as_str())
        .collect::<Vec<_>>()
        .join("&");
    let fq_parts = parts.into_iter().map(|(part, _)| part).collect();

    Ok(Canonicalization::Answer(Answer {
        fq_name,
        fq_parts,
        name: entry.name.clone(),
        value: entry.value.clone(),
        feature_hash: entry.feature_hash.clone(),
        payload: answer_entry.classifications.clone(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
