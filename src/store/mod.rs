//! Document store adapter.
//!
//! The store executes raw queries only; scoring belongs to the engines.
//! [`DocumentStore`] is the seam the engines search through, and
//! [`memory::JsonResumeStore`] is the snapshot-backed implementation the
//! service runs on.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::ResumeDocument;

/// Text fields a keyword plan may match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Text,
    Name,
    Email,
    Skills,
    Role,
    Company,
}

impl TextField {
    /// All queryable fields, in match-priority order.
    pub const ALL: [TextField; 6] = [
        TextField::Text,
        TextField::Name,
        TextField::Email,
        TextField::Skills,
        TextField::Role,
        TextField::Company,
    ];
}

/// A disjunctive keyword query: one case-insensitive pattern applied to a
/// set of fields. A document matches when any listed field matches.
#[derive(Debug, Clone)]
pub struct KeywordQueryPlan {
    /// Alternation pattern built from the query tokens (already escaped).
    pub pattern: String,
    pub fields: Vec<TextField>,
}

impl KeywordQueryPlan {
    pub fn all_fields(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            fields: TextField::ALL.to_vec(),
        }
    }
}

/// Read-side adapter over the resume index. Shared across all requests and
/// safe for concurrent use. No retries; transport errors surface as
/// [`StoreError`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a keyword plan and return up to `limit` matching documents with no
    /// score, in deterministic order for a fixed snapshot.
    async fn keyword_query(
        &self,
        plan: &KeywordQueryPlan,
        limit: usize,
    ) -> Result<Vec<ResumeDocument>, StoreError>;

    /// Nearest-neighbour search returning raw cosine similarities, ordered
    /// descending. Fails with [`StoreError::VectorIndexUnavailable`] when the
    /// index was never built.
    async fn vector_query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<(ResumeDocument, f32)>, StoreError>;
}

/// Read the value of one text field for matching.
pub(crate) fn field_text(doc: &ResumeDocument, field: TextField) -> std::borrow::Cow<'_, str> {
    use std::borrow::Cow;
    match field {
        TextField::Text => Cow::Borrowed(doc.text.as_str()),
        TextField::Name => Cow::Borrowed(doc.name.as_str()),
        TextField::Email => Cow::Borrowed(doc.email.as_str()),
        TextField::Skills => Cow::Owned(doc.skills.join(", ")),
        TextField::Role => Cow::Borrowed(doc.role.as_str()),
        TextField::Company => Cow::Borrowed(doc.company.as_str()),
    }
}
