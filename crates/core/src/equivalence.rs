use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The model's disposition for one proposed equivalence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Granted,
    Denied,
}

impl Verdict {
    /// Wire value used by the inference service.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Granted => "DEFERIDO",
            Self::Denied => "INDEFERIDO",
        }
    }

    /// Parse a wire value. Case-insensitive, surrounding whitespace ignored.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "DEFERIDO" => Some(Self::Granted),
            "INDEFERIDO" => Some(Self::Denied),
            _ => None,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

// ---------------------------------------------------------------------------
// Proposal / Review
// ---------------------------------------------------------------------------

/// One row of the model's output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceProposal {
    pub source_course_name: String,
    pub target_course_name: String,
    /// In [0.0, 1.0]
    pub similarity_score: f64,
    pub verdict: Verdict,
    pub rationale: String,
}

/// A proposal plus the reviewer's approval flag.
///
/// The proposal itself is never edited; only `approved` changes, and only
/// through [`crate::ReviewSession`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceReview {
    #[serde(flatten)]
    proposal: EquivalenceProposal,
    approved: bool,
}

impl EquivalenceReview {
    /// Review with the default approval: granted proposals start approved.
    pub fn new(proposal: EquivalenceProposal) -> Self {
        let approved = proposal.verdict.is_granted();
        Self { proposal, approved }
    }

    pub fn with_approval(proposal: EquivalenceProposal, approved: bool) -> Self {
        Self { proposal, approved }
    }

    pub fn proposal(&self) -> &EquivalenceProposal {
        &self.proposal
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub(crate) fn set_approved(&mut self, value: bool) {
        self.approved = value;
    }
}

/// The reviews at the moment the human finalized them. Immutable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConfirmedEquivalenceSet {
    entries: Vec<EquivalenceReview>,
}

impl ConfirmedEquivalenceSet {
    pub fn from_reviews(entries: Vec<EquivalenceReview>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[EquivalenceReview] {
        &self.entries
    }

    /// Approved entries in confirmed order.
    pub fn approved(&self) -> impl Iterator<Item = &EquivalenceReview> {
        self.entries.iter().filter(|r| r.approved())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Inference output
// ---------------------------------------------------------------------------

/// Token accounting reported by the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

/// Successful result of one inference call.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Analysis {
    pub student_name: Option<String>,
    pub proposals: Vec<EquivalenceProposal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
}

impl Analysis {
    /// Result used when a document had no usable content: no proposals.
    pub fn empty() -> Self {
        Self::default()
    }
}
