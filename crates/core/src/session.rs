//! Review session: the single active analysis run and its human review.
//!
//! Transitions:
//!
//! ```text
//! Idle ──begin_run──▶ Analyzing ──complete_run──▶ Reviewing ──finalize──▶ Finalized
//!                         │                          ▲   │
//!                         └──abort_run (prior state)─┘   └─toggle_approval
//! any ──reset──▶ Idle
//! ```
//!
//! A failed run never touches the previous proposals; a successful run
//! replaces them wholesale.

use log::{debug, info};
use thiserror::Error;

use crate::equivalence::{Analysis, ConfirmedEquivalenceSet, EquivalenceReview, UsageMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No analysis yet (or after reset)
    Idle,
    /// An inference call is outstanding
    Analyzing,
    /// Proposals installed, approvals editable
    Reviewing,
    /// Confirmed set exists; approvals frozen
    Finalized,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Reviewing => "reviewing",
            Self::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("an analysis is already running for this session")]
    Busy,
    #[error("no analysis to review")]
    NoActiveReview,
    #[error("review already finalized; reset the session to start over")]
    AlreadyFinalized,
    #[error("no proposal at index {index} (session has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("run {0} is no longer current")]
    StaleRun(u64),
}

/// Handle for one outstanding run. Consumed by `complete_run` / `abort_run`.
#[derive(Debug, PartialEq, Eq)]
pub struct RunTicket {
    run_id: u64,
}

impl RunTicket {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }
}

#[derive(Debug, Default)]
pub struct ReviewSession {
    next_run_id: u64,
    in_flight: Option<u64>,
    has_analysis: bool,
    student_name: Option<String>,
    usage: Option<UsageMetadata>,
    reviews: Vec<EquivalenceReview>,
    confirmed: Option<ConfirmedEquivalenceSet>,
}

impl ReviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.in_flight.is_some() {
            SessionState::Analyzing
        } else if self.confirmed.is_some() {
            SessionState::Finalized
        } else if self.has_analysis {
            SessionState::Reviewing
        } else {
            SessionState::Idle
        }
    }

    /// Mark an inference call as outstanding.
    pub fn begin_run(&mut self) -> Result<RunTicket, SessionError> {
        if self.in_flight.is_some() {
            return Err(SessionError::Busy);
        }
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        self.in_flight = Some(run_id);
        debug!("session: run {run_id} started");
        Ok(RunTicket { run_id })
    }

    /// Install a run's proposals, discarding all earlier review state.
    pub fn complete_run(&mut self, ticket: RunTicket, analysis: Analysis) -> Result<(), SessionError> {
        self.check_ticket(&ticket)?;
        self.in_flight = None;

        self.reviews = analysis.proposals.into_iter().map(EquivalenceReview::new).collect();
        self.student_name = analysis.student_name;
        self.usage = analysis.usage;
        self.confirmed = None;
        self.has_analysis = true;

        info!(
            "session: run {} installed {} proposal(s)",
            ticket.run_id,
            self.reviews.len()
        );
        Ok(())
    }

    /// End a failed run. Previous review state is left as it was.
    pub fn abort_run(&mut self, ticket: RunTicket) -> Result<(), SessionError> {
        self.check_ticket(&ticket)?;
        self.in_flight = None;
        debug!("session: run {} aborted", ticket.run_id);
        Ok(())
    }

    pub fn toggle_approval(&mut self, index: usize, value: bool) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Analyzing => return Err(SessionError::Busy),
            SessionState::Idle => return Err(SessionError::NoActiveReview),
            SessionState::Finalized => return Err(SessionError::AlreadyFinalized),
            SessionState::Reviewing => {}
        }
        let len = self.reviews.len();
        let review = self
            .reviews
            .get_mut(index)
            .ok_or(SessionError::IndexOutOfRange { index, len })?;
        review.set_approved(value);
        Ok(())
    }

    /// Snapshot the current approvals. Repeated calls re-snapshot.
    pub fn finalize(&mut self) -> Result<ConfirmedEquivalenceSet, SessionError> {
        match self.state() {
            SessionState::Analyzing => return Err(SessionError::Busy),
            SessionState::Idle => return Err(SessionError::NoActiveReview),
            SessionState::Reviewing | SessionState::Finalized => {}
        }
        let snapshot = ConfirmedEquivalenceSet::from_reviews(self.reviews.clone());
        self.confirmed = Some(snapshot.clone());
        info!(
            "session: finalized {} of {} proposal(s) approved",
            snapshot.approved().count(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Discard proposals, reviews and any confirmed set.
    ///
    /// An outstanding run is orphaned: its ticket becomes stale.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.has_analysis = false;
        self.student_name = None;
        self.usage = None;
        self.reviews.clear();
        self.confirmed = None;
        debug!("session: reset");
    }

    pub fn reviews(&self) -> &[EquivalenceReview] {
        &self.reviews
    }

    pub fn confirmed(&self) -> Option<&ConfirmedEquivalenceSet> {
        self.confirmed.as_ref()
    }

    pub fn student_name(&self) -> Option<&str> {
        self.student_name.as_deref()
    }

    pub fn usage(&self) -> Option<&UsageMetadata> {
        self.usage.as_ref()
    }

    fn check_ticket(&self, ticket: &RunTicket) -> Result<(), SessionError> {
        if self.in_flight == Some(ticket.run_id) {
            Ok(())
        } else {
            Err(SessionError::StaleRun(ticket.run_id))
        }
    }
}
