use crate::domain::{AvailabilitySnapshot, DateRange};
use log::debug;

/// A fetch the store is waiting on. `seq` orders requests by issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub property_id: String,
    pub window: DateRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading { request: FetchRequest },
    Ready,
    Unavailable { request: FetchRequest, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Discarded,
}

/// Client-side cache of blocked and booked ranges for the visible month,
/// widened to whatever days the current selection spans.
///
/// Every load replaces the snapshot wholesale. Results are matched to the
/// newest issued request, so a slow answer for a month the user already left
/// can never overwrite the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityStore {
    property_id: String,
    snapshot: AvailabilitySnapshot,
    state: LoadState,
    last_seq: u64,
    detached: bool,
}

impl AvailabilityStore {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            snapshot: AvailabilitySnapshot::default(),
            state: LoadState::Idle,
            last_seq: 0,
            detached: false,
        }
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_interactive(&self) -> bool {
        !self.detached && matches!(self.state, LoadState::Ready)
    }

    /// The snapshot, but only while it is authoritative.
    pub fn snapshot(&self) -> Option<&AvailabilitySnapshot> {
        self.is_interactive().then_some(&self.snapshot)
    }

    /// The request currently awaiting a result, if any.
    pub fn pending(&self) -> Option<&FetchRequest> {
        match &self.state {
            LoadState::Loading { request } => Some(request),
            _ => None,
        }
    }

    pub fn begin_load(&mut self, window: DateRange) -> FetchRequest {
        self.last_seq += 1;
        let request = FetchRequest {
            seq: self.last_seq,
            property_id: self.property_id.clone(),
            window,
        };
        debug!(
            "availability request #{} for {} {}..{}",
            request.seq,
            request.property_id,
            window.start(),
            window.end()
        );
        self.state = LoadState::Loading {
            request: request.clone(),
        };
        request
    }

    pub fn complete(
        &mut self,
        request: &FetchRequest,
        result: Result<AvailabilitySnapshot, String>,
    ) -> Completion {
        if self.detached || request.seq != self.last_seq || self.pending() != Some(request) {
            debug!("discarding stale availability result #{}", request.seq);
            return Completion::Discarded;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.state = LoadState::Ready;
                Completion::Applied
            }
            Err(message) => {
                debug!("availability request #{} failed: {}", request.seq, message);
                self.snapshot = AvailabilitySnapshot::default();
                self.state = LoadState::Unavailable {
                    request: request.clone(),
                    message,
                };
                Completion::Failed
            }
        }
    }

    /// Re-issues the request for the window that last failed or loaded.
    pub fn retry(&mut self, fallback: DateRange) -> FetchRequest {
        let window = match &self.state {
            LoadState::Loading { request } | LoadState::Unavailable { request, .. } => {
                request.window
            }
            LoadState::Idle | LoadState::Ready => fallback,
        };
        self.begin_load(window)
    }

    /// Stops every outstanding request from touching the store.
    pub fn detach(&mut self) {
        self.detached = true;
        if matches!(self.state, LoadState::Loading { .. }) {
            self.state = LoadState::Idle;
        }
    }
}
