//! Coalescing state for list refetches.
//!
//! Every invalidation takes a ticket. At most one fetch is outstanding; a
//! fetch covers every ticket issued before it started. Tickets issued while
//! a fetch is outstanding collapse into a single follow-up fetch.

/// What the caller of [`RefetchState::request`] must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RefetchDecision {
    /// No fetch is outstanding: the caller drives one covering `covers`.
    Start { covers: u64 },
    /// A fetch is outstanding: wait until some fetch covers `ticket`.
    Coalesced { ticket: u64 },
}

#[derive(Debug, Default)]
pub(super) struct RefetchState {
    requested: u64,
    in_flight: Option<u64>,
    queued: bool,
}

impl RefetchState {
    pub(super) fn request(&mut self) -> RefetchDecision {
        self.requested += 1;
        let ticket = self.requested;
        if self.in_flight.is_some() {
            self.queued = true;
            RefetchDecision::Coalesced { ticket }
        } else {
            self.in_flight = Some(ticket);
            RefetchDecision::Start { covers: ticket }
        }
    }

    /// Mark the outstanding fetch as applied.
    ///
    /// Returns the coverage of the follow-up fetch the driver must run, if
    /// any invalidation arrived meanwhile.
    pub(super) fn finish(&mut self) -> Option<u64> {
        if self.queued {
            self.queued = false;
            self.in_flight = Some(self.requested);
            self.in_flight
        } else {
            self.in_flight = None;
            None
        }
    }

    /// Release a fetch whose driver went away before finishing.
    ///
    /// Returns the highest ticket issued so waiters can be released.
    pub(super) fn abandon(&mut self) -> u64 {
        self.in_flight = None;
        self.queued = false;
        self.requested
    }

    #[cfg(test)]
    const fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn idle_request_starts_a_fetch() {
        let mut state = RefetchState::default();
        assert_eq!(state.request(), RefetchDecision::Start { covers: 1 });
        assert!(state.is_fetching());
        assert_eq!(state.finish(), None);
        assert!(!state.is_fetching());
    }

    #[rstest]
    fn requests_during_a_fetch_coalesce_into_one_follow_up() {
        let mut state = RefetchState::default();
        assert_eq!(state.request(), RefetchDecision::Start { covers: 1 });
        assert_eq!(state.request(), RefetchDecision::Coalesced { ticket: 2 });
        assert_eq!(state.request(), RefetchDecision::Coalesced { ticket: 3 });

        assert_eq!(state.finish(), Some(3));
        assert!(state.is_fetching());
        assert_eq!(state.finish(), None);
    }

    #[rstest]
    fn request_during_follow_up_queues_another() {
        let mut state = RefetchState::default();
        state.request();
        state.request();
        assert_eq!(state.finish(), Some(2));
        assert_eq!(state.request(), RefetchDecision::Coalesced { ticket: 3 });
        assert_eq!(state.finish(), Some(3));
        assert_eq!(state.finish(), None);
    }

    #[rstest]
    fn abandon_releases_the_slot() {
        let mut state = RefetchState::default();
        state.request();
        state.request();
        assert_eq!(state.abandon(), 2);
        assert_eq!(state.request(), RefetchDecision::Start { covers: 3 });
    }
}
