use crate::config::{ConnectionInfo, HttpOptions};

/// Bookkeeping of one HTTP/1.x connection.
///
/// The state lives as long as the transport. It is shared by the request
/// driver and the response writer, and is handed over to the HTTP/2 engine
/// when the connection is upgraded.
#[derive(Debug, Clone)]
pub struct ConnectionState {
    info: ConnectionInfo,
    remaining_requests: u64,
    pending_responses: u64,
    write_closed: bool,
}

impl ConnectionState {
    pub fn new(info: ConnectionInfo, max_requests: u64) -> Self {
        Self { info, remaining_requests: max_requests, pending_responses: 0, write_closed: false }
    }

    #[inline]
    pub fn info(&self) -> ConnectionInfo {
        self.info
    }

    /// Requests this connection may still serve before it has to close.
    #[inline]
    pub fn remaining_requests(&self) -> u64 {
        self.remaining_requests
    }

    /// Requests handed to the handler whose response has not been written yet.
    #[inline]
    pub fn pending_responses(&self) -> u64 {
        self.pending_responses
    }

    /// No further request will be parsed once the budget is used up.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining_requests == 0
    }

    #[inline]
    pub fn is_write_closed(&self) -> bool {
        self.write_closed
    }

    pub(crate) fn request_started(&mut self) {
        self.pending_responses += 1;
    }

    /// Called exactly once per response, after its last byte was handed to the transport.
    pub(crate) fn response_finished(&mut self) {
        self.pending_responses = self.pending_responses.saturating_sub(1);
        if self.remaining_requests != HttpOptions::UNBOUNDED_REQUESTS {
            self.remaining_requests = self.remaining_requests.saturating_sub(1);
        }
    }

    pub(crate) fn mark_write_closed(&mut self) {
        self.write_closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_used_up_after_max_requests() {
        let mut state = ConnectionState::new(ConnectionInfo::default(), 3);
        for _ in 0..3 {
            assert!(!state.is_exhausted());
            state.request_started();
            assert_eq!(state.pending_responses(), 1);
            state.response_finished();
            assert_eq!(state.pending_responses(), 0);
        }
        assert!(state.is_exhausted());

        state.response_finished();
        assert_eq!(state.remaining_requests(), 0);
    }

    #[test]
    fn unbounded_budget_never_runs_out() {
        let mut state = ConnectionState::new(ConnectionInfo::default(), HttpOptions::UNBOUNDED_REQUESTS);
        state.request_started();
        state.response_finished();
        assert_eq!(state.remaining_requests(), HttpOptions::UNBOUNDED_REQUESTS);
    }

    #[test]
    fn write_side_closed() {
        let mut state = ConnectionState::new(ConnectionInfo::new(Some(80), false), 1);
        assert!(!state.is_write_closed());
        state.mark_write_closed();
        assert!(state.is_write_closed());
        assert_eq!(state.info().local_port, Some(80));
    }
}
