//! Last-request-wins tracking for asynchronous fetches.
//!
//! Each fetch takes a [`FetchTicket`] from a [`FetchGuard`]. Only the most
//! recently issued ticket is accepted when its response arrives; earlier
//! responses and anything arriving after [`FetchGuard::cancel_all`] are
//! discarded.

/// Identity of one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Default)]
pub struct FetchGuard {
    issued: u64,
    active: Option<u64>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any in-flight one.
    pub fn issue(&mut self) -> FetchTicket {
        self.issued += 1;
        self.active = Some(self.issued);
        FetchTicket {
            generation: self.issued,
        }
    }

    /// Accept the response for `ticket` if it is still current.
    ///
    /// A ticket is accepted at most once.
    pub fn complete(&mut self, ticket: FetchTicket) -> bool {
        if self.active == Some(ticket.generation) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.active.is_some()
    }

    /// Drop every outstanding ticket.
    pub fn cancel_all(&mut self) {
        self.active = None;
    }
}
