use serde::Serialize;

/// Identifies one issued request. Tokens from a counter are never reused, so
/// a response can always be matched against the request that is still wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct RequestCounter {
    next: u64,
}

impl Default for RequestCounter {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl RequestCounter {
    pub fn next_token(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next = self.next.saturating_add(1);
        token
    }
}

/// A slot where only the latest request matters (a list refresh, a status
/// check). Issuing supersedes whatever was in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestSlot {
    counter: RequestCounter,
    current: Option<RequestToken>,
}

impl RequestSlot {
    pub fn issue(&mut self) -> RequestToken {
        let token = self.counter.next_token();
        self.current = Some(token);
        token
    }

    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.current == Some(token)
    }

    /// Returns true and clears the slot when `token` is the one in flight.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if self.is_current(token) {
            self.current = None;
            true
        } else {
            false
        }
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }

    #[must_use]
    pub fn in_flight(&self) -> bool {
        self.current.is_some()
    }
}
