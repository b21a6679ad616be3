//! Request-scoped session state.

/// Flash messages queued while handling one request.
#[derive(Debug, Clone, Default)]
pub struct Session {
    flashes: Vec<String>,
}

impl Session {
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());
    }

    /// Drain the queue, leaving the session empty
    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }
}
