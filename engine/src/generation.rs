//! Staleness tickets for in-flight requests.

use portal_core::{Generation, Portal};

/// Captured when a request is issued. A result is applied only while the
/// portal still sits on the same generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: Generation,
}

impl Ticket {
    #[must_use]
    pub fn issue(portal: &Portal) -> Self {
        Self {
            generation: portal.generation(),
        }
    }

    #[must_use]
    pub fn generation(self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn is_current(self, portal: &Portal) -> bool {
        self.generation == portal.generation()
    }
}
