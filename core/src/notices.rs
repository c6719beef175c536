//! User-visible, non-blocking messages.
//!
//! The portal never aborts an operation because of these. It falls back to a
//! known-good state and posts one of the variants below so the widget can show
//! why its tokens changed.

/// A closed set of messages the portal can surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalNotice {
    /// Token overrides failed validation; the canonical pair is in use.
    MalformedConfig,
    /// The resolver found nothing to pair with; the canonical pair is in use.
    NoTokensFound,
}

impl PortalNotice {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::MalformedConfig => {
                "Swap attempted with malformed token configuration. Please contact support or try again."
            }
            Self::NoTokensFound => {
                "No other tokens found on this chain to swap. You will now be shown Ethereum defaults."
            }
        }
    }
}

/// Holds the single notice currently on display. A new notice replaces the old.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<PortalNotice>,
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, notice: PortalNotice) {
        tracing::warn!(?notice, "{}", notice.message());
        self.current = Some(notice);
    }

    #[must_use]
    pub fn current(&self) -> Option<&PortalNotice> {
        self.current.as_ref()
    }

    /// Dismiss the current notice, returning it.
    pub fn take(&mut self) -> Option<PortalNotice> {
        self.current.take()
    }
}
