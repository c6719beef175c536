use portal_types::{PortalMode, TabEntry};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabConfigError {
    #[error("tab list is empty")]
    Empty,
}

/// Ordered tab list. Each mode appears once and at most one entry carries
/// the initial marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabConfig {
    entries: Vec<TabEntry>,
}

impl TabConfig {
    /// Normalizes a configured list: repeated modes keep their first
    /// position and the first initial marker wins.
    pub fn new(entries: Vec<TabEntry>) -> Result<Self, TabConfigError> {
        if entries.is_empty() {
            return Err(TabConfigError::Empty);
        }
        let initial = entries
            .iter()
            .find(|entry| entry.is_initial())
            .map(|entry| entry.mode());

        let mut modes: Vec<PortalMode> = Vec::with_capacity(entries.len());
        for entry in &entries {
            if modes.contains(&entry.mode()) {
                tracing::debug!(mode = %entry.mode(), "Ignoring repeated tab");
                continue;
            }
            modes.push(entry.mode());
        }

        let entries = modes
            .into_iter()
            .map(|mode| {
                if Some(mode) == initial {
                    TabEntry::Initial(mode)
                } else {
                    TabEntry::Plain(mode)
                }
            })
            .collect();
        Ok(Self { entries })
    }

    /// Normalize a configured list, or warn and use the default one.
    #[must_use]
    pub fn resolve_or_default(entries: Option<Vec<TabEntry>>) -> Self {
        let Some(entries) = entries else {
            return Self::default();
        };
        match Self::new(entries) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "Invalid tab configuration; using default tabs");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    pub fn modes(&self) -> impl Iterator<Item = PortalMode> + '_ {
        self.entries.iter().map(|entry| entry.mode())
    }

    #[must_use]
    pub fn contains(&self, mode: PortalMode) -> bool {
        self.modes().any(|m| m == mode)
    }

    /// Mode carrying the initial marker, if any.
    #[must_use]
    pub fn initial_marker(&self) -> Option<PortalMode> {
        self.entries
            .iter()
            .find(|entry| entry.is_initial())
            .map(|entry| entry.mode())
    }
}

impl Default for TabConfig {
    fn default() -> Self {
        Self {
            entries: vec![
                TabEntry::Initial(PortalMode::Bridge),
                TabEntry::Plain(PortalMode::Swap),
                TabEntry::Plain(PortalMode::OnRamp),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_starts_on_bridge() {
        let config = TabConfig::default();
        assert_eq!(config.initial_marker(), Some(PortalMode::Bridge));
        assert!(config.contains(PortalMode::OnRamp));
    }

    #[test]
    fn first_initial_marker_wins() {
        let config = TabConfig::new(vec![
            TabEntry::Initial(PortalMode::Swap),
            TabEntry::Initial(PortalMode::OnRamp),
        ])
        .unwrap();
        assert_eq!(config.initial_marker(), Some(PortalMode::Swap));
        assert_eq!(
            config.entries(),
            &[
                TabEntry::Initial(PortalMode::Swap),
                TabEntry::Plain(PortalMode::OnRamp),
            ]
        );
    }

    #[test]
    fn repeated_modes_keep_first_position() {
        let config = TabConfig::new(vec![
            TabEntry::Initial(PortalMode::Swap),
            TabEntry::Plain(PortalMode::Swap),
        ])
        .unwrap();
        assert_eq!(config.entries(), &[TabEntry::Initial(PortalMode::Swap)]);

        let config = TabConfig::new(vec![
            TabEntry::Plain(PortalMode::Bridge),
            TabEntry::Plain(PortalMode::Swap),
            TabEntry::Initial(PortalMode::Bridge),
            TabEntry::Plain(PortalMode::OnRamp),
        ])
        .unwrap();
        assert_eq!(
            config.modes().collect::<Vec<_>>(),
            vec![PortalMode::Bridge, PortalMode::Swap, PortalMode::OnRamp]
        );
        assert_eq!(config.initial_marker(), Some(PortalMode::Bridge));
    }

    #[test]
    fn only_an_empty_list_falls_back() {
        assert_eq!(TabConfig::new(Vec::new()), Err(TabConfigError::Empty));
        assert_eq!(
            TabConfig::resolve_or_default(Some(Vec::new())),
            TabConfig::default()
        );
        let kept = TabConfig::resolve_or_default(Some(vec![
            TabEntry::Initial(PortalMode::Swap),
            TabEntry::Initial(PortalMode::OnRamp),
        ]));
        assert_eq!(
            kept.modes().collect::<Vec<_>>(),
            vec![PortalMode::Swap, PortalMode::OnRamp]
        );
    }

    #[test]
    fn plain_list_has_no_initial_marker() {
        let config = TabConfig::new(vec![
            TabEntry::Plain(PortalMode::Swap),
            TabEntry::Plain(PortalMode::Bridge),
        ])
        .unwrap();
        assert_eq!(config.initial_marker(), None);
        assert_eq!(
            config.modes().collect::<Vec<_>>(),
            vec![PortalMode::Swap, PortalMode::Bridge]
        );
    }
}
