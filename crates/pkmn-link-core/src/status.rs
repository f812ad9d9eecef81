use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// What the link looks like from the presentation side.
///
/// Ordering matters: everything past [`LinkStatus::Connected`] is handled by
/// the trade machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LinkStatus {
    #[default]
    NotConnected = 0,
    Connected = 1,
    Ready = 2,
    Waiting = 3,
    TradePending = 4,
    Trading = 5,
}

impl LinkStatus {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Connected,
            2 => Self::Ready,
            3 => Self::Waiting,
            4 => Self::TradePending,
            5 => Self::Trading,
            _ => Self::NotConnected,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotConnected => "CONNECT GB",
            Self::Connected => "CONNECTED",
            Self::Ready => "READY",
            Self::Waiting => "WAITING",
            Self::TradePending => "DEAL?",
            Self::Trading => "TRADING",
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Status shared between the edge path and whoever renders it.
///
/// Every accessor is a single atomic operation, so the edge path never waits
/// and readers never observe a torn value.
#[derive(Debug, Default)]
pub struct StatusCell {
    status: AtomicU8,
    display_index: AtomicU8,
}

impl StatusCell {
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(LinkStatus::NotConnected as u8),
            display_index: AtomicU8::new(0),
        }
    }

    #[inline]
    pub fn status(&self) -> LinkStatus {
        LinkStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set_status(&self, status: LinkStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    /// Display index of the pokemon currently in local slot 0.
    #[inline]
    pub fn display_index(&self) -> u8 {
        self.display_index.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set_display_index(&self, index: u8) {
        self.display_index.store(index, Ordering::Release);
    }

    /// Re-entering the trade view keeps an established connection but forgets
    /// any trade progress.
    pub fn demote_for_reentry(&self) {
        let _ = self
            .status
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                (raw > LinkStatus::Ready as u8).then_some(LinkStatus::Ready as u8)
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_status() {
        let cell = StatusCell::new();
        for status in [
            LinkStatus::NotConnected,
            LinkStatus::Connected,
            LinkStatus::Ready,
            LinkStatus::Waiting,
            LinkStatus::TradePending,
            LinkStatus::Trading,
        ] {
            cell.set_status(status);
            assert_eq!(cell.status(), status);
        }
    }

    #[test]
    fn reentry_demotes_trade_progress_only() {
        let cell = StatusCell::new();

        cell.set_status(LinkStatus::Trading);
        cell.demote_for_reentry();
        assert_eq!(cell.status(), LinkStatus::Ready);

        cell.set_status(LinkStatus::Connected);
        cell.demote_for_reentry();
        assert_eq!(cell.status(), LinkStatus::Connected);

        cell.set_status(LinkStatus::NotConnected);
        cell.demote_for_reentry();
        assert_eq!(cell.status(), LinkStatus::NotConnected);
    }
}
