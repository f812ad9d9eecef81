use crate::clock::{ClockEdge, NOMINAL_CLOCK_PERIOD_MICROS};
use crate::platform::{LinkPins, LinkPort};
use crate::session::Session;

/// Pin pair backed by two booleans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SoftPins {
    pub input: bool,
    pub output: bool,
}

impl LinkPins for SoftPins {
    fn read_input(&self) -> bool {
        self.input
    }

    fn write_output(&mut self, high: bool) {
        self.output = high;
    }
}

/// Binds a [`Session`] to software pins and a virtual microsecond clock so a
/// host that only sees whole bytes (an emulator socket, a capture file) can
/// still drive the session edge by edge.
///
/// Binding is the edge registration: while bound, every edge the link sees
/// goes to this session. [`SoftLink::unbind`] hands the session back.
pub struct SoftLink {
    session: Session,
    pins: SoftPins,
    now_us: u32,
}

impl SoftLink {
    const HALF_PERIOD_MICROS: u32 = NOMINAL_CLOCK_PERIOD_MICROS / 2;

    pub fn bind(session: Session) -> Self {
        Self {
            session,
            pins: SoftPins::default(),
            now_us: 0,
        }
    }

    /// Clocks `byte` in MSB-first at the nominal rate and returns the byte
    /// driven on the output line during the same eight clocks.
    ///
    /// As on the wire, the reply to a byte goes out while the next one is
    /// clocked in.
    pub fn clock_byte(&mut self, byte: u8) -> u8 {
        let mut sent = 0u8;
        for bit in (0..8).rev() {
            self.edge(ClockEdge::Falling);
            sent = (sent << 1) | self.pins.output as u8;
            self.pins.input = (byte >> bit) & 1 != 0;
            self.edge(ClockEdge::Rising);
        }
        sent
    }

    /// Clocks only the first `bits` bits of `byte`, as a partner that stalls
    /// mid-byte would.
    pub fn clock_partial(&mut self, byte: u8, bits: u8) {
        for bit in (8 - bits.min(8)..8).rev() {
            self.edge(ClockEdge::Falling);
            self.pins.input = (byte >> bit) & 1 != 0;
            self.edge(ClockEdge::Rising);
        }
    }

    /// Lets the line sit without clock edges.
    pub fn idle(&mut self, micros: u32) {
        self.now_us = self.now_us.wrapping_add(micros);
    }

    pub fn now_us(&self) -> u32 {
        self.now_us
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn unbind(self) -> Session {
        self.session
    }

    fn edge(&mut self, edge: ClockEdge) {
        self.session.on_edge(edge, &mut self.pins, self.now_us);
        self.now_us = self.now_us.wrapping_add(Self::HALF_PERIOD_MICROS);
    }
}

impl LinkPort for SoftLink {
    fn transfer(&mut self, byte: u8) -> u8 {
        self.clock_byte(byte)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::IDLE_RESET_MICROS;
    use crate::platform::{PendingTasks, RawSpecies};
    use crate::record::TradeRecord;
    use crate::status::{LinkStatus, StatusCell};
    use crate::wire::{BLANK, CONNECTED, MASTER, SLAVE};

    fn link() -> SoftLink {
        SoftLink::bind(Session::enter(
            TradeRecord::zeroed(),
            Arc::new(RawSpecies),
            Arc::new(StatusCell::new()),
            Arc::new(PendingTasks::new()),
        ))
    }

    #[test]
    fn replies_lag_one_byte() {
        let mut link = link();
        assert_eq!(link.clock_byte(MASTER), BLANK);
        assert_eq!(link.clock_byte(CONNECTED), SLAVE);
        assert_eq!(link.clock_byte(BLANK), CONNECTED);
        assert_eq!(link.session().status(), LinkStatus::Connected);
    }

    #[test]
    fn stalled_byte_is_dropped_after_idle() {
        let mut link = link();
        link.clock_partial(0xFF, 3);
        assert_eq!(link.session().receiver().bit_count(), 3);

        link.idle(IDLE_RESET_MICROS + 1);
        link.clock_byte(CONNECTED);
        assert_eq!(link.session().status(), LinkStatus::Connected);
        assert_eq!(link.session().receiver().bit_count(), 0);
    }

    #[test]
    fn short_stall_keeps_partial_bits() {
        let mut link = link();
        link.clock_partial(0x00, 4);
        link.idle(100);
        link.clock_partial(0x10, 4);
        // Both halves join into 0x01.
        assert_eq!(link.transfer(BLANK), SLAVE);
    }
}
