/// A gap between rising edges longer than this means the partner stopped
/// mid-byte, or we missed edges. Burst data idles ~430 µs between bytes and
/// the clock period is nominally 122 µs.
pub const IDLE_RESET_MICROS: u32 = 500;

/// Nominal length of one clock period driven by the console.
pub const NOMINAL_CLOCK_PERIOD_MICROS: u32 = 122;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEdge {
    Rising,
    Falling,
}

/// Bit-level half of the link: assembles inbound bytes on rising edges and
/// shifts the latched reply out on falling edges.
///
/// Runs inside the clock interrupt. Nothing here allocates or blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClockReceiver {
    in_data: u8,
    out_data: u8,
    shift: u8,
    last_rise: Option<u32>,
}

impl ClockReceiver {
    pub const fn new() -> Self {
        Self {
            in_data: 0,
            out_data: 0,
            shift: 0,
            last_rise: None,
        }
    }

    /// Samples `input_high` on a rising edge at `now_us`.
    ///
    /// Returns the assembled byte once eight bits have been shifted in; the
    /// caller must answer with [`Self::latch_reply`]. `now_us` is a wrapping
    /// microsecond counter.
    #[inline]
    pub fn rising_edge(&mut self, input_high: bool, now_us: u32) -> Option<u8> {
        if let Some(last) = self.last_rise
            && now_us.wrapping_sub(last) > IDLE_RESET_MICROS
        {
            // The outbound register keeps its reply: its MSB already went out
            // on the falling edge that started this byte.
            self.in_data = 0;
            self.shift = 0;
        }
        self.last_rise = Some(now_us);

        self.in_data = (self.in_data << 1) | input_high as u8;
        self.shift += 1;

        if self.shift > 7 {
            self.shift = 0;
            let byte = self.in_data;
            self.in_data = 0;
            Some(byte)
        } else {
            None
        }
    }

    /// Loads the byte to send during the next eight clocks.
    #[inline]
    pub fn latch_reply(&mut self, reply: u8) {
        self.out_data = reply;
    }

    /// Returns the level to drive for this falling edge.
    #[inline]
    pub fn falling_edge(&mut self) -> bool {
        let bit = self.out_data & 0x80 != 0;
        self.out_data <<= 1;
        bit
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn bit_count(&self) -> u8 {
        self.shift
    }

    pub fn inbound(&self) -> u8 {
        self.in_data
    }

    pub fn outbound(&self) -> u8 {
        self.out_data
    }
}
