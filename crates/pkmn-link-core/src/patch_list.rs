//! Patch list encoding for the party block.
//!
//! The serial routine treats 0xFE as "no data", so the party block cannot carry
//! that value verbatim. The sender transmits 0xFF in its place and follows the
//! record with a list of 1-based offsets where 0xFE must be restored. Offsets
//! past 0xFB do not fit a byte together with the markers, so the list is split
//! in two parts by a 0xFF terminator; part two restarts counting at 0xFC.

use log::debug;

use crate::record::{PARTY_LEN, TradeRecord};
use crate::wire::{
    BLANK, SERIAL_NO_DATA_BYTE, SERIAL_PATCH_LIST_PART_TERMINATOR, SERIAL_PREAMBLE_BYTE,
};

/// First party offset addressed by part two of the list.
const PART_TWO_START: usize = 0xFC;

/// Immutable list of patch markers derived from a local record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchList {
    entries: Vec<u8>,
}

impl PatchList {
    /// Scans the party block of `record` for 0xFE bytes.
    ///
    /// Allocates; never call this from the edge path.
    pub fn build(record: &TradeRecord) -> Self {
        let mut entries = Vec::with_capacity(PARTY_LEN + 2);

        for (offset, &byte) in record.party_bytes().iter().enumerate() {
            if offset == PART_TWO_START {
                entries.push(SERIAL_PATCH_LIST_PART_TERMINATOR);
            }
            if byte == SERIAL_NO_DATA_BYTE {
                entries.push((offset % PART_TWO_START) as u8 + 1);
            }
        }
        entries.push(SERIAL_PATCH_LIST_PART_TERMINATOR);

        debug!("Patch list built with {} entries", entries.len());
        Self { entries }
    }

    /// Entry at `index`, or BLANK once the list is exhausted.
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        self.entries.get(index).copied().unwrap_or(BLANK)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.entries
    }
}

/// Applies inbound patch markers to the partner's scratch record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchDecoder {
    part_two: bool,
}

impl PatchDecoder {
    pub const fn new() -> Self {
        Self { part_two: false }
    }

    pub fn reset(&mut self) {
        self.part_two = false;
    }

    pub fn is_part_two(&self) -> bool {
        self.part_two
    }

    /// Party offset a marker addresses, if it addresses one at all.
    pub fn target(&self, marker: u8) -> Option<usize> {
        match marker {
            BLANK | SERIAL_PATCH_LIST_PART_TERMINATOR => None,
            // Valid markers stop at 0xFC. The header's last 0xFD falls
            // through to this phase and must not mark party byte 0xFC.
            SERIAL_PREAMBLE_BYTE | SERIAL_NO_DATA_BYTE => None,
            _ if self.part_two => Some(0xFB + marker as usize),
            _ => Some(marker as usize - 1),
        }
    }

    /// Decodes one inbound byte, marking the addressed party byte as 0xFE.
    #[inline]
    pub fn apply(&mut self, marker: u8, record: &mut TradeRecord) {
        if marker == SERIAL_PATCH_LIST_PART_TERMINATOR {
            self.part_two = true;
            return;
        }
        if let Some(offset) = self.target(marker)
            && let Some(byte) = record.party_bytes_mut().get_mut(offset)
        {
            *byte = SERIAL_NO_DATA_BYTE;
        }
    }
}
