//! Control bytes and lengths used by the Gen I link protocol.
//!
//! Values are fixed by the cartridge firmware and must match exactly.

pub const BLANK: u8 = 0x00;

/// Sent repeatedly by the side that decided to drive the clock.
pub const MASTER: u8 = 0x01;
/// Reply to [`MASTER`] from the side following the external clock.
pub const SLAVE: u8 = 0x02;
pub const CONNECTED: u8 = 0x60;

pub const ITEM_1_HIGHLIGHTED: u8 = 0xD0;
pub const ITEM_2_HIGHLIGHTED: u8 = 0xD1;
pub const ITEM_3_HIGHLIGHTED: u8 = 0xD2;
pub const ITEM_1_SELECTED: u8 = 0xD4;
pub const ITEM_2_SELECTED: u8 = 0xD5;
pub const ITEM_3_SELECTED: u8 = 0xD6;

pub const TRADE_CENTRE: u8 = ITEM_1_SELECTED;
pub const COLOSSEUM: u8 = ITEM_2_SELECTED;
pub const BREAK_LINK: u8 = ITEM_3_SELECTED;

pub const TRADE_REJECT: u8 = 0x61;
pub const TRADE_ACCEPT: u8 = 0x62;
pub const TABLE_LEAVE: u8 = 0x6F;

/// Bits set in every "party slot N offered" byte; the low nibble is the slot.
pub const SEL_NUM_MASK: u8 = 0x60;
pub const SEL_NUM_ONE: u8 = 0x60;

pub const SERIAL_PREAMBLE_BYTE: u8 = 0xFD;
pub const SERIAL_NO_DATA_BYTE: u8 = 0xFE;
pub const SERIAL_PATCH_LIST_PART_TERMINATOR: u8 = 0xFF;

pub const SERIAL_PREAMBLE_LENGTH: usize = 6;
pub const SERIAL_TRADE_PREAMBLE_LENGTH: usize = 9;
pub const SERIAL_RNS_LENGTH: usize = 10;

/// Positions at the start of the patch list phase that carry no list entry.
pub const PATCH_LIST_PADDING: usize = 7;

/// Bytes of the patch list phase that are counted before the trade machine
/// starts waiting for a selection.
pub const PATCH_DATA_LENGTH: usize = 196;

/// Whether `byte` carries the selection-number mask.
#[inline]
pub const fn is_selection(byte: u8) -> bool {
    byte & SEL_NUM_MASK == SEL_NUM_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_mask_matches_slot_bytes_and_table_leave() {
        for slot in 0..6 {
            assert!(is_selection(SEL_NUM_MASK | slot));
        }
        assert!(is_selection(TABLE_LEAVE));
        assert!(!is_selection(BLANK));
        assert!(!is_selection(TRADE_CENTRE));
    }

    #[test]
    fn preamble_lengths_add_up_to_random_phase() {
        assert_eq!(SERIAL_RNS_LENGTH + SERIAL_TRADE_PREAMBLE_LENGTH, 19);
    }
}
