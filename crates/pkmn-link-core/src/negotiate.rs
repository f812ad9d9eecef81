//! Responses used before the trade machine takes over.
//!
//! The console that times out first drives the clock and repeats
//! [`MASTER`]; we always answer as the follower. Once both sides have settled
//! their roles they exchange [`BLANK`], then each side repeatedly sends the
//! link menu item it has highlighted or selected.

use crate::status::{LinkStatus, StatusCell};
use crate::wire::{BLANK, BREAK_LINK, COLOSSEUM, CONNECTED, MASTER, SLAVE, TRADE_CENTRE};

/// Role handshake, before the connection is established.
pub fn connect_response(inbound: u8, status: &StatusCell) -> u8 {
    match inbound {
        CONNECTED => {
            status.set_status(LinkStatus::Connected);
            CONNECTED
        }
        MASTER => SLAVE,
        BLANK => BLANK,
        _ => {
            status.set_status(LinkStatus::NotConnected);
            BREAK_LINK
        }
    }
}

/// Link menu: mirror whatever the console highlights or selects.
///
/// Only the trade centre is supported; picking the colosseum breaks the link.
pub fn menu_response(inbound: u8, status: &StatusCell) -> u8 {
    match inbound {
        CONNECTED => CONNECTED,
        TRADE_CENTRE => {
            status.set_status(LinkStatus::Ready);
            BLANK
        }
        COLOSSEUM | BREAK_LINK | MASTER => {
            status.set_status(LinkStatus::NotConnected);
            BREAK_LINK
        }
        _ => inbound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{ITEM_1_HIGHLIGHTED, ITEM_2_HIGHLIGHTED, ITEM_3_HIGHLIGHTED};

    #[test]
    fn follower_answers_master_and_echoes_blank() {
        let status = StatusCell::new();
        assert_eq!(connect_response(MASTER, &status), SLAVE);
        assert_eq!(connect_response(BLANK, &status), BLANK);
        assert_eq!(status.status(), LinkStatus::NotConnected);
    }

    #[test]
    fn connected_byte_establishes_link() {
        let status = StatusCell::new();
        assert_eq!(connect_response(CONNECTED, &status), CONNECTED);
        assert_eq!(status.status(), LinkStatus::Connected);
    }

    #[test]
    fn unknown_byte_before_connect_breaks_link() {
        let status = StatusCell::new();
        status.set_status(LinkStatus::Connected);
        assert_eq!(connect_response(0x42, &status), BREAK_LINK);
        assert_eq!(status.status(), LinkStatus::NotConnected);
    }

    #[test]
    fn menu_echoes_highlight_bytes() {
        let status = StatusCell::new();
        status.set_status(LinkStatus::Connected);
        for item in [ITEM_1_HIGHLIGHTED, ITEM_2_HIGHLIGHTED, ITEM_3_HIGHLIGHTED, BLANK] {
            assert_eq!(menu_response(item, &status), item);
        }
        assert_eq!(menu_response(CONNECTED, &status), CONNECTED);
        assert_eq!(status.status(), LinkStatus::Connected);
    }

    #[test]
    fn trade_centre_selection_marks_ready() {
        let status = StatusCell::new();
        status.set_status(LinkStatus::Connected);
        assert_eq!(menu_response(TRADE_CENTRE, &status), BLANK);
        assert_eq!(status.status(), LinkStatus::Ready);
    }

    #[test]
    fn colosseum_break_and_master_disconnect() {
        for byte in [COLOSSEUM, BREAK_LINK, MASTER] {
            let status = StatusCell::new();
            status.set_status(LinkStatus::Connected);
            assert_eq!(menu_response(byte, &status), BREAK_LINK);
            assert_eq!(status.status(), LinkStatus::NotConnected);
        }
    }
}
