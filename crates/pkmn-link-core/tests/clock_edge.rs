//! Integration tests for the clock-edge path driven through software pins.

use std::sync::Arc;

use pkmn_link_core::clock::IDLE_RESET_MICROS;
use pkmn_link_core::platform::{LinkPort, PendingTasks, RawSpecies};
use pkmn_link_core::record::TradeRecord;
use pkmn_link_core::session::Session;
use pkmn_link_core::soft_link::SoftLink;
use pkmn_link_core::status::{LinkStatus, StatusCell};
use pkmn_link_core::wire::{
    BLANK, BREAK_LINK, CONNECTED, ITEM_2_HIGHLIGHTED, MASTER, SLAVE, TRADE_CENTRE,
};

/// Menus poll roughly every 15 ms.
const MENU_POLL_MICROS: u32 = 15_000;

fn bound_link(status: Arc<StatusCell>) -> SoftLink {
    SoftLink::bind(Session::enter(
        TradeRecord::zeroed(),
        Arc::new(RawSpecies),
        status,
        Arc::new(PendingTasks::new()),
    ))
}

#[test]
fn replies_survive_menu_poll_gaps() {
    let status = Arc::new(StatusCell::new());
    let mut link = bound_link(status.clone());

    let mut sent = Vec::new();
    for byte in [MASTER, CONNECTED, ITEM_2_HIGHLIGHTED, TRADE_CENTRE, BLANK] {
        sent.push(link.clock_byte(byte));
        link.idle(MENU_POLL_MICROS);
    }

    assert_eq!(sent, [BLANK, SLAVE, CONNECTED, ITEM_2_HIGHLIGHTED, BLANK]);
    assert_eq!(status.status(), LinkStatus::Ready);
}

#[test]
fn stall_mid_byte_resynchronizes_on_next_byte() {
    let status = Arc::new(StatusCell::new());
    let mut link = bound_link(status.clone());

    link.clock_byte(CONNECTED);
    assert_eq!(status.status(), LinkStatus::Connected);

    // A half-clocked BREAK_LINK is abandoned, then TRADE_CENTRE arrives whole.
    link.clock_partial(BREAK_LINK, 5);
    link.idle(IDLE_RESET_MICROS + 1);
    link.clock_byte(TRADE_CENTRE);
    assert_eq!(status.status(), LinkStatus::Ready);
}

#[test]
fn virtual_clock_wraps_without_spurious_reset() {
    let status = Arc::new(StatusCell::new());
    let mut link = bound_link(status.clone());
    link.idle(u32::MAX - 200);

    link.clock_byte(CONNECTED);
    assert!(link.now_us() < 1_000);
    assert_eq!(status.status(), LinkStatus::Connected);
    assert_eq!(link.session().receiver().bit_count(), 0);
}

#[test]
fn soft_link_works_as_link_port() {
    let status = Arc::new(StatusCell::new());
    let mut port: Box<dyn LinkPort> = Box::new(bound_link(status));
    assert_eq!(port.transfer(MASTER), BLANK);
    assert_eq!(port.transfer(MASTER), SLAVE);
}
