//! Trade centre state machine.
//!
//! Once both consoles sit at the trade table the master streams, in order:
//! ten preamble bytes, ten random numbers and nine more preamble bytes, the
//! trade record, the patch list (behind its own preamble), and then the menu
//! traffic of picking and confirming a pokemon. The protocol has no error or
//! negative acknowledgement byte; the only way back into sync is for the
//! console to leave the table, which restarts the sequence.
//!
//! Every state echoes the inbound byte unless it has something better to say.

use crate::patch_list::{PatchDecoder, PatchList};
use crate::platform::{DeferredTask, Scheduler, SpeciesTable};
use crate::record::{TRADE_RECORD_LEN, TradeRecord};
use crate::status::{LinkStatus, StatusCell};
use crate::wire::{
    BLANK, PATCH_DATA_LENGTH, PATCH_LIST_PADDING, SEL_NUM_ONE, SERIAL_PREAMBLE_BYTE,
    SERIAL_PREAMBLE_LENGTH, SERIAL_RNS_LENGTH, SERIAL_TRADE_PREAMBLE_LENGTH, TABLE_LEAVE,
    TRADE_ACCEPT, TRADE_REJECT, is_selection,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TradeState {
    #[default]
    Reset,
    Init,
    Random,
    Data,
    PatchHeader,
    PatchData,
    Select,
    Pending,
    Confirmation,
    Done,
}

/// Everything a trade step may read or touch besides the machine itself.
pub struct TradeContext<'a> {
    pub local: &'a mut TradeRecord,
    pub partner: &'a mut TradeRecord,
    pub patch_list: &'a PatchList,
    pub species: &'a dyn SpeciesTable,
    pub status: &'a StatusCell,
    pub scheduler: &'a dyn Scheduler,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TradeMachine {
    state: TradeState,
    counter: usize,
    patch: PatchDecoder,
    /// Raw selection byte from the partner, mask stripped once confirmed.
    selection: u8,
}

impl TradeMachine {
    pub const fn new() -> Self {
        Self {
            state: TradeState::Reset,
            counter: 0,
            patch: PatchDecoder::new(),
            selection: 0,
        }
    }

    pub fn state(&self) -> TradeState {
        self.state
    }

    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Partner's offered slot byte as currently remembered.
    pub fn selection(&self) -> u8 {
        self.selection
    }

    pub fn patch_decoder(&self) -> &PatchDecoder {
        &self.patch
    }

    /// Processes one inbound byte and returns the reply.
    ///
    /// Called from the edge path: constant time, no allocation.
    pub fn step(&mut self, inbound: u8, cx: &mut TradeContext<'_>) -> u8 {
        match self.state {
            TradeState::Reset => {
                self.counter = 0;
                self.patch.reset();
                self.state = TradeState::Init;
                inbound
            }
            TradeState::Init => self.init(inbound, cx),
            TradeState::Random => {
                self.counter += 1;
                if self.counter == SERIAL_RNS_LENGTH + SERIAL_TRADE_PREAMBLE_LENGTH {
                    self.state = TradeState::Data;
                    self.counter = 0;
                }
                inbound
            }
            TradeState::Data => {
                cx.partner.set_byte(self.counter, inbound);
                let send = cx.local.wire_byte(self.counter);
                self.counter += 1;
                if self.counter == TRADE_RECORD_LEN {
                    self.state = TradeState::PatchHeader;
                    self.counter = 0;
                }
                send
            }
            TradeState::PatchHeader => {
                // Absorbs the tail of the data block and the preamble bytes
                // ending it and starting the patch list.
                if inbound == SERIAL_PREAMBLE_BYTE {
                    self.counter += 1;
                }
                if self.counter == SERIAL_PREAMBLE_LENGTH {
                    self.counter = 0;
                    self.state = TradeState::PatchData;
                    self.patch_data(inbound, cx)
                } else {
                    inbound
                }
            }
            TradeState::PatchData => self.patch_data(inbound, cx),
            TradeState::Select => {
                self.selection = 0;
                if inbound == BLANK {
                    self.state = TradeState::Pending;
                    self.pending(inbound, cx)
                } else {
                    inbound
                }
            }
            TradeState::Pending => self.pending(inbound, cx),
            TradeState::Confirmation => {
                if inbound == TRADE_REJECT {
                    self.state = TradeState::Select;
                    cx.status.set_status(LinkStatus::Waiting);
                } else if inbound == TRADE_ACCEPT {
                    self.state = TradeState::Done;
                }
                inbound
            }
            TradeState::Done => {
                if inbound == BLANK {
                    self.finish(cx);
                }
                inbound
            }
        }
    }

    fn init(&mut self, inbound: u8, cx: &mut TradeContext<'_>) -> u8 {
        let mut send = inbound;
        if inbound == SERIAL_PREAMBLE_BYTE {
            self.counter += 1;
            cx.status.set_status(LinkStatus::Waiting);
        } else if is_selection(inbound) {
            // The console is still waiting at the trade menu from an earlier
            // session; asking it to leave the table makes it start over.
            send = TABLE_LEAVE;
        }

        if self.counter == SERIAL_RNS_LENGTH {
            self.state = TradeState::Random;
            self.counter = 0;
        }
        send
    }

    fn patch_data(&mut self, inbound: u8, cx: &mut TradeContext<'_>) -> u8 {
        let mut send = inbound;
        self.counter += 1;
        if self.counter > PATCH_LIST_PADDING {
            send = cx.patch_list.get(self.counter - PATCH_LIST_PADDING - 1);
        }

        self.patch.apply(inbound, cx.partner);

        if self.counter == PATCH_DATA_LENGTH {
            self.state = TradeState::Select;
        }
        send
    }

    fn pending(&mut self, inbound: u8, cx: &mut TradeContext<'_>) -> u8 {
        let mut send = inbound;
        if inbound == TABLE_LEAVE {
            self.state = TradeState::Reset;
            send = TABLE_LEAVE;
            cx.status.set_status(LinkStatus::Ready);
        } else if is_selection(inbound) {
            self.selection = inbound;
            // Always offer our first party slot.
            send = SEL_NUM_ONE;
            cx.status.set_status(LinkStatus::TradePending);
        } else if inbound == BLANK && self.selection != 0 {
            send = BLANK;
            self.selection &= 0x0F;
            self.state = TradeState::Confirmation;
        }
        send
    }

    fn finish(&mut self, cx: &mut TradeContext<'_>) {
        self.state = TradeState::Reset;
        let slot = self.selection as usize;
        if cx.local.copy_slot_from(0, cx.partner, slot).is_err() {
            return;
        }

        cx.status.set_status(LinkStatus::Trading);
        if let Some(species) = cx.local.species(0) {
            cx.status.set_display_index(cx.species.display_index(species));
        }
        cx.scheduler.schedule(DeferredTask::RebuildPatchList);
    }
}
