use std::sync::Arc;

use log::{debug, info};

use crate::clock::{ClockEdge, ClockReceiver};
use crate::negotiate::{connect_response, menu_response};
use crate::patch_list::PatchList;
use crate::platform::{DeferredTask, LinkPins, Scheduler, SpeciesTable};
use crate::record::TradeRecord;
use crate::status::{LinkStatus, StatusCell};
use crate::trade::{TradeContext, TradeMachine, TradeState};

/// One active link: everything the edge path touches between [`Session::enter`]
/// and [`Session::leave`].
///
/// The partner record only exists while the session does; each session starts
/// from a zeroed copy.
pub struct Session {
    receiver: ClockReceiver,
    machine: TradeMachine,
    local: TradeRecord,
    partner: Box<TradeRecord>,
    patch_list: PatchList,
    species: Arc<dyn SpeciesTable>,
    status: Arc<StatusCell>,
    scheduler: Arc<dyn Scheduler>,
}

impl Session {
    /// Starts a session for `local`.
    ///
    /// A console that is already connected keeps its connection, so leaving and
    /// re-entering the trade view does not require redoing the handshake. Any
    /// trade progress is dropped.
    pub fn enter(
        local: TradeRecord,
        species: Arc<dyn SpeciesTable>,
        status: Arc<StatusCell>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        status.demote_for_reentry();
        if let Some(id) = local.species(0) {
            status.set_display_index(species.display_index(id));
        }

        let patch_list = PatchList::build(&local);
        info!(
            "Session entered: status {}, {} patch list entries",
            status.status(),
            patch_list.len()
        );

        Self {
            receiver: ClockReceiver::new(),
            machine: TradeMachine::new(),
            local,
            partner: Box::new(TradeRecord::zeroed()),
            patch_list,
            species,
            status,
            scheduler,
        }
    }

    /// Handles one clock edge. This is the only entry point the clock
    /// interrupt needs.
    #[inline]
    pub fn on_edge<P: LinkPins + ?Sized>(&mut self, edge: ClockEdge, pins: &mut P, now_us: u32) {
        match edge {
            ClockEdge::Rising => {
                if let Some(inbound) = self.receiver.rising_edge(pins.read_input(), now_us) {
                    let reply = self.exchange(inbound);
                    self.receiver.latch_reply(reply);
                }
            }
            ClockEdge::Falling => {
                let bit = self.receiver.falling_edge();
                pins.write_output(bit);
            }
        }
    }

    /// Answers one whole inbound byte.
    pub fn exchange(&mut self, inbound: u8) -> u8 {
        match self.status.status() {
            LinkStatus::NotConnected => connect_response(inbound, &self.status),
            LinkStatus::Connected => menu_response(inbound, &self.status),
            _ => {
                let mut cx = TradeContext {
                    local: &mut self.local,
                    partner: &mut self.partner,
                    patch_list: &self.patch_list,
                    species: self.species.as_ref(),
                    status: &self.status,
                    scheduler: self.scheduler.as_ref(),
                };
                self.machine.step(inbound, &mut cx)
            }
        }
    }

    /// Runs work the edge path scheduled. Must not be called from the edge
    /// path itself.
    pub fn run_deferred(&mut self, task: DeferredTask) {
        match task {
            DeferredTask::RebuildPatchList => {
                self.patch_list = PatchList::build(&self.local);
                debug!("Rebuilt patch list after trade");
            }
        }
    }

    /// Ends the session and hands back the local record, including any pokemon
    /// traded in.
    pub fn leave(self) -> TradeRecord {
        info!(
            "Session left in state {:?}, status {}",
            self.machine.state(),
            self.status.status()
        );
        self.local
    }

    pub fn status(&self) -> LinkStatus {
        self.status.status()
    }

    pub fn status_cell(&self) -> &Arc<StatusCell> {
        &self.status
    }

    pub fn trade_state(&self) -> TradeState {
        self.machine.state()
    }

    pub fn machine(&self) -> &TradeMachine {
        &self.machine
    }

    pub fn receiver(&self) -> &ClockReceiver {
        &self.receiver
    }

    pub fn local(&self) -> &TradeRecord {
        &self.local
    }

    pub fn partner(&self) -> &TradeRecord {
        &self.partner
    }

    pub fn patch_list(&self) -> &PatchList {
        &self.patch_list
    }
}
