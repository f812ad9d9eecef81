//! Game Boy link cable endpoint for Generation I Pokémon trades.
//!
//! This crate contains the platform-agnostic protocol engine: the clock-edge
//! bit shifter, the role/menu negotiation, the ten-state trade machine and the
//! trade record/patch list codecs. Frontends (the CLI bridge, firmware) own the
//! pins and the clock source and drive a [`session::Session`] edge by edge.

/// Clock-edge receiver: shift registers and idle resynchronization.
pub mod clock;

/// Role handshake and link menu echo.
pub mod negotiate;

/// Patch list builder and inbound patch marker decoder.
pub mod patch_list;

/// Platform seams: pins, deferred work and species lookup.
pub mod platform;

/// Fixed-layout trade record and party structures.
pub mod record;

/// Per-link session tying the receiver, negotiation and trade machine together.
pub mod session;

/// Software pin pair that clocks whole bytes through a session.
pub mod soft_link;

/// Presentation status shared with the non-interrupt side.
pub mod status;

/// Gen I character encoding for names.
pub mod text;

/// Trade centre state machine.
pub mod trade;

/// Control-byte vocabulary and on-wire lengths.
pub mod wire;
