//! Host frontend for the link engine: a BGB link protocol bridge, a byte
//! replay driver and the party configuration they share.

pub mod bgb;
pub mod config;
pub mod replay;
