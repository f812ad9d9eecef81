use std::fmt;

use thiserror::Error;

use crate::wire::{SERIAL_NO_DATA_BYTE, SERIAL_PATCH_LIST_PART_TERMINATOR};

pub const PARTY_SIZE: usize = 6;
/// Names are 10 characters plus a terminator in memory.
pub const NAME_LEN: usize = 11;
pub const POKEMON_STRUCT_LEN: usize = 44;

pub const TRAINER_NAME_OFFSET: usize = 0;
pub const PARTY_COUNT_OFFSET: usize = TRAINER_NAME_OFFSET + NAME_LEN;
/// Six species ids followed by a 0xFF terminator.
pub const PARTY_SPECIES_OFFSET: usize = PARTY_COUNT_OFFSET + 1;
pub const PARTY_SPECIES_LEN: usize = PARTY_SIZE + 1;
pub const PARTY_OFFSET: usize = PARTY_SPECIES_OFFSET + PARTY_SPECIES_LEN;
pub const PARTY_LEN: usize = POKEMON_STRUCT_LEN * PARTY_SIZE;
pub const OT_NAME_OFFSET: usize = PARTY_OFFSET + PARTY_LEN;
pub const NICKNAME_OFFSET: usize = OT_NAME_OFFSET + NAME_LEN * PARTY_SIZE;

/// On-wire length of a trade record.
///
/// References disagree (405, 415 and 418 all appear). 415 is the sum of the
/// Gen I party layout below; the three trailing bytes some captures show are
/// absorbed by the patch header phase instead.
pub const TRADE_RECORD_LEN: usize = NICKNAME_OFFSET + NAME_LEN * PARTY_SIZE;

pub const SPECIES_LIST_TERMINATOR: u8 = 0xFF;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("trade record must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
    #[error("party slot {0} is out of range")]
    Slot(usize),
}

/// The 44-byte Gen I party structure.
///
/// Multi-byte fields are big-endian, as stored by the cartridge.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PokemonStructure {
    bytes: [u8; POKEMON_STRUCT_LEN],
}

impl PokemonStructure {
    const SPECIES: usize = 0;
    const HP: usize = 1;
    const BOX_LEVEL: usize = 3;
    const STATUS: usize = 4;
    const TYPE1: usize = 5;
    const TYPE2: usize = 6;
    const CATCH_RATE: usize = 7;
    const MOVES: usize = 8;
    const OT_ID: usize = 12;
    const EXP: usize = 14;
    const STAT_EXP: usize = 17;
    const IVS: usize = 27;
    const PP: usize = 29;
    const LEVEL: usize = 33;
    const MAX_HP: usize = 34;
    const STATS: usize = 36;

    pub const fn from_bytes(bytes: [u8; POKEMON_STRUCT_LEN]) -> Self {
        Self { bytes }
    }

    pub const fn as_bytes(&self) -> &[u8; POKEMON_STRUCT_LEN] {
        &self.bytes
    }

    fn u16_at(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn set_u16_at(&mut self, offset: usize, value: u16) {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }

    pub fn species(&self) -> u8 {
        self.bytes[Self::SPECIES]
    }

    pub fn set_species(&mut self, species: u8) {
        self.bytes[Self::SPECIES] = species;
    }

    pub fn hp(&self) -> u16 {
        self.u16_at(Self::HP)
    }

    pub fn set_hp(&mut self, hp: u16) {
        self.set_u16_at(Self::HP, hp);
    }

    /// The level copy kept for boxed pokemon.
    pub fn box_level(&self) -> u8 {
        self.bytes[Self::BOX_LEVEL]
    }

    pub fn status(&self) -> u8 {
        self.bytes[Self::STATUS]
    }

    pub fn types(&self) -> (u8, u8) {
        (self.bytes[Self::TYPE1], self.bytes[Self::TYPE2])
    }

    pub fn set_types(&mut self, type1: u8, type2: u8) {
        self.bytes[Self::TYPE1] = type1;
        self.bytes[Self::TYPE2] = type2;
    }

    pub fn catch_rate(&self) -> u8 {
        self.bytes[Self::CATCH_RATE]
    }

    pub fn set_catch_rate(&mut self, rate: u8) {
        self.bytes[Self::CATCH_RATE] = rate;
    }

    pub fn moves(&self) -> [u8; 4] {
        let mut moves = [0u8; 4];
        moves.copy_from_slice(&self.bytes[Self::MOVES..Self::MOVES + 4]);
        moves
    }

    pub fn set_moves(&mut self, moves: [u8; 4]) {
        self.bytes[Self::MOVES..Self::MOVES + 4].copy_from_slice(&moves);
    }

    pub fn ot_id(&self) -> u16 {
        self.u16_at(Self::OT_ID)
    }

    pub fn set_ot_id(&mut self, id: u16) {
        self.set_u16_at(Self::OT_ID, id);
    }

    /// 24-bit experience total.
    pub fn exp(&self) -> u32 {
        u32::from_be_bytes([
            0,
            self.bytes[Self::EXP],
            self.bytes[Self::EXP + 1],
            self.bytes[Self::EXP + 2],
        ])
    }

    pub fn set_exp(&mut self, exp: u32) {
        let be = exp.min(0x00FF_FFFF).to_be_bytes();
        self.bytes[Self::EXP..Self::EXP + 3].copy_from_slice(&be[1..]);
    }

    /// Stat experience in HP, Attack, Defense, Speed, Special order.
    pub fn stat_exp(&self) -> [u16; 5] {
        std::array::from_fn(|i| self.u16_at(Self::STAT_EXP + i * 2))
    }

    pub fn ivs(&self) -> u16 {
        self.u16_at(Self::IVS)
    }

    pub fn set_ivs(&mut self, ivs: u16) {
        self.set_u16_at(Self::IVS, ivs);
    }

    pub fn pp(&self) -> [u8; 4] {
        let mut pp = [0u8; 4];
        pp.copy_from_slice(&self.bytes[Self::PP..Self::PP + 4]);
        pp
    }

    pub fn set_pp(&mut self, pp: [u8; 4]) {
        self.bytes[Self::PP..Self::PP + 4].copy_from_slice(&pp);
    }

    pub fn level(&self) -> u8 {
        self.bytes[Self::LEVEL]
    }

    /// Sets both the party level and the boxed copy.
    pub fn set_level(&mut self, level: u8) {
        self.bytes[Self::LEVEL] = level;
        self.bytes[Self::BOX_LEVEL] = level;
    }

    pub fn max_hp(&self) -> u16 {
        self.u16_at(Self::MAX_HP)
    }

    pub fn set_max_hp(&mut self, max_hp: u16) {
        self.set_u16_at(Self::MAX_HP, max_hp);
    }

    /// Attack, Defense, Speed, Special.
    pub fn stats(&self) -> [u16; 4] {
        std::array::from_fn(|i| self.u16_at(Self::STATS + i * 2))
    }

    pub fn set_stats(&mut self, stats: [u16; 4]) {
        for (i, stat) in stats.into_iter().enumerate() {
            self.set_u16_at(Self::STATS + i * 2, stat);
        }
    }
}

impl Default for PokemonStructure {
    fn default() -> Self {
        Self {
            bytes: [0u8; POKEMON_STRUCT_LEN],
        }
    }
}

impl fmt::Debug for PokemonStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PokemonStructure")
            .field("species", &format_args!("0x{:02X}", self.species()))
            .field("level", &self.level())
            .field("hp", &self.hp())
            .field("max_hp", &self.max_hp())
            .field("moves", &self.moves())
            .field("ot_id", &self.ot_id())
            .finish()
    }
}

fn check_slot(slot: usize) -> Result<(), RecordError> {
    if slot < PARTY_SIZE {
        Ok(())
    } else {
        Err(RecordError::Slot(slot))
    }
}

/// One side's trade data, stored exactly as it travels on the wire.
///
/// Layout: trainer name, party count, species list, six party structures, six
/// OT names, six nicknames.
#[derive(Clone, PartialEq, Eq)]
pub struct TradeRecord {
    bytes: [u8; TRADE_RECORD_LEN],
}

impl TradeRecord {
    /// An all-zero record, as used for the partner's scratch copy.
    pub const fn zeroed() -> Self {
        Self {
            bytes: [0u8; TRADE_RECORD_LEN],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        if bytes.len() != TRADE_RECORD_LEN {
            return Err(RecordError::Length {
                expected: TRADE_RECORD_LEN,
                actual: bytes.len(),
            });
        }
        let mut record = Self::zeroed();
        record.bytes.copy_from_slice(bytes);
        Ok(record)
    }

    /// A record offering a single pokemon.
    ///
    /// Unused species entries are 0xFF; the trade window renders garbage for
    /// the remaining slots otherwise.
    pub fn with_single(
        trainer_name: [u8; NAME_LEN],
        pokemon: &PokemonStructure,
        ot_name: [u8; NAME_LEN],
        nickname: [u8; NAME_LEN],
    ) -> Self {
        let mut record = Self::zeroed();
        record.set_trainer_name(trainer_name);
        record.bytes[PARTY_COUNT_OFFSET] = 1;
        record.bytes[PARTY_SPECIES_OFFSET..PARTY_OFFSET].fill(SPECIES_LIST_TERMINATOR);
        record.bytes[PARTY_SPECIES_OFFSET] = pokemon.species();
        record.write_slot(PARTY_OFFSET, 0, pokemon.as_bytes());
        record.write_slot(OT_NAME_OFFSET, 0, &ot_name);
        record.write_slot(NICKNAME_OFFSET, 0, &nickname);
        record
    }

    pub const fn as_bytes(&self) -> &[u8; TRADE_RECORD_LEN] {
        &self.bytes
    }

    #[inline]
    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    #[inline]
    pub fn set_byte(&mut self, offset: usize, value: u8) {
        self.bytes[offset] = value;
    }

    /// The byte transmitted at `offset`.
    ///
    /// 0xFE is the serial "no data" byte, so inside the party block it is sent
    /// as 0xFF and its position goes out in the patch list instead.
    #[inline]
    pub fn wire_byte(&self, offset: usize) -> u8 {
        let byte = self.bytes[offset];
        let in_party = (PARTY_OFFSET..OT_NAME_OFFSET).contains(&offset);
        if in_party && byte == SERIAL_NO_DATA_BYTE {
            SERIAL_PATCH_LIST_PART_TERMINATOR
        } else {
            byte
        }
    }

    pub fn trainer_name(&self) -> &[u8; NAME_LEN] {
        self.name_at(TRAINER_NAME_OFFSET)
    }

    pub fn set_trainer_name(&mut self, name: [u8; NAME_LEN]) {
        self.bytes[TRAINER_NAME_OFFSET..TRAINER_NAME_OFFSET + NAME_LEN].copy_from_slice(&name);
    }

    pub fn party_count(&self) -> u8 {
        self.bytes[PARTY_COUNT_OFFSET]
    }

    pub fn species(&self, slot: usize) -> Option<u8> {
        (slot < PARTY_SIZE).then(|| self.bytes[PARTY_SPECIES_OFFSET + slot])
    }

    pub fn pokemon(&self, slot: usize) -> Option<PokemonStructure> {
        if slot >= PARTY_SIZE {
            return None;
        }
        let start = PARTY_OFFSET + slot * POKEMON_STRUCT_LEN;
        let mut bytes = [0u8; POKEMON_STRUCT_LEN];
        bytes.copy_from_slice(&self.bytes[start..start + POKEMON_STRUCT_LEN]);
        Some(PokemonStructure::from_bytes(bytes))
    }

    pub fn set_pokemon(
        &mut self,
        slot: usize,
        pokemon: &PokemonStructure,
    ) -> Result<(), RecordError> {
        check_slot(slot)?;
        self.write_slot(PARTY_OFFSET, slot, pokemon.as_bytes());
        Ok(())
    }

    pub fn ot_name(&self, slot: usize) -> Option<&[u8; NAME_LEN]> {
        (slot < PARTY_SIZE).then(|| self.name_at(OT_NAME_OFFSET + slot * NAME_LEN))
    }

    pub fn set_ot_name(&mut self, slot: usize, name: [u8; NAME_LEN]) -> Result<(), RecordError> {
        check_slot(slot)?;
        self.write_slot(OT_NAME_OFFSET, slot, &name);
        Ok(())
    }

    pub fn nickname(&self, slot: usize) -> Option<&[u8; NAME_LEN]> {
        (slot < PARTY_SIZE).then(|| self.name_at(NICKNAME_OFFSET + slot * NAME_LEN))
    }

    pub fn set_nickname(&mut self, slot: usize, name: [u8; NAME_LEN]) -> Result<(), RecordError> {
        check_slot(slot)?;
        self.write_slot(NICKNAME_OFFSET, slot, &name);
        Ok(())
    }

    /// Slot must already be checked; field length comes from `field`.
    fn write_slot(&mut self, base: usize, slot: usize, field: &[u8]) {
        let start = base + slot * field.len();
        self.bytes[start..start + field.len()].copy_from_slice(field);
    }

    /// The six party structures as one contiguous byte stream.
    pub fn party_bytes(&self) -> &[u8] {
        &self.bytes[PARTY_OFFSET..OT_NAME_OFFSET]
    }

    pub fn party_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[PARTY_OFFSET..OT_NAME_OFFSET]
    }

    /// Copies species id, party structure, OT name and nickname of `src_slot`
    /// in `src` over `dst_slot` of this record.
    ///
    /// Only copies bytes; safe to call from the edge path.
    pub fn copy_slot_from(
        &mut self,
        dst_slot: usize,
        src: &TradeRecord,
        src_slot: usize,
    ) -> Result<(), RecordError> {
        check_slot(dst_slot)?;
        check_slot(src_slot)?;

        self.bytes[PARTY_SPECIES_OFFSET + dst_slot] = src.bytes[PARTY_SPECIES_OFFSET + src_slot];
        for (base, len) in [
            (PARTY_OFFSET, POKEMON_STRUCT_LEN),
            (OT_NAME_OFFSET, NAME_LEN),
            (NICKNAME_OFFSET, NAME_LEN),
        ] {
            let dst = base + dst_slot * len;
            let src_start = base + src_slot * len;
            self.bytes[dst..dst + len].copy_from_slice(&src.bytes[src_start..src_start + len]);
        }
        Ok(())
    }

    fn name_at(&self, offset: usize) -> &[u8; NAME_LEN] {
        <&[u8; NAME_LEN]>::try_from(&self.bytes[offset..offset + NAME_LEN]).unwrap_or(&[0; NAME_LEN])
    }
}

impl Default for TradeRecord {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradeRecord")
            .field("trainer_name", self.trainer_name())
            .field("party_count", &self.party_count())
            .field(
                "species",
                &&self.bytes[PARTY_SPECIES_OFFSET..PARTY_SPECIES_OFFSET + PARTY_SIZE],
            )
            .finish_non_exhaustive()
    }
}
