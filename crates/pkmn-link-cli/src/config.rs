use std::path::{Path, PathBuf};

use log::{info, warn};
use pkmn_link_core::record::{PokemonStructure, RecordError, TradeRecord};
use pkmn_link_core::text::{TextError, decode_name, encode_name};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access party config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize party config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{field}: {source}")]
    Name {
        field: &'static str,
        #[source]
        source: TextError,
    },
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// The pokemon offered for trade. Field values are raw Gen I ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PokemonConfig {
    pub species: u8,
    pub nickname: String,
    pub ot_name: String,
    pub ot_id: u16,
    pub level: u8,
    pub exp: u32,
    pub types: [u8; 2],
    pub catch_rate: u8,
    pub moves: [u8; 4],
    pub pp: [u8; 4],
    pub ivs: u16,
    pub hp: u16,
    pub max_hp: u16,
    /// Attack, defense, speed, special.
    pub stats: [u16; 4],
}

impl Default for PokemonConfig {
    // A freshly caught level 5 Bulbasaur.
    fn default() -> Self {
        Self {
            species: 0x99,
            nickname: "BULBASAUR".to_string(),
            ot_name: "RED".to_string(),
            ot_id: 0x3039,
            level: 5,
            exp: 135,
            types: [0x16, 0x03],
            catch_rate: 45,
            moves: [0x21, 0x2D, 0, 0],
            pp: [35, 40, 0, 0],
            ivs: 0xAAAA,
            hp: 20,
            max_hp: 20,
            stats: [10, 10, 10, 12],
        }
    }
}

impl PokemonConfig {
    pub fn to_structure(&self) -> PokemonStructure {
        let mut mon = PokemonStructure::default();
        mon.set_species(self.species);
        mon.set_hp(self.hp);
        mon.set_level(self.level);
        mon.set_types(self.types[0], self.types[1]);
        mon.set_catch_rate(self.catch_rate);
        mon.set_moves(self.moves);
        mon.set_ot_id(self.ot_id);
        mon.set_exp(self.exp);
        mon.set_ivs(self.ivs);
        mon.set_pp(self.pp);
        mon.set_max_hp(self.max_hp);
        mon.set_stats(self.stats);
        mon
    }

    fn from_structure(mon: &PokemonStructure, nickname: String, ot_name: String) -> Self {
        let (type1, type2) = mon.types();
        Self {
            species: mon.species(),
            nickname,
            ot_name,
            ot_id: mon.ot_id(),
            level: mon.level(),
            exp: mon.exp(),
            types: [type1, type2],
            catch_rate: mon.catch_rate(),
            moves: mon.moves(),
            pp: mon.pp(),
            ivs: mon.ivs(),
            hp: mon.hp(),
            max_hp: mon.max_hp(),
            stats: mon.stats(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    pub trainer_name: String,
    pub pokemon: PokemonConfig,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            trainer_name: "RED".to_string(),
            pokemon: PokemonConfig::default(),
        }
    }
}

impl PartyConfig {
    /// Builds a one-pokemon trade record.
    pub fn to_record(&self) -> Result<TradeRecord, ConfigError> {
        let encode = |field, name: &str| {
            encode_name(name).map_err(|source| ConfigError::Name { field, source })
        };

        Ok(TradeRecord::with_single(
            encode("trainer_name", &self.trainer_name)?,
            &self.pokemon.to_structure(),
            encode("pokemon.ot_name", &self.pokemon.ot_name)?,
            encode("pokemon.nickname", &self.pokemon.nickname)?,
        ))
    }

    /// Reads the trainer and slot 0 back out of a record.
    pub fn from_record(record: &TradeRecord) -> Result<Self, ConfigError> {
        let mon = record.pokemon(0).ok_or(RecordError::Slot(0))?;
        let nickname = record.nickname(0).ok_or(RecordError::Slot(0))?;
        let ot_name = record.ot_name(0).ok_or(RecordError::Slot(0))?;
        Ok(Self {
            trainer_name: decode_name(record.trainer_name()),
            pokemon: PokemonConfig::from_structure(
                &mon,
                decode_name(nickname),
                decode_name(ot_name),
            ),
        })
    }
}

pub fn default_party_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("pkmn-link").join("party.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("pkmn-link").join("party.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("pkmn-link")
            .join("party.toml");
    }

    PathBuf::from("party.toml")
}

/// Loads the party, falling back to the default one when the file is missing
/// or unreadable.
pub fn load_from_file(path: &Path) -> PartyConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            info!("No party config at {}; using defaults", path.display());
            return PartyConfig::default();
        }
    };

    match toml::from_str::<PartyConfig>(&text) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(
                "Failed to parse party config {}: {e}; using defaults",
                path.display()
            );
            PartyConfig::default()
        }
    }
}

pub fn save_to_file(path: &Path, cfg: &PartyConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let text = toml::to_string_pretty(cfg)?;
    std::fs::write(path, text)?;
    Ok(())
}
