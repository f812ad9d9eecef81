use pkmn_link_cli::config::{ConfigError, PartyConfig, load_from_file, save_to_file};
use pkmn_link_core::record::TRADE_RECORD_LEN;
use pkmn_link_core::text::TextError;
use pkmn_link_core::wire::SERIAL_NO_DATA_BYTE;

#[test]
fn missing_file_falls_back_to_default_party() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cfg = load_from_file(&dir.path().join("absent.toml"));
    assert_eq!(cfg, PartyConfig::default());
}

#[test]
fn saved_party_loads_back() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("party.toml");

    let mut cfg = PartyConfig::default();
    cfg.trainer_name = "GREEN".to_string();
    cfg.pokemon.species = 0x54;
    cfg.pokemon.nickname = "PIKACHU".to_string();
    cfg.pokemon.level = 25;

    save_to_file(&path, &cfg).expect("save party");
    assert_eq!(load_from_file(&path), cfg);
}

#[test]
fn malformed_file_falls_back_to_default_party() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("party.toml");
    std::fs::write(&path, "trainer_name = [not toml").expect("write config");
    assert_eq!(load_from_file(&path), PartyConfig::default());
}

#[test]
fn traded_record_saves_as_new_party() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("party.toml");

    let mut offered = PartyConfig::default().to_record().expect("record");
    let mut incoming = PartyConfig::default();
    incoming.pokemon.species = 0xB1;
    incoming.pokemon.nickname = "SQUIRTLE".to_string();
    incoming.pokemon.ot_name = "BLUE".to_string();
    let incoming = incoming.to_record().expect("record");
    offered.copy_slot_from(0, &incoming, 0).expect("copy slot");

    let received = PartyConfig::from_record(&offered).expect("read back");
    save_to_file(&path, &received).expect("save party");

    let loaded = load_from_file(&path);
    assert_eq!(loaded.trainer_name, "RED");
    assert_eq!(loaded.pokemon.species, 0xB1);
    assert_eq!(loaded.pokemon.ot_name, "BLUE");
    assert_eq!(loaded.to_record().expect("record"), offered);
}

#[test]
fn names_with_digit_eight_are_refused() {
    let mut cfg = PartyConfig::default();
    cfg.pokemon.nickname = "PORYGON8".to_string();
    assert!(matches!(
        cfg.to_record(),
        Err(ConfigError::Name {
            field: "pokemon.nickname",
            source: TextError::NoDataByte('8')
        })
    ));

    let mut cfg = PartyConfig::default();
    cfg.trainer_name = "RED8".to_string();
    assert!(matches!(
        cfg.to_record(),
        Err(ConfigError::Name {
            field: "trainer_name",
            ..
        })
    ));
}

#[test]
fn accepted_names_never_put_no_data_byte_on_the_wire() {
    let mut cfg = PartyConfig::default();
    cfg.trainer_name = "ASH9".to_string();
    cfg.pokemon.nickname = "PORYGON2".to_string();
    cfg.pokemon.ot_name = "0123456 79".to_string();
    let record = cfg.to_record().expect("record");

    let on_wire: Vec<usize> = (0..TRADE_RECORD_LEN)
        .filter(|&i| record.wire_byte(i) == SERIAL_NO_DATA_BYTE)
        .collect();
    assert!(on_wire.is_empty(), "0xFE on wire at offsets {on_wire:?}");
}
