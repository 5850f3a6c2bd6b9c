// Config tests: defaults, parsing, validation.

use weatherradio::config::AppConfig;

#[test]
fn empty_config_yields_defaults() {
    let config = AppConfig::load_from_str("").unwrap();
    assert_eq!(config.station.elevation_m, 0.0);
    assert_eq!(config.device.host, "rasp-star");
    assert_eq!(config.device.port, 7624);
    assert_eq!(config.device.name, "Arduino MeteoStation");
}

#[test]
fn full_config_parses() {
    let config = AppConfig::load_from_str(
        r#"
        [station]
        elevation_m = 785.0

        [device]
        host = "observatory"
        port = 7625
        name = "Weather Radio"
        "#,
    )
    .unwrap();
    assert_eq!(config.station.elevation_m, 785.0);
    assert_eq!(config.device.host, "observatory");
    assert_eq!(config.device.port, 7625);
    assert_eq!(config.device.name, "Weather Radio");
}

#[test]
fn partial_section_keeps_other_defaults() {
    let config = AppConfig::load_from_str("[station]\nelevation_m = 120.5\n").unwrap();
    assert_eq!(config.station.elevation_m, 120.5);
    assert_eq!(config.device.port, 7624);
}

#[test]
fn out_of_range_elevation_is_rejected() {
    assert!(AppConfig::load_from_str("[station]\nelevation_m = 99999.0\n").is_err());
    assert!(AppConfig::load_from_str("[station]\nelevation_m = -2000.0\n").is_err());
}

#[test]
fn empty_device_fields_are_rejected() {
    assert!(AppConfig::load_from_str("[device]\nhost = \"\"\n").is_err());
    assert!(AppConfig::load_from_str("[device]\nname = \"\"\n").is_err());
}
