use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// Station height above sea level in meters, used to reduce raw pressure
    /// readings to sea level. 0 leaves readings untouched.
    #[serde(default)]
    pub elevation_m: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self { elevation_m: 0.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Device name the station publishes its vectors under.
    #[serde(default = "default_device_name")]
    pub name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: default_device_name(),
        }
    }
}

fn default_host() -> String {
    "rasp-star".into()
}

fn default_port() -> u16 {
    7624
}

fn default_device_name() -> String {
    "Arduino MeteoStation".into()
}

impl AppConfig {
    /// Loads from `CONFIG_FILE` (or `config.toml`). A missing file yields
    /// the defaults; a present but invalid file is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        match std::fs::read_to_string(&path) {
            Ok(s) => Self::load_from_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.station.elevation_m.is_finite(),
            "station.elevation_m must be finite"
        );
        anyhow::ensure!(
            (-500.0..=9000.0).contains(&self.station.elevation_m),
            "station.elevation_m must be between -500 and 9000, got {}",
            self.station.elevation_m
        );
        anyhow::ensure!(
            self.device.port > 0,
            "device.port must be between 1 and 65535, got {}",
            self.device.port
        );
        anyhow::ensure!(!self.device.host.is_empty(), "device.host must be non-empty");
        anyhow::ensure!(!self.device.name.is_empty(), "device.name must be non-empty");
        Ok(())
    }
}
