// Live station readout: the raw sensor fields and derived weather status a
// monitoring plugin samples, as labelled readings. Output follows munin
// plaintext ("label value", U for unavailable).

use crate::device::{DeviceClient, DeviceError};

/// One labelled reading. `None` renders as `U`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub label: &'static str,
    pub value: Option<f64>,
}

/// Raw sensor fields: humidity, IR and pressure sensors with their
/// per-sensor temperatures.
pub fn raw_parameters(
    client: &impl DeviceClient,
    device: &str,
) -> Result<Vec<Reading>, DeviceError> {
    let ir = client.get_vector(device, "IR")?;
    let humidity = client.get_vector(device, "Humidity")?;
    let pressure = client.get_vector(device, "Pressure")?;
    Ok(vec![
        Reading {
            label: "HR",
            value: humidity.float("HR")?,
        },
        Reading {
            label: "Thr",
            value: humidity.float("T")?,
        },
        Reading {
            label: "IR",
            value: ir.float("IR")?,
        },
        Reading {
            label: "Tir",
            value: ir.float("T")?,
        },
        Reading {
            label: "P",
            value: pressure.float("P")?,
        },
        Reading {
            label: "Tp",
            value: pressure.float("T")?,
        },
    ])
}

/// Derived weather parameters plus the status flags (1 = ok, 0 = alert).
/// Flag labels are the protocol element names.
pub fn weather_status(
    client: &impl DeviceClient,
    device: &str,
) -> Result<Vec<Reading>, DeviceError> {
    let meteo = client.get_vector(device, "WEATHER_PARAMETERS")?;
    let status = client.get_vector(device, "WEATHER_STATUS")?;

    let flag = |label: &'static str, element: &'static str| -> Result<Reading, DeviceError> {
        let e = status
            .element(element)
            .ok_or_else(|| DeviceError::ElementMissing {
                vector: status.name.clone(),
                element: element.to_string(),
            })?;
        Ok(Reading {
            label,
            value: Some(if e.is_ok() { 1.0 } else { 0.0 }),
        })
    };

    Ok(vec![
        Reading {
            label: "T",
            value: meteo.float("WEATHER_TEMPERATURE")?,
        },
        Reading {
            label: "dew",
            value: meteo.float("WEATHER_DEWPOINT")?,
        },
        Reading {
            label: "clouds",
            value: meteo.float("WEATHER_CLOUD_COVER")?,
        },
        Reading {
            label: "skyT",
            value: meteo.float("WEATHER_SKY_TEMPERATURE")?,
        },
        // "frezzing" is the element name the firmware publishes.
        flag("cloudFlag", "clouds")?,
        flag("dewFlag", "dew")?,
        flag("frezzingFlag", "frezzing")?,
    ])
}

/// Munin plaintext: one "label value" line per reading.
pub fn render(readings: &[Reading]) -> String {
    let mut out = String::new();
    for r in readings {
        match r.value {
            Some(v) => out.push_str(&format!("{} {}\n", r.label, v)),
            None => out.push_str(&format!("{} U\n", r.label)),
        }
    }
    out
}
