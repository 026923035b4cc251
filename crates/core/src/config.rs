//! Geometry overrides loaded from a JSON file.
//!
//! Some tablets ship with firmware that reports a different active area or
//! button count than the table documents. An override replaces those values
//! on the attached profile before capabilities are declared.

use crate::device::DeviceProfile;
use crate::error::{Error, Result};
use crate::event::MAX_NUMBERED_BUTTONS;
use crate::slots::MAX_SLOTS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Overrides document: `{ "devices": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices: Vec<DeviceOverride>,
}

/// Replacement values for one vendor/product pair. Absent fields keep the
/// table value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceOverride {
    pub vendor: u16,
    pub product: u16,
    /// Apply to the touch interface instead of the pen interface.
    #[serde(default)]
    pub touch: bool,
    #[serde(default)]
    pub x_max: Option<i32>,
    #[serde(default)]
    pub y_max: Option<i32>,
    #[serde(default)]
    pub pressure_max: Option<i32>,
    #[serde(default)]
    pub distance_max: Option<i32>,
    #[serde(default)]
    pub numbered_buttons: Option<u8>,
    #[serde(default)]
    pub touch_max: Option<u8>,
}

fn check_max(field: &'static str, value: Option<i32>) -> Result<()> {
    match value {
        Some(v) if v <= 0 => Err(Error::OutOfRange {
            field,
            value: i64::from(v),
            min: 1,
            max: i64::from(i32::MAX),
        }),
        _ => Ok(()),
    }
}

fn check_count(field: &'static str, value: Option<u8>, max: usize) -> Result<()> {
    match value {
        Some(v) if usize::from(v) > max => Err(Error::OutOfRange {
            field,
            value: i64::from(v),
            min: 0,
            max: max as i64,
        }),
        _ => Ok(()),
    }
}

impl DeviceOverride {
    pub fn validate(&self) -> Result<()> {
        check_max("x_max", self.x_max)?;
        check_max("y_max", self.y_max)?;
        check_max("pressure_max", self.pressure_max)?;
        check_max("distance_max", self.distance_max)?;
        check_count("numbered_buttons", self.numbered_buttons, MAX_NUMBERED_BUTTONS)?;
        check_count("touch_max", self.touch_max, MAX_SLOTS)?;
        Ok(())
    }

    fn matches(&self, profile: &DeviceProfile) -> bool {
        self.vendor == profile.vendor && self.product == profile.product && self.touch == profile.is_touch()
    }

    /// Write the present fields into `profile`.
    pub fn apply(&self, profile: &mut DeviceProfile) {
        if let Some(v) = self.x_max {
            profile.x_max = v;
        }
        if let Some(v) = self.y_max {
            profile.y_max = v;
        }
        if let Some(v) = self.pressure_max {
            profile.pressure_max = v;
        }
        if let Some(v) = self.distance_max {
            profile.distance_max = v;
        }
        if let Some(v) = self.numbered_buttons {
            profile.numbered_buttons = v;
        }
        if let Some(v) = self.touch_max {
            profile.touch_max = v;
        }
        profile.quirks.geometry_override = true;
        debug!(
            vendor = profile.vendor,
            product = profile.product,
            touch = self.touch,
            "Geometry override applied"
        );
    }
}

impl Config {
    /// Parse and validate an overrides document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate an overrides file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.devices.iter().try_for_each(DeviceOverride::validate)
    }

    /// Apply the override for this profile's device and channel, if any.
    /// Returns whether one was applied.
    pub fn apply(&self, profile: &mut DeviceProfile) -> bool {
        match self.devices.iter().find(|o| o.matches(profile)) {
            Some(o) => {
                o.apply(profile);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceType, InterfaceInfo};
    use crate::table;

    fn profile(product: u16, iface: InterfaceInfo) -> DeviceProfile {
        let entry = table::lookup(crate::WACOM_VID, product).expect("table entry");
        DeviceProfile::attach(entry, iface)
    }

    #[test]
    fn parses_partial_override() {
        let config = Config::from_json(
            r#"{ "devices": [ { "vendor": 1386, "product": 16, "x_max": 12000 } ] }"#,
        )
        .expect("valid config");
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].x_max, Some(12000));
        assert_eq!(config.devices[0].y_max, None);
        assert!(!config.devices[0].touch);
    }

    #[test]
    fn empty_document_is_valid() {
        assert_eq!(Config::from_json("{}").expect("valid"), Config::default());
    }

    #[test]
    fn rejects_non_positive_maxima() {
        let err = Config::from_json(r#"{ "devices": [ { "vendor": 1386, "product": 16, "y_max": 0 } ] }"#)
            .expect_err("zero y_max");
        assert!(matches!(err, Error::OutOfRange { field: "y_max", .. }));
    }

    #[test]
    fn rejects_too_many_contacts() {
        let err = Config::from_json(
            r#"{ "devices": [ { "vendor": 1386, "product": 227, "touch": true, "touch_max": 11 } ] }"#,
        )
        .expect_err("touch_max above slot limit");
        assert!(matches!(err, Error::OutOfRange { field: "touch_max", value: 11, .. }));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_json() {
        assert!(matches!(
            Config::from_json(r#"{ "devices": [ { "vendor": 1, "product": 2, "xmax": 3 } ] }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(Config::from_json("not json"), Err(Error::Config(_))));
    }

    #[test]
    fn applies_to_matching_channel_only() {
        let config = Config::from_json(
            r#"{ "devices": [ { "vendor": 1386, "product": 227, "touch": true, "x_max": 4095, "touch_max": 2 } ] }"#,
        )
        .expect("valid config");

        let mut pen = profile(0xE3, InterfaceInfo::pen());
        let pen_before = pen.clone();
        assert!(!config.apply(&mut pen));
        assert_eq!(pen, pen_before);

        let mut touch = profile(0xE3, InterfaceInfo::touch(DeviceType::DoubleTap));
        assert!(config.apply(&mut touch));
        assert_eq!(touch.x_max, 4095);
        assert_eq!(touch.touch_max, 2);
        assert!(touch.quirks.geometry_override);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = Config::load(Path::new("/nonexistent/open-tablet.json")).expect_err("missing file");
        assert!(matches!(err, Error::Config(_)));
    }
}
