//! Host HID access through hidapi: interface discovery and report reads.

use open_tablet_core::error::{Error, Result};
use open_tablet_core::table;
use std::ffi::CString;
use tracing::{debug, info};

/// Largest interrupt report any supported interface sends.
pub const MAX_REPORT_LEN: usize = 128;
/// Read timeout so the listen loop stays responsive.
const READ_TIMEOUT_MS: i32 = 1000;

/// One HID interface of a device from a supported vendor.
#[derive(Debug, Clone)]
pub struct HidInterface {
    pub vendor: u16,
    pub product: u16,
    pub interface: i32,
    pub path: String,
    /// Table name, when the product is known.
    pub name: Option<&'static str>,
    pub product_string: Option<String>,
    pub serial: Option<String>,
}

/// Enumerate HID interfaces whose vendor appears in the device table.
pub fn discover() -> Result<Vec<HidInterface>> {
    debug!("Starting HID device enumeration");
    let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;

    let mut found = Vec::new();
    for info in api.device_list() {
        if !table::is_supported_vendor(info.vendor_id()) {
            continue;
        }
        let name = table::lookup(info.vendor_id(), info.product_id()).map(|e| e.name);
        info!(
            vid = format_args!("0x{:04X}", info.vendor_id()),
            pid = format_args!("0x{:04X}", info.product_id()),
            interface = info.interface_number(),
            known = name.is_some(),
            path = %info.path().to_string_lossy(),
            "Found tablet interface"
        );
        found.push(HidInterface {
            vendor: info.vendor_id(),
            product: info.product_id(),
            interface: info.interface_number(),
            path: info.path().to_string_lossy().into_owned(),
            name,
            product_string: info.product_string().map(str::to_string),
            serial: info.serial_number().map(str::to_string),
        });
    }

    debug!(count = found.len(), "Device enumeration complete");
    Ok(found)
}

/// An open interface delivering raw interrupt reports.
pub struct ReportReader {
    device: hidapi::HidDevice,
}

impl ReportReader {
    /// Open `vendor:product`, on `interface` when given, else the first
    /// matching interface.
    pub fn open(vendor: u16, product: u16, interface: Option<i32>) -> Result<Self> {
        let candidates: Vec<HidInterface> = discover()?
            .into_iter()
            .filter(|i| i.vendor == vendor && i.product == product)
            .filter(|i| interface.map_or(true, |n| n == i.interface))
            .collect();
        let target = candidates.first().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "VID=0x{vendor:04X} PID=0x{product:04X}{}",
                interface.map(|n| format!(" interface {n}")).unwrap_or_default()
            ))
        })?;

        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(format!("hidapi init: {e}")))?;
        let path = CString::new(target.path.clone()).map_err(|e| Error::Hid(format!("device path: {e}")))?;
        let device = api
            .open_path(&path)
            .map_err(|e| Error::Hid(format!("open {}: {e}", target.path)))?;
        info!(interface = target.interface, path = %target.path, "Interface opened");
        Ok(Self { device })
    }

    /// Read one report into `buf`. Returns `Ok(None)` on timeout.
    pub fn read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        let n = self
            .device
            .read_timeout(buf, READ_TIMEOUT_MS)
            .map_err(|e| Error::Hid(format!("read_timeout: {e}")))?;
        Ok((n > 0).then_some(n))
    }
}
