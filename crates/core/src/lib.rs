//! open-tablet-core: device profiles, capability declaration, and report
//! decoders for pen tablets, touch digitizers and pad controllers.
//!
//! The crate is transport-free. Callers hand raw interrupt reports to
//! [`dispatch::decode`] (or a [`dispatch::Tablet`]) and receive normalized
//! events through an [`event::EventSink`].

pub mod capability;
pub mod capture;
pub mod config;
pub mod decoder;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
#[cfg(test)]
mod integration_tests;
pub mod report;
pub mod slots;
pub mod state;
pub mod table;

/// Wacom USB Vendor ID.
pub const WACOM_VID: u16 = 0x056A;
