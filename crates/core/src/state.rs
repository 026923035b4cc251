//! Per-channel decoder memory and the flags shared between the pen and
//! touch channels of one physical tablet.

use crate::device::{DeviceProfile, Family};
use crate::event::Key;
use crate::slots::SlotTable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tool identifiers reported on the misc axis.
pub mod tool_id {
    pub const STYLUS: u32 = 0x02;
    pub const TOUCH: u32 = 0x03;
    pub const CURSOR: u32 = 0x06;
    pub const ERASER: u32 = 0x0A;
    pub const PAD: u32 = 0x0F;
}

/// Untouched position reported by the Intuos Pro 2 ring.
pub const RING_UNTOUCHED: u16 = 0x7f;

/// Tool currently associated with a channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Pen,
    Rubber,
    Brush,
    Pencil,
    Airbrush,
    Mouse,
    Lens,
}

impl Tool {
    /// Proximity key for this tool.
    pub fn key(self) -> Key {
        match self {
            Self::Pen => Key::ToolPen,
            Self::Rubber => Key::ToolRubber,
            Self::Brush => Key::ToolBrush,
            Self::Pencil => Key::ToolPencil,
            Self::Airbrush => Key::ToolAirbrush,
            Self::Mouse => Key::ToolMouse,
            Self::Lens => Key::ToolLens,
        }
    }

    /// Puck-style tools that carry mouse buttons instead of a tip.
    pub fn is_cursor(self) -> bool {
        matches!(self, Self::Mouse | Self::Lens)
    }
}

#[derive(Debug, Default)]
struct SharedFlags {
    stylus_in_proximity: AtomicBool,
    touch_down: AtomicBool,
}

/// Flags shared by the sibling channels of one tablet.
///
/// Cloning yields another handle to the same flags. Both channels are
/// processed sequentially; the atomics only make the handle `Send`.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<SharedFlags>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stylus_in_proximity(&self) -> bool {
        self.0.stylus_in_proximity.load(Ordering::Relaxed)
    }

    pub fn set_stylus_in_proximity(&self, value: bool) {
        self.0.stylus_in_proximity.store(value, Ordering::Relaxed);
    }

    pub fn touch_down(&self) -> bool {
        self.0.touch_down.load(Ordering::Relaxed)
    }

    pub fn set_touch_down(&self, value: bool) {
        self.0.touch_down.store(value, Ordering::Relaxed);
    }

    /// Whether `other` is a handle to the same flags.
    pub fn same_tablet(&self, other: &SharedState) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Two handles compare equal when their flag values match.
impl PartialEq for SharedState {
    fn eq(&self, other: &Self) -> bool {
        self.stylus_in_proximity() == other.stylus_in_proximity()
            && self.touch_down() == other.touch_down()
    }
}

impl Eq for SharedState {}

/// Decoder memory for one logical channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderState {
    /// Tool in proximity per tool index. Only first-generation Intuos uses
    /// index 1 for a second simultaneous tool.
    pub tool: [Option<Tool>; 2],
    /// Raw tool id per tool index; zero when no tool is known.
    pub id: [u32; 2],
    pub serial: [u32; 2],
    /// A professional-tablet tool has sent at least one data packet since
    /// entering proximity.
    pub reporting_data: bool,
    /// Proximity latch for decoders that need the previous report's state.
    pub in_proximity: bool,
    /// A pad reported activity last time and still needs its release frame.
    pub pad_active: bool,
    /// Finger bitmask of legacy touch reports (bit 0 first finger).
    pub fingers: u8,
    /// Tool-key state last reported for each contact slot.
    pub slot_keys: u16,
    pub slots: SlotTable,
    /// Contacts still expected from a report series.
    pub contacts_left: usize,
    /// Contacts the legacy MT Tablet PC protocol will report for this series.
    pub contacts_to_send: usize,
    pub previous_buttons: u32,
    pub previous_ring: u16,
    pub shared: SharedState,
}

impl DecoderState {
    /// Fresh state for `profile`, sharing `shared` with its siblings.
    pub fn new(profile: &DeviceProfile, shared: SharedState) -> Self {
        let previous_ring = match profile.family {
            Family::IntuosPro2 if !profile.is_touch() => RING_UNTOUCHED,
            _ => 0,
        };
        Self {
            tool: [None; 2],
            id: [0; 2],
            serial: [0; 2],
            reporting_data: false,
            in_proximity: false,
            pad_active: false,
            fingers: 0,
            slot_keys: 0,
            slots: SlotTable::new(profile.slot_count()),
            contacts_left: 0,
            contacts_to_send: 0,
            previous_buttons: 0,
            previous_ring,
            shared,
        }
    }

    /// State for a channel that has no sibling.
    pub fn standalone(profile: &DeviceProfile) -> Self {
        Self::new(profile, SharedState::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::InterfaceInfo;
    use crate::table;

    fn profile(product: u16, iface: InterfaceInfo) -> DeviceProfile {
        let entry = table::lookup(crate::WACOM_VID, product).expect("table entry");
        DeviceProfile::attach(entry, iface)
    }

    #[test]
    fn shared_flags_are_visible_to_siblings() {
        let shared = SharedState::new();
        let pen = DecoderState::new(&profile(0xE3, InterfaceInfo::pen()), shared.clone());
        let touch = DecoderState::new(
            &profile(0xE3, InterfaceInfo::touch(crate::device::DeviceType::DoubleTap)),
            shared.clone(),
        );
        pen.shared.set_stylus_in_proximity(true);
        assert!(touch.shared.stylus_in_proximity());
        touch.shared.set_touch_down(true);
        assert!(pen.shared.touch_down());
        assert!(pen.shared.same_tablet(&touch.shared));
        assert!(!pen.shared.same_tablet(&SharedState::new()));
    }

    #[test]
    fn intuos_pro2_pad_starts_untouched() {
        let pen = DecoderState::standalone(&profile(0x357, InterfaceInfo::pen()));
        assert_eq!(pen.previous_ring, RING_UNTOUCHED);
        let touch = DecoderState::standalone(&profile(0x357, InterfaceInfo::default().with_packet_size(44)));
        assert_eq!(touch.previous_ring, 0);
        assert_eq!(touch.slots.len(), 10);
    }

    #[test]
    fn cursor_tools() {
        assert!(Tool::Mouse.is_cursor());
        assert!(Tool::Lens.is_cursor());
        assert!(!Tool::Airbrush.is_cursor());
        assert_eq!(Tool::Rubber.key(), Key::ToolRubber);
    }
}
