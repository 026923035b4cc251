//! Contact-stream touch: MobileStudio Pro, DTH-1152 and Intuos Pro 2 touch
//! interfaces, plus the slot helpers shared with the Tablet PC decoder.
//!
//! A series of reports carries the contacts of one scan. Only the first
//! report of a series has a nonzero contact count; later reports continue
//! until the count is used up. Each contact is reported as its own frame.

use super::{DecodeResult, FrameSeq};
use crate::device::{DeviceProfile, Family, TouchStreamModel};
use crate::event::{Axis, EventSink, Key};
use crate::report::Report;
use crate::state::{tool_id, DecoderState};
use tracing::{debug, trace};

/// Contacts carried by one report at most.
pub(crate) const CONTACTS_PER_REPORT: usize = 5;
/// Contact record size of MobileStudio Pro and DTH-1152 touch reports.
const MSPROT_CONTACT_LEN: usize = 9;
/// Contact record size of Intuos Pro 2 touch reports.
const INTUOSP2_CONTACT_LEN: usize = 8;

/// Tool key reported for a contact slot. Slots past the second only
/// report through the slot axes.
pub(crate) fn slot_key(slot: usize) -> Option<Key> {
    match slot {
        0 => Some(Key::ToolDoubleTap),
        1 => Some(Key::ToolTripleTap),
        _ => None,
    }
}

/// Emit the slot axes for one contact, or its release when `contact` is
/// `None`. Single-contact channels have no slots.
pub(crate) fn report_slot(
    profile: &DeviceProfile,
    sink: &mut dyn EventSink,
    slot: usize,
    contact: Option<(u16, i32, i32)>,
) {
    if profile.touch_max <= 1 {
        return;
    }
    sink.set_abs(Axis::MtSlot, slot as i32);
    match contact {
        Some((id, x, y)) => {
            sink.set_abs(Axis::MtTrackingId, i32::from(id));
            sink.set_abs(Axis::MtPositionX, x);
            sink.set_abs(Axis::MtPositionY, y);
        }
        None => sink.set_abs(Axis::MtTrackingId, -1),
    }
}

/// Remember the tool-key state of `slot`.
pub(crate) fn set_slot_key(state: &mut DecoderState, slot: usize, down: bool) {
    if slot >= 16 {
        return;
    }
    if down {
        state.slot_keys |= 1 << slot;
    } else {
        state.slot_keys &= !(1 << slot);
    }
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    id: u16,
    prox: bool,
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// Count in byte 2, 9-byte records from byte 3.
    MobileStudio,
    /// Count in byte 1, 8-byte records from byte 2.
    IntuosPro2,
}

impl Layout {
    fn of(family: Family) -> Option<Self> {
        match family {
            Family::TouchStream(TouchStreamModel::MobileStudioPro | TouchStreamModel::Dth1152) => {
                Some(Self::MobileStudio)
            }
            Family::IntuosPro2 => Some(Self::IntuosPro2),
            _ => None,
        }
    }

    fn count(self, report: Report<'_>) -> usize {
        match self {
            Self::MobileStudio => usize::from(report.byte(2)),
            Self::IntuosPro2 => usize::from(report.byte(1)),
        }
    }

    fn contact(self, report: Report<'_>, i: usize) -> Contact {
        match self {
            Self::MobileStudio => {
                let r = report.slice_from(MSPROT_CONTACT_LEN * i + 3);
                Contact {
                    prox: r.bit(0, 0x01),
                    id: r.le16(1),
                    x: i32::from(r.le16(3)),
                    y: i32::from(r.le16(5)),
                }
            }
            Self::IntuosPro2 => {
                let r = report.slice_from(INTUOSP2_CONTACT_LEN * i + 2);
                Contact {
                    id: u16::from(r.byte(0)),
                    prox: r.bit(1, 0x01),
                    x: i32::from(r.le16(2)),
                    y: i32::from(r.le16(4)),
                }
            }
        }
    }
}

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let Some(layout) = Layout::of(profile.family) else {
        debug!(family = ?profile.family, "Contact stream: unsupported family");
        return DecodeResult::Ignored;
    };

    let count = layout.count(report);
    if count > 0 {
        state.contacts_left = count;
    }
    let to_send = state.contacts_left.min(CONTACTS_PER_REPORT);

    let mut seq = FrameSeq::new(sink);
    for i in 0..to_send {
        let contact = layout.contact(report, i);
        finger(profile, state, &mut seq, contact);
    }

    state.contacts_left -= to_send;
    if state.contacts_left == 0 {
        state.shared.set_touch_down(state.slot_keys & 0b11 != 0);
    }
    seq.finish(DecodeResult::StateOnly)
}

fn finger(profile: &DeviceProfile, state: &mut DecoderState, seq: &mut FrameSeq<'_>, contact: Contact) {
    let Some(slot) = state.slots.find(contact.id) else {
        trace!(contact = contact.id, "No free slot, contact dropped");
        return;
    };
    if contact.prox {
        state.slots.assign(contact.id);
    } else {
        state.slots.release(slot);
    }
    // Contacts are hidden while the pen is near.
    let prox = contact.prox && !state.shared.stylus_in_proximity();

    let out = seq.next();
    if prox {
        out.set_abs(Axis::X, contact.x);
        out.set_abs(Axis::Y, contact.y);
    }
    out.set_abs(Axis::Misc, tool_id::TOUCH as i32);
    if let Some(key) = slot_key(slot) {
        out.set_key(key, prox);
    }
    if slot == 0 {
        out.set_key(Key::Touch, prox);
    }
    out.misc_serial(slot as u32 + 1);
    report_slot(profile, out, slot, prox.then_some((contact.id, contact.x, contact.y)));
    set_slot_key(state, slot, prox);
}
