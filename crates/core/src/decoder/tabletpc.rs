//! Tablet PC (ISDv4) digitizers: a pen interface plus a touch interface
//! that is single-finger, two-finger, or 40-byte multi-touch.

use super::multitouch::{report_slot, set_slot_key, slot_key, CONTACTS_PER_REPORT};
use super::{rest_position, DecodeResult, FrameSeq, PenSample};
use crate::device::DeviceProfile;
use crate::event::{Axis, EventSink, Key};
use crate::report::{ids, len, Report};
use crate::state::{tool_id, DecoderState, Tool};
use tracing::{debug, trace};

/// Contact record size of 40-byte multi-touch reports. Every multi-touch
/// model, B and C included, packs state, contact id, x and y with no
/// width or height fields.
const MTTPC_CONTACT_LEN: usize = 7;
/// Contacts beyond this count make the legacy 40-byte protocol drop the scan.
const MTTPC_LEGACY_CONTACTS: usize = 2;

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if profile.is_touch() {
        touch(profile, state, report, sink)
    } else if report.id() == ids::PENABLED || report.len() == len::PENABLED {
        pen(profile, state, report, sink)
    } else {
        debug!(report_id = report.id(), len = report.len(), "Tablet PC: unknown pen report");
        DecodeResult::Ignored
    }
}

fn pen(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let b1 = report.byte(1);
    let prox = b1 & 0x20 != 0;

    // The tool is latched on entering proximity.
    if !state.shared.stylus_in_proximity() {
        let (tool, id) = if b1 & 0x0c != 0 {
            (Tool::Rubber, tool_id::ERASER)
        } else {
            (Tool::Pen, tool_id::STYLUS)
        };
        state.tool[0] = Some(tool);
        state.id[0] = id;
    }
    state.shared.set_stylus_in_proximity(prox);
    if state.shared.touch_down() {
        return DecodeResult::StateOnly;
    }
    let tool = state.tool[0].unwrap_or(Tool::Pen);

    PenSample {
        pressure: (i32::from(report.byte(7) & 0x07) << 8) | i32::from(report.byte(6)),
        touch: b1 & 0x05 != 0,
        stylus: b1 & 0x02 != 0,
        stylus2: b1 & 0x10 != 0,
    }
    .in_proximity(prox)
    .report(sink);

    if prox {
        sink.set_abs(Axis::X, i32::from(report.le16(2)));
        sink.set_abs(Axis::Y, i32::from(report.le16(4)));
    } else {
        state.id[0] = 0;
        rest_position(profile, sink);
    }
    sink.set_key(tool.key(), prox);
    sink.set_abs(Axis::Misc, state.id[0] as i32);
    DecodeResult::Commit
}

fn touch(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let mut seq = FrameSeq::new(sink);

    // The pen has priority: release every finger while it is near.
    if state.shared.stylus_in_proximity() {
        for idx in 0..2 {
            if state.fingers & (1 << idx) != 0 {
                touch_out(&mut seq, idx);
            }
        }
        if state.slot_keys != 0 {
            release_mt_slots(profile, state, &mut seq);
            state.contacts_to_send = 0;
        }
        state.fingers = 0;
        state.shared.set_touch_down(false);
        return seq.finish(DecodeResult::StateOnly);
    }

    let id = report.id();
    let prox = match report.len() {
        len::MTTPC => return multitouch(profile, state, report, seq),
        len::TPC1FG => report.byte(0) & 0x01,
        len::TPC1FG_B => report.byte(2) & 0x01,
        _ if id == ids::TPC1FG => report.byte(1) & 0x01,
        _ if id == ids::TPC2FG => report.byte(1) & 0x03,
        _ => {
            debug!(report_id = id, len = report.len(), "Tablet PC: unknown touch report");
            return DecodeResult::Ignored;
        }
    };

    if prox != 0 {
        state.id[0] = tool_id::TOUCH;
        match report.len() {
            len::TPC1FG_B => single_finger(&mut seq, state, report.le16(3), report.le16(5), None),
            len::TPC1FG => single_finger(&mut seq, state, report.le16(1), report.le16(3), None),
            _ if id == ids::TPC1FG => {
                let pressure = i32::from(report.le16(6));
                single_finger(&mut seq, state, report.le16(2), report.le16(4), Some(pressure));
            }
            _ => {
                for idx in 0..2 {
                    if prox & (1 << idx) != 0 {
                        finger_in(&mut seq, state, report, idx);
                    } else if state.fingers & (1 << idx) != 0 {
                        touch_out(&mut seq, idx);
                    }
                }
            }
        }
    } else {
        if id == ids::TPC2FG && report.len() != len::TPC1FG && report.len() != len::TPC1FG_B {
            for idx in 0..2 {
                if state.fingers & (1 << idx) != 0 {
                    touch_out(&mut seq, idx);
                }
            }
        } else if state.fingers & 0x01 != 0 {
            touch_out(&mut seq, 0);
        }
        state.id[0] = 0;
    }

    state.fingers = prox;
    state.shared.set_touch_down(prox != 0);
    seq.finish(DecodeResult::StateOnly)
}

fn single_finger(seq: &mut FrameSeq<'_>, state: &DecoderState, x: u16, y: u16, pressure: Option<i32>) {
    let out = seq.next();
    out.set_abs(Axis::X, i32::from(x));
    out.set_abs(Axis::Y, i32::from(y));
    match pressure {
        Some(p) => {
            out.set_abs(Axis::Pressure, p);
            out.set_key(Key::Touch, p != 0);
        }
        None => out.set_key(Key::Touch, true),
    }
    out.set_abs(Axis::Misc, state.id[0] as i32);
    out.set_key(Key::ToolDoubleTap, true);
}

/// Two-finger packets carry finger `idx` at a fixed offset.
fn finger_in(seq: &mut FrameSeq<'_>, state: &DecoderState, report: Report<'_>, idx: usize) {
    let finger = idx + 1;
    let x = report.le16(finger * 2) & 0x7fff;
    let y = report.le16(4 + finger * 2) & 0x7fff;
    let out = seq.next();
    out.set_abs(Axis::X, i32::from(x));
    out.set_abs(Axis::Y, i32::from(y));
    out.set_abs(Axis::Misc, state.id[0] as i32);
    if let Some(key) = slot_key(idx) {
        out.set_key(key, true);
    }
    if idx == 0 {
        out.set_key(Key::Touch, true);
    }
    out.misc_serial(finger as u32);
}

fn touch_out<'s>(seq: &'s mut FrameSeq<'_>, idx: usize) -> &'s mut dyn EventSink {
    let out = seq.next();
    out.set_abs(Axis::Misc, 0);
    if let Some(key) = slot_key(idx) {
        out.set_key(key, false);
    }
    if idx == 0 {
        out.set_key(Key::Touch, false);
    }
    out.misc_serial(idx as u32 + 1);
    out
}

/// Lift every slot the 40-byte protocol has reported down.
fn release_mt_slots(profile: &DeviceProfile, state: &mut DecoderState, seq: &mut FrameSeq<'_>) {
    for slot in 0..MTTPC_LEGACY_CONTACTS {
        let out = touch_out(seq, slot);
        report_slot(profile, out, slot, None);
    }
    state.slots.clear();
    state.slot_keys = 0;
}

fn multitouch(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    mut seq: FrameSeq<'_>,
) -> DecodeResult {
    state.id[0] = tool_id::TOUCH;
    let count = usize::from(report.byte(2));
    let mut touching = 0;

    if count > 0 {
        state.contacts_left = count;
        if count > MTTPC_LEGACY_CONTACTS {
            // Too many contacts for this protocol: lift what is down.
            if state.contacts_to_send > 0 {
                release_mt_slots(profile, state, &mut seq);
                state.contacts_to_send = 0;
                state.fingers = 0;
            }
        } else {
            state.contacts_to_send = count;
            for i in 0..count {
                let r = report.slice_from(MTTPC_CONTACT_LEN * i + 3);
                let down = r.bit(0, 0x01);
                let contact = r.le16(1);
                let Some(slot) = state.slots.find(contact) else {
                    trace!(contact, "No free slot, contact dropped");
                    continue;
                };
                let (x, y) = (i32::from(r.le16(3)), i32::from(r.le16(5)));

                set_slot_key(state, slot, down);
                if down {
                    state.slots.assign(contact);
                } else {
                    state.slots.release(slot);
                }

                let out = seq.next();
                out.set_abs(Axis::X, x);
                out.set_abs(Axis::Y, y);
                let misc = if state.slot_keys == 0 { 0 } else { tool_id::TOUCH };
                out.set_abs(Axis::Misc, misc as i32);
                if let Some(key) = slot_key(slot) {
                    out.set_key(key, down);
                }
                if slot == 0 {
                    out.set_key(Key::Touch, down);
                }
                out.misc_serial(slot as u32 + 1);
                report_slot(profile, out, slot, down.then_some((contact, x, y)));
                touching += usize::from(down);
            }
        }
    }

    state.shared.set_touch_down(touching > 0);
    state.contacts_left -= state.contacts_left.min(CONTACTS_PER_REPORT);
    seq.finish(DecodeResult::StateOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceType, InterfaceInfo};
    use crate::event::EventRecorder;
    use crate::state::SharedState;
    use crate::table;

    struct Tablet {
        pen: DeviceProfile,
        touch: DeviceProfile,
        pen_state: DecoderState,
        touch_state: DecoderState,
        rec: EventRecorder,
    }

    impl Tablet {
        fn new(product: u16, touch_type: DeviceType) -> Self {
            let entry = table::lookup(crate::WACOM_VID, product).expect("table entry");
            let pen = DeviceProfile::attach(entry, InterfaceInfo::pen());
            let touch = DeviceProfile::attach(entry, InterfaceInfo::touch(touch_type));
            let shared = SharedState::new();
            Self {
                pen_state: DecoderState::new(&pen, shared.clone()),
                touch_state: DecoderState::new(&touch, shared),
                pen,
                touch,
                rec: EventRecorder::new(),
            }
        }

        fn pen(&mut self, data: &[u8]) -> DecodeResult {
            let result = decode(&self.pen, &mut self.pen_state, Report::new(data), &mut self.rec);
            if result.is_commit() {
                self.rec.commit();
            }
            result
        }

        fn touch(&mut self, data: &[u8]) -> DecodeResult {
            let result = decode(&self.touch, &mut self.touch_state, Report::new(data), &mut self.rec);
            if result.is_commit() {
                self.rec.commit();
            }
            result
        }
    }

    fn mt_report(count: u8, contacts: &[(bool, u16, u16, u16)]) -> Vec<u8> {
        let mut data = vec![0u8; len::MTTPC];
        data[0] = ids::TPC2FG;
        data[2] = count;
        for (i, &(down, id, x, y)) in contacts.iter().enumerate() {
            let off = MTTPC_CONTACT_LEN * i + 3;
            data[off] = u8::from(down);
            data[off + 1..off + 3].copy_from_slice(&id.to_le_bytes());
            data[off + 3..off + 5].copy_from_slice(&x.to_le_bytes());
            data[off + 5..off + 7].copy_from_slice(&y.to_le_bytes());
        }
        data
    }

    #[test]
    fn pen_enters_and_leaves() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        assert_eq!(t.pen(&[2, 0x21, 0x10, 0x00, 0x20, 0x00, 0x80, 0x01]), DecodeResult::Commit);
        let f = &t.rec.frames()[0];
        assert_eq!(f.key(Key::ToolPen), Some(true));
        assert_eq!(f.key(Key::Touch), Some(true));
        assert_eq!(f.abs(Axis::Pressure), Some(0x180));
        assert_eq!(f.abs(Axis::X), Some(0x10));
        assert_eq!(f.abs(Axis::Misc), Some(tool_id::STYLUS as i32));
        assert!(t.pen_state.shared.stylus_in_proximity());

        t.pen(&[2, 0x00, 0, 0, 0, 0, 0, 0]);
        let f = t.rec.last_frame().expect("exit frame");
        assert_eq!(f.key(Key::ToolPen), Some(false));
        assert_eq!(f.abs(Axis::Pressure), Some(0));
        assert_eq!(f.abs(Axis::Misc), Some(0));
        assert!(!t.pen_state.shared.stylus_in_proximity());
    }

    #[test]
    fn side_switch_bits_pick_the_eraser() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        t.pen(&[2, 0x28, 0, 0, 0, 0, 0, 0]);
        assert_eq!(t.rec.frames()[0].key(Key::ToolRubber), Some(true));
        assert_eq!(t.pen_state.tool[0], Some(Tool::Rubber));
    }

    #[test]
    fn touch_down_holds_back_the_pen() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        t.touch(&[ids::TPC1FG, 0x01, 0x10, 0x00, 0x20, 0x00, 0x05, 0x00]);
        assert!(t.touch_state.shared.touch_down());
        assert_eq!(t.pen(&[2, 0x20, 0, 0, 0, 0, 0, 0]), DecodeResult::StateOnly);
        assert!(t.pen_state.shared.stylus_in_proximity());
    }

    #[test]
    fn single_finger_with_pressure() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        let result = t.touch(&[ids::TPC1FG, 0x01, 0x10, 0x00, 0x20, 0x00, 0x05, 0x00]);
        assert_eq!(result, DecodeResult::Commit);
        let f = &t.rec.frames()[0];
        assert_eq!(f.abs(Axis::X), Some(0x10));
        assert_eq!(f.abs(Axis::Y), Some(0x20));
        assert_eq!(f.abs(Axis::Pressure), Some(5));
        assert_eq!(f.key(Key::Touch), Some(true));
        assert_eq!(f.key(Key::ToolDoubleTap), Some(true));

        t.touch(&[ids::TPC1FG, 0x00, 0, 0, 0, 0, 0, 0]);
        let f = t.rec.last_frame().expect("lift frame");
        assert_eq!(f.key(Key::ToolDoubleTap), Some(false));
        assert_eq!(f.key(Key::Touch), Some(false));
        assert!(!t.touch_state.shared.touch_down());
    }

    #[test]
    fn idle_single_finger_reports_stay_quiet() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        let idle = [ids::TPC1FG, 0x00, 0, 0, 0, 0, 0, 0];
        assert_eq!(t.touch(&idle), DecodeResult::StateOnly);
        assert_eq!(t.touch(&idle), DecodeResult::StateOnly);
        assert!(t.rec.frames().is_empty());
        assert!(t.rec.pending().is_empty());

        // A lift after a touch is still reported once.
        t.touch(&[ids::TPC1FG, 0x01, 0x10, 0x00, 0x20, 0x00, 0x05, 0x00]);
        assert_eq!(t.touch(&idle), DecodeResult::Commit);
        assert_eq!(t.touch(&idle), DecodeResult::StateOnly);
        assert_eq!(t.rec.frames().len(), 2);
    }

    #[test]
    fn short_packets_have_their_own_layout() {
        let mut t = Tablet::new(0x90, DeviceType::Finger);
        t.touch(&[0x01, 0x34, 0x12, 0x78, 0x06]);
        let f = &t.rec.frames()[0];
        assert_eq!(f.abs(Axis::X), Some(0x1234));
        assert_eq!(f.abs(Axis::Y), Some(0x0678));

        let mut t = Tablet::new(0x90, DeviceType::Finger);
        t.touch(&[0, 0, 0x01, 0x34, 0x12, 0x78, 0x06, 0, 0, 0]);
        assert_eq!(t.rec.frames()[0].abs(Axis::X), Some(0x1234));
    }

    #[test]
    fn two_fingers_then_first_lifts() {
        let mut t = Tablet::new(0xE3, DeviceType::DoubleTap);
        let both = [ids::TPC2FG, 0x03, 0x10, 0x00, 0x20, 0x00, 0x30, 0x00, 0x40, 0x00, 0, 0, 0, 0];
        t.touch(&both);
        assert_eq!(t.rec.frames().len(), 2);
        assert_eq!(t.rec.frames()[0].abs(Axis::X), Some(0x10));
        assert_eq!(t.rec.frames()[0].abs(Axis::Y), Some(0x30));
        assert_eq!(t.rec.frames()[1].abs(Axis::X), Some(0x20));
        assert_eq!(t.rec.frames()[1].key(Key::ToolTripleTap), Some(true));
        assert_eq!(t.rec.frames()[1].serial(), Some(2));

        let second_only = [ids::TPC2FG, 0x02, 0, 0, 0x20, 0x00, 0, 0, 0x40, 0x00, 0, 0, 0, 0];
        t.touch(&second_only);
        let lift = &t.rec.frames()[2];
        assert_eq!(lift.key(Key::ToolDoubleTap), Some(false));
        assert_eq!(lift.key(Key::Touch), Some(false));
        assert_eq!(t.touch_state.fingers, 0x02);
    }

    #[test]
    fn pen_proximity_lifts_fingers() {
        let mut t = Tablet::new(0xE3, DeviceType::DoubleTap);
        t.touch(&[ids::TPC2FG, 0x01, 0x10, 0x00, 0, 0, 0x30, 0x00, 0, 0, 0, 0, 0, 0]);
        t.touch_state.shared.set_touch_down(false);
        t.pen(&[2, 0x20, 0, 0, 0, 0, 0, 0]);
        let before = t.rec.frames().len();

        let result = t.touch(&[ids::TPC2FG, 0x01, 0x10, 0x00, 0, 0, 0x30, 0x00, 0, 0, 0, 0, 0, 0]);
        assert_eq!(result, DecodeResult::Commit);
        assert_eq!(t.rec.frames().len(), before + 1);
        assert_eq!(t.rec.last_frame().and_then(|f| f.key(Key::Touch)), Some(false));
        assert_eq!(t.touch_state.fingers, 0);
        // Nothing left to lift.
        assert_eq!(t.touch(&[ids::TPC2FG, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]), DecodeResult::StateOnly);
    }

    #[test]
    fn unknown_touch_report_is_ignored() {
        let mut t = Tablet::new(0xE3, DeviceType::DoubleTap);
        let before = t.touch_state.clone();
        assert_eq!(t.touch(&[0x42, 0x03, 0, 0, 0, 0, 0, 0]), DecodeResult::Ignored);
        assert_eq!(t.touch_state, before);
        assert!(t.rec.pending().is_empty());
    }

    #[test]
    fn multitouch_contacts_take_slots() {
        let mut t = Tablet::new(0x100, DeviceType::DoubleTap);
        let result = t.touch(&mt_report(2, &[(true, 5, 100, 200), (true, 6, 300, 400)]));
        assert_eq!(result, DecodeResult::Commit);
        assert_eq!(t.rec.frames().len(), 2);
        assert_eq!(t.touch_state.slots.get(0), Some(5));
        assert_eq!(t.touch_state.slots.get(1), Some(6));
        let f = &t.rec.frames()[1];
        assert_eq!(f.abs(Axis::MtSlot), Some(1));
        assert_eq!(f.abs(Axis::MtTrackingId), Some(6));
        assert_eq!(f.abs(Axis::Misc), Some(tool_id::TOUCH as i32));
        assert!(t.touch_state.shared.touch_down());
    }

    #[test]
    fn too_many_contacts_lift_both_slots() {
        let mut t = Tablet::new(0x100, DeviceType::DoubleTap);
        t.touch(&mt_report(2, &[(true, 5, 100, 200), (true, 6, 300, 400)]));
        let before = t.rec.frames().len();

        let result = t.touch(&mt_report(3, &[(true, 5, 100, 200), (true, 6, 300, 400), (true, 7, 1, 1)]));
        assert_eq!(result, DecodeResult::Commit);
        let lifted = &t.rec.frames()[before..];
        assert_eq!(lifted.len(), 2);
        assert_eq!(lifted[0].key(Key::ToolDoubleTap), Some(false));
        assert_eq!(lifted[0].abs(Axis::MtTrackingId), Some(-1));
        assert_eq!(lifted[1].key(Key::ToolTripleTap), Some(false));
        assert_eq!(lifted[1].abs(Axis::MtSlot), Some(1));
        assert_eq!(t.touch_state.slots.get(0), None);
        assert_eq!(t.touch_state.slots.get(1), None);
        assert!(!t.touch_state.shared.touch_down());

        // Already lifted: a second oversized scan emits nothing.
        let again = t.touch(&mt_report(3, &[]));
        assert_eq!(again, DecodeResult::StateOnly);
    }

    #[test]
    fn every_multitouch_model_shares_the_contact_layout() {
        for product in [0x100, 0x5000, 0x5044] {
            let mut t = Tablet::new(product, DeviceType::DoubleTap);
            t.touch(&mt_report(2, &[(true, 5, 100, 200), (true, 6, 300, 400)]));
            let frames = t.rec.frames();
            assert_eq!(frames.len(), 2, "product {product:#x}");
            assert_eq!(frames[1].abs(Axis::X), Some(300), "product {product:#x}");
            assert_eq!(frames[1].abs(Axis::Y), Some(400), "product {product:#x}");
            assert_eq!(frames[1].abs(Axis::MtTrackingId), Some(6), "product {product:#x}");
        }
    }

    #[test]
    fn multitouch_lift_frees_the_slot() {
        let mut t = Tablet::new(0x100, DeviceType::DoubleTap);
        t.touch(&mt_report(2, &[(true, 5, 1, 1), (true, 6, 2, 2)]));
        t.touch(&mt_report(2, &[(false, 5, 1, 1), (true, 6, 2, 2)]));
        assert_eq!(t.touch_state.slots.get(0), None);
        assert_eq!(t.touch_state.slots.get(1), Some(6));
        let lift = &t.rec.frames()[2];
        assert_eq!(lift.key(Key::Touch), Some(false));
        assert_eq!(lift.abs(Axis::Misc), Some(tool_id::TOUCH as i32));

        // A new contact takes the freed slot.
        t.touch(&mt_report(2, &[(true, 8, 3, 3), (true, 6, 2, 2)]));
        assert_eq!(t.touch_state.slots.get(0), Some(8));
    }
}
