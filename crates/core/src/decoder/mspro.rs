//! MobileStudio Pro, Cintiq Pro and Intuos Pro 2 pen interfaces.
//!
//! These carry the pen and the pad on one interface under distinct report
//! ids. The pen packs 24-bit coordinates, a 64-bit tool uid and a tool type
//! into one report; "range" means the tool is close enough for full data,
//! "proximity" only that it is near.

use super::{mangle_tool_id, report_numbered_buttons, select_tool, tool_type, DecodeResult};
use crate::capability::{ROTATION_MAX, ROTATION_MIN, TILT_MAX, TILT_MIN, WHEEL_MAX};
use crate::device::{DeviceProfile, Family};
use crate::event::{Axis, EventSink, Key};
use crate::report::{ids, Report};
use crate::state::{tool_id, DecoderState, RING_UNTOUCHED};
use tracing::{debug, warn};

/// Serial reported with pad events.
const PAD_SERIAL: u32 = 0xffff_ffff;

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    match report.id() {
        ids::MSPRO => pen(profile, state, report, sink),
        ids::MSPROPAD if profile.family == Family::IntuosPro2 => intuos_pro2_pad(profile, state, report, sink),
        ids::MSPROPAD => pad(profile, report, sink),
        ids::MSPRODEVICE => DecodeResult::Ignored,
        id => {
            debug!(report_id = id, "Pro pen: unknown report");
            DecodeResult::Ignored
        }
    }
}

/// Fields of one pen report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PenReport {
    tip: bool,
    sw1: bool,
    sw2: bool,
    range: bool,
    proximity: bool,
    x: i32,
    y: i32,
    pressure: i32,
    tilt_x: i32,
    tilt_y: i32,
    rotation: i32,
    wheel: i32,
    height: i32,
    uid: u64,
    tool_type: u16,
}

impl PenReport {
    fn parse(report: Report<'_>) -> Self {
        let b1 = report.byte(1);
        Self {
            tip: b1 & 0x01 != 0,
            sw1: b1 & 0x02 != 0,
            sw2: b1 & 0x04 != 0,
            range: b1 & 0x20 != 0,
            proximity: b1 & 0x40 != 0,
            x: (report.le32(2) & 0xFF_FFFF) as i32,
            y: (report.le32(5) & 0xFF_FFFF) as i32,
            pressure: i32::from(report.le16(8)),
            tilt_x: i32::from(report.byte(10) as i8).clamp(TILT_MIN, TILT_MAX),
            tilt_y: i32::from(report.byte(11) as i8).clamp(TILT_MIN, TILT_MAX),
            rotation: i32::from(report.le16(12) as i16).clamp(ROTATION_MIN, ROTATION_MAX),
            wheel: i32::from(report.le16(14)).min(WHEEL_MAX),
            height: i32::from(report.byte(16)),
            uid: report.le64(17),
            tool_type: report.le16(25),
        }
    }

    /// Composite tool id: high half of the uid with the type code folded in.
    fn tool_id(&self) -> u32 {
        ((self.uid >> 32) as u32) | u32::from(self.tool_type)
    }
}

fn pen(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if state.shared.touch_down() {
        return DecodeResult::StateOnly;
    }
    let r = PenReport::parse(report);
    state.shared.set_stylus_in_proximity(r.proximity);

    if r.range {
        let id = r.tool_id();
        state.serial[0] = r.uid as u32;
        select_tool(state, tool_type(id & 0xF_FFFF), id, sink);
    }

    // Nothing to attach the events to until a tool has been in range.
    let Some(tool) = state.tool[0] else {
        return DecodeResult::StateOnly;
    };

    let range = r.range;
    // Dropping from range to proximity: hover distance is at its maximum
    // and the rest of the sample is no longer valid.
    let height = if range { r.height } else { profile.distance_max };
    let live = |v: i32| if range { v } else { 0 };

    sink.set_key(Key::Touch, range && r.tip);
    sink.set_key(Key::Stylus, range && r.sw1);
    sink.set_key(Key::Stylus2, range && r.sw2);
    sink.set_abs(Axis::X, r.x);
    sink.set_abs(Axis::Y, r.y);
    sink.set_abs(Axis::Pressure, live(r.pressure));
    sink.set_abs(Axis::TiltX, live(r.tilt_x));
    sink.set_abs(Axis::TiltY, live(r.tilt_y));
    sink.set_abs(Axis::Z, live(r.rotation));
    sink.set_abs(Axis::Wheel, live(r.wheel));
    sink.set_abs(Axis::Distance, height);
    sink.misc_serial(state.serial[0]);
    sink.set_abs(Axis::Misc, if range { mangle_tool_id(state.id[0]) } else { 0 });
    sink.set_key(tool.key(), range);

    if !range {
        state.tool[0] = None;
    }
    DecodeResult::Commit
}

/// Ring reading as an absolute wheel position. Bit 7 marks a valid reading.
fn ring_position(ring: u16) -> i32 {
    if ring & 0x80 != 0 {
        i32::from(ring & 0x7f)
    } else {
        0
    }
}

fn report_pad(sink: &mut dyn EventSink, count: u8, buttons: u32, ring: u16, prox: bool) {
    report_numbered_buttons(sink, count, buttons);
    sink.set_abs(Axis::Wheel, ring_position(ring));
    sink.set_key(Key::ToolFinger, prox);
    sink.set_abs(Axis::Misc, if prox { tool_id::PAD as i32 } else { 0 });
}

/// MobileStudio Pro pad. The 11- and 13-button models pack their buttons
/// differently.
fn pad(profile: &DeviceProfile, report: Report<'_>, sink: &mut dyn EventSink) -> DecodeResult {
    let count = profile.numbered_buttons;
    let (b1, b3) = (u32::from(report.byte(1)), u32::from(report.byte(3)));
    let buttons = match count {
        11 => (b1 >> 1) | (b3 << 6),
        13 => b1 | (b3 << 8),
        0 => return DecodeResult::Ignored,
        _ => {
            warn!(buttons = count, "MobileStudio Pro pad: unsupported button layout");
            return DecodeResult::Ignored;
        }
    };
    let ring = report.le16(4);
    let prox = buttons != 0 || ring != 0;

    report_pad(sink, count, buttons, ring, prox);
    sink.misc_serial(PAD_SERIAL);
    DecodeResult::Commit
}

/// Intuos Pro 2 pad. Only reports when the buttons or ring changed; an
/// untouched ring does not count as pad activity.
fn intuos_pro2_pad(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let count = profile.numbered_buttons;
    if count != 9 {
        warn!(buttons = count, "Intuos Pro 2 pad: unsupported button layout");
        return DecodeResult::Ignored;
    }
    let buttons = u32::from(report.byte(1)) | (u32::from(report.byte(3)) << 8);
    let ring = report.le16(4);

    let active = ring != state.previous_ring || buttons != state.previous_buttons;
    if !active {
        return DecodeResult::Ignored;
    }
    let prox = buttons != 0 || (ring != RING_UNTOUCHED && ring != 0);

    report_pad(sink, count, buttons, ring, prox);
    sink.misc_serial(PAD_SERIAL);
    state.previous_buttons = buttons;
    state.previous_ring = ring;
    DecodeResult::Commit
}
