//! Professional protocol: Intuos 1-5, Intuos Pro, Cintiq and DTK displays,
//! and the pen interface of the second-generation Intuos HT.
//!
//! A tool session is a sequence of reports. An enter report carries the
//! serial number and tool id, data reports carry the position and tool
//! specific fields, and an exit report resets everything the tool reported.
//! Pad reports share the endpoint and are decoded independently.

use super::{mangle_tool_id, report_numbered_buttons, rest_position, tool_type, DecodeResult};
use crate::device::{BambooModel, DeviceProfile, Family, IntuosModel, PadLayout};
use crate::event::{Axis, EventSink, Key, RelAxis};
use crate::report::{ids, Report};
use crate::state::{tool_id, DecoderState, Tool};
use tracing::{debug, trace};

const VALID_REPORTS: [u8; 7] = [
    ids::PENABLED,
    ids::INTUOS_ID1,
    ids::INTUOS_ID2,
    ids::INTUOSPAD,
    ids::INTUOS5PAD,
    ids::INTUOS_PEN,
    ids::CINTIQPAD,
];

const PAD_REPORTS: [u8; 3] = [ids::INTUOSPAD, ids::INTUOS5PAD, ids::CINTIQPAD];

/// Serial reported with pad events.
const PAD_SERIAL: u32 = 0xffff_ffff;

/// Which flavor of the protocol the device speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Model(IntuosModel),
    /// Intuos HT2 pen: no pad on this interface, no tilt, and in-range
    /// reports do not claim the touch surface.
    Ht2,
}

impl Variant {
    fn of(family: Family) -> Option<Self> {
        match family {
            Family::Intuos(model) => Some(Self::Model(model)),
            Family::Bamboo(BambooModel::IntuosHt2) => Some(Self::Ht2),
            _ => None,
        }
    }

    fn first_gen(self) -> bool {
        matches!(self, Self::Model(m) if m.is_first_gen())
    }

    fn model(self) -> Option<IntuosModel> {
        match self {
            Self::Model(m) => Some(m),
            Self::Ht2 => None,
        }
    }
}

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let Some(variant) = Variant::of(profile.family) else {
        return DecodeResult::Ignored;
    };
    if !VALID_REPORTS.contains(&report.id()) {
        debug!(report_id = report.id(), "Intuos: unknown report");
        return DecodeResult::Ignored;
    }

    if PAD_REPORTS.contains(&report.id()) {
        return match variant {
            Variant::Model(model) => pad(profile, model, report, sink),
            Variant::Ht2 => {
                debug!(report_id = report.id(), "Intuos HT2: pad report on a padless interface");
                DecodeResult::Ignored
            }
        };
    }

    if let Some(result) = in_out(profile, state, variant, report, sink) {
        return result;
    }
    general(profile, state, variant, report, sink)
}

/// Pad report: buttons, rings, strips and keys. The pad is always a
/// separate tool and never changes decoder state.
fn pad(
    profile: &DeviceProfile,
    model: IntuosModel,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let b = |i| u32::from(report.byte(i));
    let mut buttons = 0u32;
    let mut keys = 0u32;
    let mut nkeys = 0;
    let (mut ring1, mut ring2) = (0u32, 0u32);
    let (mut strip1, mut strip2) = (0u32, 0u32);

    match model.pad_layout() {
        PadLayout::Intuos4 => {
            buttons = (b(3) << 1) | (b(2) & 0x01);
            ring1 = b(1);
        }
        PadLayout::Dtk => buttons = b(6),
        PadLayout::Cintiq13Hd => buttons = (b(4) << 1) | (b(3) & 0x01),
        PadLayout::Cintiq24Hd => {
            buttons = (b(8) << 8) | b(6);
            ring1 = b(1);
            ring2 = b(2);
            // Three keys live on a touch strip, each a few bits wide.
            nkeys = 3;
            keys = (u32::from(b(3) & 0x1C != 0) << 2)
                | (u32::from(b(4) & 0xE0 != 0) << 1)
                | u32::from(b(4) & 0x07 != 0);
        }
        PadLayout::Cintiq27Qhd => {
            nkeys = 3;
            keys = b(2) & 0x07;
            sink.set_abs(Axis::X, i32::from(report.be16(4)));
            sink.set_abs(Axis::Y, i32::from(report.be16(6)));
            sink.set_abs(Axis::Z, i32::from(report.be16(8)));
        }
        PadLayout::Intuos5 => {
            // Mechanical switches only; byte 5 holds the capacitive sensors.
            buttons = (b(4) << 1) | (b(3) & 0x01);
            ring1 = b(2);
        }
        PadLayout::Cintiq21Ux2 { prog_keys } => {
            buttons = (b(8) << 10) | ((b(7) & 0x01) << 9) | (b(6) << 1) | (b(5) & 0x01);
            if prog_keys {
                nkeys = 3;
                keys = b(9) & 0x07;
            }
            strip1 = ((b(1) & 0x1f) << 8) | b(2);
            strip2 = ((b(3) & 0x1f) << 8) | b(4);
        }
        PadLayout::Strips => {
            buttons = ((b(6) & 0x10) << 10)
                | ((b(5) & 0x10) << 9)
                | ((b(6) & 0x0F) << 4)
                | (b(5) & 0x0F);
            strip1 = ((b(1) & 0x1f) << 8) | b(2);
            strip2 = ((b(3) & 0x1f) << 8) | b(4);
        }
    }

    let button_mask = low_bits(u32::from(profile.numbered_buttons));
    let prox = buttons & button_mask != 0
        || keys & low_bits(nkeys) != 0
        || (ring1 | ring2) & 0x80 != 0
        || strip1 != 0
        || strip2 != 0;

    report_numbered_buttons(sink, profile.numbered_buttons, buttons);
    for i in 0..nkeys {
        sink.set_key(Key::Prog(i as u8 + 1), keys & (1 << i) != 0);
    }
    sink.set_abs(Axis::Rx, strip1 as i32);
    sink.set_abs(Axis::Ry, strip2 as i32);
    sink.set_abs(Axis::Wheel, ring_position(ring1));
    sink.set_abs(Axis::Throttle, ring_position(ring2));
    sink.set_key(Key::ToolFinger, prox);
    sink.set_abs(Axis::Misc, if prox { tool_id::PAD as i32 } else { 0 });
    sink.misc_serial(PAD_SERIAL);
    DecodeResult::Commit
}

fn low_bits(n: u32) -> u32 {
    if n >= 32 {
        u32::MAX
    } else {
        (1 << n) - 1
    }
}

/// Ring byte: bit 7 is touch, the low bits the position.
fn ring_position(ring: u32) -> i32 {
    if ring & 0x80 != 0 {
        (ring & 0x7f) as i32
    } else {
        0
    }
}

/// Enter, in-range and exit reports. `None` means the report is a data
/// packet for the general decoder.
fn in_out(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    variant: Variant,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> Option<DecodeResult> {
    let b1 = report.byte(1);
    let idx = if variant.first_gen() { usize::from(b1 & 0x01) } else { 0 };

    if b1 & 0xfc == 0xc0 {
        let b = |i| u32::from(report.byte(i));
        state.serial[idx] = ((b(3) & 0x0f) << 28) + (b(4) << 20) + (b(5) << 12) + (b(6) << 4) + (b(7) >> 4);
        state.id[idx] = (b(2) << 4) | (b(3) >> 4) | ((b(7) & 0x0f) << 16) | ((b(8) & 0xf0) << 8);
        let tool = tool_type(state.id[idx]);
        state.tool[idx] = Some(tool);
        state.shared.set_stylus_in_proximity(true);
        debug!(id = state.id[idx], serial = state.serial[idx], ?tool, "Tool entered proximity");
        return Some(DecodeResult::StateOnly);
    }

    if b1 & 0xfe == 0x20 {
        if variant != Variant::Ht2 {
            state.shared.set_stylus_in_proximity(true);
        }
        if state.reporting_data {
            // Hovering after contact: lift the tip.
            sink.set_key(Key::Touch, false);
            sink.set_abs(Axis::Pressure, 0);
            sink.set_abs(Axis::Distance, profile.distance_max);
            return Some(DecodeResult::Commit);
        }
        return Some(DecodeResult::StateOnly);
    }

    if b1 & 0xfe == 0x80 {
        state.shared.set_stylus_in_proximity(false);
        state.reporting_data = false;
        if state.id[idx] == 0 {
            return Some(DecodeResult::StateOnly);
        }

        let tool = state.tool[idx].unwrap_or(Tool::Pen);
        sink.set_abs(Axis::Distance, 0);
        rest_position(profile, sink);
        sink.set_abs(Axis::TiltX, 0);
        sink.set_abs(Axis::TiltY, 0);
        if tool.is_cursor() {
            for key in [Key::Left, Key::Middle, Key::Right, Key::Side, Key::Extra] {
                sink.set_key(key, false);
            }
            sink.set_abs(Axis::Throttle, 0);
            sink.set_abs(Axis::Rz, 0);
        } else {
            sink.set_abs(Axis::Pressure, 0);
            sink.set_key(Key::Stylus, false);
            sink.set_key(Key::Stylus2, false);
            sink.set_key(Key::Touch, false);
            sink.set_abs(Axis::Wheel, 0);
            if !variant.first_gen() {
                sink.set_abs(Axis::Z, 0);
            }
        }
        sink.set_key(tool.key(), false);
        sink.set_abs(Axis::Misc, 0);
        sink.misc_serial(state.serial[idx]);
        state.id[idx] = 0;
        debug!(?tool, serial = state.serial[idx], "Tool left proximity");
        return Some(DecodeResult::Commit);
    }

    if state.id[idx] == 0 {
        // Data for a tool whose enter report was missed.
        trace!("Intuos: data packet before enter report");
        return Some(DecodeResult::Ignored);
    }
    None
}

/// Data packet of the tool currently in proximity.
fn general(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    variant: Variant,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let b1 = report.byte(1);
    let idx = if variant.first_gen() { usize::from(b1 & 0x01) } else { 0 };
    let tool = state.tool[idx].unwrap_or(Tool::Pen);

    if state.shared.touch_down() {
        return DecodeResult::StateOnly;
    }

    let model = variant.model();
    // Older Intuos4 styli send garbage on the 21UX2.
    let old_stylus = model == Some(IntuosModel::Cintiq21Ux2) && (state.id[idx] >> 16) & 0x01 == 0;
    let unsupported_lens = tool == Tool::Lens && model.is_some_and(IntuosModel::rejects_lens);
    // The Cintiq 21UX only sends valid data with the ready bit set.
    let not_ready = model == Some(IntuosModel::Cintiq) && b1 & 0x40 == 0;
    if old_stylus || unsupported_lens || not_ready {
        return DecodeResult::StateOnly;
    }

    if !matches!(report.id(), ids::PENABLED | ids::INTUOS_PEN) {
        return DecodeResult::Ignored;
    }

    let b = |i| i32::from(report.byte(i));
    let mut x = (i32::from(report.be16(2)) << 1) | ((b(9) >> 1) & 1);
    let mut y = (i32::from(report.be16(4)) << 1) | (b(9) & 1);
    let mut distance = b(9) >> 2;
    if variant.first_gen() {
        x >>= 1;
        y >>= 1;
        distance >>= 1;
    }
    sink.set_abs(Axis::X, x);
    sink.set_abs(Axis::Y, y);
    sink.set_abs(Axis::Distance, distance);

    let tilt_x = ((b(7) << 1) & 0x7e) | (b(8) >> 7);
    let tilt_y = b(8) & 0x7f;

    match (b1 >> 1) & 0x0f {
        0x00..=0x03 => {
            let mut pressure = (b(6) << 3) | ((b(7) & 0xC0) >> 5) | (b(1) & 1);
            // Tablets with fewer than 2048 levels drop the lowest bit.
            if profile.pressure_max < 2047 {
                pressure >>= 1;
            }
            sink.set_abs(Axis::Pressure, pressure);
            if variant != Variant::Ht2 {
                sink.set_abs(Axis::TiltX, tilt_x);
                sink.set_abs(Axis::TiltY, tilt_y);
            }
            sink.set_key(Key::Stylus, b1 & 0x02 != 0);
            sink.set_key(Key::Stylus2, b1 & 0x04 != 0);
            sink.set_key(Key::Touch, pressure > 10);
        }
        0x0a => {
            // Airbrush finger wheel.
            sink.set_abs(Axis::Wheel, (b(6) << 2) | ((b(7) >> 6) & 3));
            sink.set_abs(Axis::TiltX, tilt_x);
            sink.set_abs(Axis::TiltY, tilt_y);
        }
        0x05 => {
            let t = (b(6) << 3) | ((b(7) >> 5) & 7);
            let forward = b(7) & 0x20 != 0;
            if variant.first_gen() {
                // 4D mouse rotation.
                sink.set_abs(Axis::Rz, if forward { (t - 1) / 2 } else { -t / 2 });
            } else {
                // Marker pen barrel rotation.
                let z = match (forward, t > 900) {
                    (true, true) => (t - 1) / 2 - 1350,
                    (true, false) => (t - 1) / 2 + 450,
                    (false, _) => 450 - t / 2,
                };
                sink.set_abs(Axis::Z, z);
            }
        }
        0x04 => {
            // 4D mouse.
            let buttons = report.byte(8);
            sink.set_key(Key::Left, buttons & 0x01 != 0);
            sink.set_key(Key::Middle, buttons & 0x02 != 0);
            sink.set_key(Key::Right, buttons & 0x04 != 0);
            sink.set_key(Key::Side, buttons & 0x20 != 0);
            sink.set_key(Key::Extra, buttons & 0x10 != 0);
            let t = (b(6) << 2) | ((b(7) >> 6) & 3);
            sink.set_abs(Axis::Throttle, if buttons & 0x08 != 0 { -t } else { t });
        }
        0x06 => {
            // Intuos4 mouse.
            let buttons = report.byte(6);
            sink.set_key(Key::Left, buttons & 0x01 != 0);
            sink.set_key(Key::Middle, buttons & 0x02 != 0);
            sink.set_key(Key::Right, buttons & 0x04 != 0);
            sink.set_rel(RelAxis::Wheel, ((b(7) & 0x80) >> 7) - ((b(7) & 0x40) >> 6));
            sink.set_key(Key::Side, buttons & 0x08 != 0);
            sink.set_key(Key::Extra, buttons & 0x10 != 0);
            sink.set_abs(Axis::TiltX, tilt_x - 64);
            sink.set_abs(Axis::TiltY, tilt_y - 64);
        }
        0x08 => match tool {
            Tool::Mouse => {
                let buttons = report.byte(8);
                sink.set_key(Key::Left, buttons & 0x04 != 0);
                sink.set_key(Key::Middle, buttons & 0x08 != 0);
                sink.set_key(Key::Right, buttons & 0x10 != 0);
                sink.set_rel(RelAxis::Wheel, (b(8) & 0x01) - ((b(8) & 0x02) >> 1));
                if model.is_some_and(IntuosModel::is_intuos3) {
                    sink.set_key(Key::Side, buttons & 0x40 != 0);
                    sink.set_key(Key::Extra, buttons & 0x20 != 0);
                }
            }
            Tool::Lens => {
                let buttons = report.byte(8);
                sink.set_key(Key::Left, buttons & 0x01 != 0);
                sink.set_key(Key::Middle, buttons & 0x02 != 0);
                sink.set_key(Key::Right, buttons & 0x04 != 0);
                sink.set_key(Key::Side, buttons & 0x10 != 0);
                sink.set_key(Key::Extra, buttons & 0x08 != 0);
            }
            _ => {}
        },
        other => trace!(packet_type = other, "Intuos: unhandled packet type"),
    }

    sink.set_abs(Axis::Misc, mangle_tool_id(state.id[idx]));
    sink.set_key(tool.key(), true);
    sink.misc_serial(state.serial[idx]);
    state.reporting_data = true;
    DecodeResult::Commit
}
