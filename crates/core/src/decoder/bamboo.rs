//! Bamboo and Intuos HT pen-and-touch tablets.
//!
//! Pen and touch arrive on separate interfaces; which decoder runs is
//! decided by the report length. The second-generation Intuos HT pen speaks
//! the professional protocol instead.

use super::{intuos, DecodeResult};
use crate::device::{BambooModel, DeviceProfile, Family};
use crate::event::{Axis, EventSink, Key};
use crate::report::{ids, len, Report};
use crate::state::{tool_id, DecoderState, Tool};
use tracing::debug;

/// Size of one contact or button message in a 64-byte touch report.
const BBTOUCH3_MSG_LEN: usize = 8;
/// Message id carrying the pad buttons.
const BUTTON_MSG: u8 = 128;
/// Contact message ids.
const CONTACT_MSGS: std::ops::RangeInclusive<u8> = 2..=17;

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if profile.family == Family::Bamboo(BambooModel::IntuosHt2) && !profile.is_touch() {
        return intuos::decode(profile, state, report, sink);
    }
    match report.len() {
        len::BBTOUCH => touch(state, report, sink),
        len::BBTOUCH3 => touch3(profile, state, report, sink),
        len::BBFUN | len::BBPEN => pen(profile, state, report, sink),
        other => {
            debug!(len = other, "Bamboo: unexpected report length");
            DecodeResult::Ignored
        }
    }
}

/// First-generation touch: one contact and four buttons.
pub fn touch(state: &mut DecoderState, report: Report<'_>, sink: &mut dyn EventSink) -> DecodeResult {
    if report.id() != ids::BBTOUCH {
        return DecodeResult::Ignored;
    }

    // The palm rests on the surface while the pen is in use.
    let touch = report.bit(3, 0x80) && !state.shared.stylus_in_proximity();
    let count = usize::from(touch);
    if touch {
        let x = i32::from(report.be16(3) & 0x7ff) << 5;
        let y = i32::from(report.be16(5) & 0x7ff) << 5;
        sink.set_abs(Axis::X, x);
        sink.set_abs(Axis::Y, y);
    }

    state.shared.set_touch_down(count > 0);
    sink.set_key(Key::Touch, count > 0);
    sink.set_key(Key::ToolFinger, count == 1);
    sink.set_key(Key::ToolDoubleTap, count == 2);
    report_buttons(sink, report.byte(1), false);
    DecodeResult::Commit
}

/// Third-generation touch: up to seven fixed-size messages per report.
pub fn touch3(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != ids::BBTOUCH {
        return DecodeResult::Ignored;
    }
    let ht_buttons = matches!(
        profile.family,
        Family::Bamboo(BambooModel::IntuosHt | BambooModel::IntuosHt2)
    );

    let count = usize::from(report.byte(1) & 0x07);
    let stylus = state.shared.stylus_in_proximity();
    let mut saw_touch = false;
    let mut touching = 0usize;

    for i in 0..count {
        let msg = report.slice_from(BBTOUCH3_MSG_LEN * i + 2);
        match msg.byte(0) {
            id if CONTACT_MSGS.contains(&id) => {
                let touch = msg.bit(1, 0x80) && !stylus;
                touching += usize::from(touch);
                saw_touch = true;
                // Only the first contact drives the pointer.
                if id == 2 && touch {
                    let x = (i32::from(msg.byte(2)) << 4) | i32::from(msg.byte(4) >> 4);
                    let y = (i32::from(msg.byte(3)) << 4) | i32::from(msg.byte(4) & 0x0f);
                    sink.set_abs(Axis::X, x);
                    sink.set_abs(Axis::Y, y);
                    sink.set_abs(Axis::ToolWidth, i32::from(msg.byte(6)) * 100);
                }
            }
            BUTTON_MSG => report_buttons(sink, msg.byte(1), ht_buttons),
            _ => {}
        }
    }

    if saw_touch {
        sink.set_key(Key::Touch, touching > 0);
        sink.set_key(Key::ToolFinger, touching == 1);
        sink.set_key(Key::ToolDoubleTap, touching == 2);
        sink.set_key(Key::ToolTripleTap, touching == 3);
        sink.set_key(Key::ToolQuadTap, touching >= 4);
    }
    state.shared.set_touch_down(touching > 0);
    DecodeResult::Commit
}

/// Intuos HT swaps the left and back buttons.
fn report_buttons(sink: &mut dyn EventSink, buttons: u8, ht: bool) {
    let (left, back) = if ht { (0x02, 0x08) } else { (0x08, 0x02) };
    sink.set_key(Key::Left, buttons & left != 0);
    sink.set_key(Key::Forward, buttons & 0x04 != 0);
    sink.set_key(Key::Back, buttons & back != 0);
    sink.set_key(Key::Right, buttons & 0x01 != 0);
}

/// Pen interface of Bamboo and first-generation Intuos HT.
pub fn pen(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != ids::PENABLED {
        return DecodeResult::Ignored;
    }

    let prox = report.bit(1, 0x20);
    // Pick the tool on the first report after leaving proximity.
    if !state.shared.stylus_in_proximity() {
        let (tool, id) = if report.bit(1, 0x08) {
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

    let (mut x, mut y, mut pressure, mut distance) = (0, 0, 0, 0);
    let (mut tip, mut button1, mut button2) = (false, false, false);
    if prox {
        x = i32::from(report.le16(2));
        y = i32::from(report.le16(4));
        pressure = i32::from(report.le16(6));
        // Height above the surface counts down; past the maximum the pen
        // is pressing and distance stays at zero.
        let height = i32::from(report.byte(8));
        if height <= profile.distance_max {
            distance = profile.distance_max - height;
        }
        tip = report.bit(1, 0x01);
        button1 = report.bit(1, 0x02);
        button2 = report.bit(1, 0x04);
    } else {
        state.id[0] = 0;
    }

    sink.set_key(Key::Touch, tip);
    sink.set_key(Key::Stylus, button1);
    sink.set_key(Key::Stylus2, button2);
    sink.set_abs(Axis::X, x);
    sink.set_abs(Axis::Y, y);
    sink.set_abs(Axis::Pressure, pressure);
    sink.set_abs(Axis::Distance, distance);
    sink.set_key(state.tool[0].unwrap_or(Tool::Pen).key(), prox);
    DecodeResult::Commit
}
