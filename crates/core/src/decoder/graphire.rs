//! Graphire, Graphire4 and BambooFun: pen or mouse on one channel, with an
//! optional pad packed into the tail of the same report.

use super::{rest_position, select_tool, DecodeResult, FrameSeq, PenSample};
use crate::device::{DeviceProfile, Family, GraphireModel};
use crate::event::{Axis, EventSink, Key, RelAxis};
use crate::report::{ids, Report};
use crate::state::{tool_id, DecoderState, Tool};
use tracing::debug;

/// Serial reported with pad events.
const PAD_SERIAL: u32 = 0xf0;

pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != ids::PENABLED {
        debug!(report_id = report.id(), "Graphire: unknown report");
        return DecodeResult::Ignored;
    }
    let model = match profile.family {
        Family::Graphire(model) => model,
        _ => GraphireModel::Graphire,
    };

    let mut seq = FrameSeq::new(sink);

    let prox = report.bit(1, 0x80);
    if prox || state.id[0] != 0 {
        pen_or_mouse(profile, state, report, seq.next(), model, prox);
    }

    match model {
        GraphireModel::Graphire => {}
        GraphireModel::Graphire4 => {
            let pad = report.byte(7);
            let active = pad & 0xf8 != 0;
            if active || state.pad_active {
                let out = seq.next();
                out.set_key(Key::Num(0), pad & 0x40 != 0);
                out.set_key(Key::Num(4), pad & 0x80 != 0);
                let wheel = i32::from((pad & 0x18) >> 3) - i32::from((pad & 0x20) >> 3);
                out.set_rel(RelAxis::Wheel, wheel);
                finish_pad(out, state, active);
            }
        }
        GraphireModel::BambooFun => {
            let (keys, ring) = (report.byte(7), report.byte(8) & 0x7f);
            let active = keys & 0x78 != 0 || ring != 0;
            if active || state.pad_active {
                let out = seq.next();
                out.set_key(Key::Num(0), keys & 0x08 != 0);
                out.set_key(Key::Num(1), keys & 0x20 != 0);
                out.set_key(Key::Num(4), keys & 0x10 != 0);
                out.set_key(Key::Num(5), keys & 0x40 != 0);
                out.set_abs(Axis::Wheel, i32::from(ring));
                finish_pad(out, state, active);
            }
        }
    }

    seq.finish(DecodeResult::StateOnly)
}

fn pen_or_mouse(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    out: &mut dyn EventSink,
    model: GraphireModel,
    prox: bool,
) {
    let b1 = report.byte(1);
    let was_mouse = state.id[0] != 0 && state.tool[0] == Some(Tool::Mouse);
    if prox {
        let (tool, id) = match (b1 >> 5) & 3 {
            0 => (Tool::Pen, tool_id::STYLUS),
            1 => (Tool::Rubber, tool_id::ERASER),
            selector => {
                // Selector 2 is the mouse with a wheel button.
                if selector == 2 {
                    out.set_key(Key::Middle, b1 & 0x04 != 0);
                }
                (Tool::Mouse, tool_id::CURSOR)
            }
        };
        select_tool(state, tool, id, out);
    }
    let tool = state.tool[0].unwrap_or(Tool::Pen);

    if prox {
        out.set_abs(Axis::X, i32::from(report.le16(2)));
        out.set_abs(Axis::Y, i32::from(report.le16(4)));
    } else {
        rest_position(profile, out);
    }

    if tool == Tool::Mouse {
        out.set_key(Key::Left, prox && b1 & 0x01 != 0);
        out.set_key(Key::Right, prox && b1 & 0x02 != 0);
        let (distance, wheel) = match model {
            GraphireModel::Graphire4 | GraphireModel::BambooFun => {
                let b7 = report.byte(7);
                (report.byte(6) & 0x3f, i32::from(b7 & 0x04) - i32::from(b7 & 0x03))
            }
            GraphireModel::Graphire => (
                report.byte(7) & 0x3f,
                -i32::from(report.byte(6) as i8),
            ),
        };
        if prox {
            out.set_abs(Axis::Distance, i32::from(distance));
            out.set_rel(RelAxis::Wheel, wheel);
        } else {
            out.set_key(Key::Middle, false);
            out.set_abs(Axis::Distance, 0);
        }
    } else {
        if was_mouse {
            release_mouse_buttons(out);
        }
        PenSample {
            pressure: i32::from(report.byte(6)) | (i32::from(report.byte(7) & 0x01) << 8),
            touch: b1 & 0x01 != 0,
            stylus: b1 & 0x02 != 0,
            stylus2: b1 & 0x04 != 0,
        }
        .in_proximity(prox)
        .report(out);
    }

    if !prox {
        state.id[0] = 0;
    }
    out.set_abs(Axis::Misc, state.id[0] as i32);
    out.misc_serial(1);
    out.set_key(tool.key(), prox);
}

fn release_mouse_buttons(out: &mut dyn EventSink) {
    for key in [Key::Left, Key::Right, Key::Middle] {
        out.set_key(key, false);
    }
}

fn finish_pad(out: &mut dyn EventSink, state: &mut DecoderState, active: bool) {
    out.set_key(Key::ToolFinger, active);
    out.set_abs(Axis::Misc, if active { tool_id::PAD as i32 } else { 0 });
    out.misc_serial(PAD_SERIAL);
    state.pad_active = active;
}
