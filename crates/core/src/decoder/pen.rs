//! Single-tool pen formats: PenPartner, DTU, PL, PTU, DTU-S and DTH-1152.

use super::{rest_position, select_tool, DecodeResult, PenSample};
use crate::device::DeviceProfile;
use crate::event::{Axis, EventSink, Key};
use crate::report::{ids, Report};
use crate::state::{tool_id, DecoderState, Tool};
use tracing::debug;

/// Report id of the DTH-1152 pen, shared with DTU-S.
const DTH1152_PEN: u8 = ids::DTUS;

fn pen_or_eraser(eraser: bool) -> (Tool, u32) {
    if eraser {
        (Tool::Rubber, tool_id::ERASER)
    } else {
        (Tool::Pen, tool_id::STYLUS)
    }
}

pub fn penpartner(
    _profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    // Signed pressure, biased so that -127 is the resting value.
    let pressure = i32::from(report.byte(6) as i8);
    match report.id() {
        1 => {
            if report.bit(5, 0x80) {
                let (tool, id) = pen_or_eraser(report.bit(5, 0x20));
                select_tool(state, tool, id, sink);
                sink.set_key(tool.key(), true);
                sink.set_abs(Axis::Misc, id as i32);
                sink.set_abs(Axis::X, i32::from(report.le16(1)));
                sink.set_abs(Axis::Y, i32::from(report.le16(3)));
                sink.set_abs(Axis::Pressure, (pressure + 127).max(0));
                sink.set_key(Key::Touch, pressure > -127);
                sink.set_key(Key::Stylus, report.bit(5, 0x40));
            } else {
                let tool = state.tool[0].unwrap_or(Tool::Pen);
                state.id[0] = 0;
                sink.set_key(tool.key(), false);
                sink.set_abs(Axis::Misc, 0);
                sink.set_abs(Axis::Pressure, 0);
                sink.set_key(Key::Touch, false);
                sink.set_key(Key::Stylus, false);
            }
        }
        2 => {
            sink.set_key(Key::ToolPen, true);
            sink.set_abs(Axis::Misc, tool_id::STYLUS as i32);
            sink.set_abs(Axis::X, i32::from(report.le16(1)));
            sink.set_abs(Axis::Y, i32::from(report.le16(3)));
            sink.set_abs(Axis::Pressure, (pressure + 127).max(0));
            sink.set_key(Key::Touch, pressure > -80 && !report.bit(5, 0x20));
            sink.set_key(Key::Stylus, report.bit(5, 0x40));
        }
        other => {
            debug!(report_id = other, "PenPartner: unknown report");
            return DecodeResult::Ignored;
        }
    }
    DecodeResult::Commit
}

pub fn dtu(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    let prox = report.bit(1, 0x20);
    if prox {
        let (tool, id) = pen_or_eraser(report.bit(1, 0x0c));
        select_tool(state, tool, id, sink);
    }
    let pressure = (i32::from(report.byte(7) & 0x01) << 8) | i32::from(report.byte(6));
    PenSample {
        pressure,
        touch: report.bit(1, 0x05),
        stylus: report.bit(1, 0x02),
        stylus2: report.bit(1, 0x10),
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
    sink.set_key(state.tool[0].unwrap_or(Tool::Pen).key(), prox);
    sink.set_abs(Axis::Misc, state.id[0] as i32);
    DecodeResult::Commit
}

pub fn pl(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != ids::PENABLED {
        debug!(report_id = report.id(), "PL: unknown report");
        return DecodeResult::Ignored;
    }

    let prox = report.bit(1, 0x40);
    if prox {
        state.id[0] = tool_id::ERASER;
        let raw = (u32::from(report.byte(7)) << 1) | u32::from((report.byte(4) >> 2) & 1);
        let mut pressure = i32::from(raw as u8 as i8);
        if profile.pressure_max > 255 {
            pressure = (pressure << 1) | i32::from((report.byte(4) >> 6) & 1);
        }
        pressure += (profile.pressure_max + 1) / 2;

        if !state.in_proximity {
            // The tool is chosen on entry: DTF eraser bit, else the
            // stylus2 button held while approaching.
            let eraser = report.bit(1, 0x10) || report.bit(4, 0x20);
            state.tool[0] = Some(if eraser { Tool::Rubber } else { Tool::Pen });
        } else if state.tool[0] == Some(Tool::Rubber) && !report.bit(4, 0x20) {
            // Entered with stylus2 held and released it: the eraser leaves
            // in a frame of its own and the pen takes over on the next report.
            sink.set_key(Key::ToolRubber, false);
            sink.set_abs(Axis::Misc, 0);
            state.tool[0] = Some(Tool::Pen);
            return DecodeResult::Commit;
        }
        if state.tool[0] != Some(Tool::Rubber) {
            state.tool[0] = Some(Tool::Pen);
            state.id[0] = tool_id::STYLUS;
        }
        let tool = state.tool[0].unwrap_or(Tool::Pen);

        sink.set_key(tool.key(), true);
        sink.set_abs(Axis::Misc, state.id[0] as i32);
        let x = i32::from(report.byte(3))
            | (i32::from(report.byte(2)) << 7)
            | (i32::from(report.byte(1) & 0x03) << 14);
        let y = i32::from(report.byte(6))
            | (i32::from(report.byte(5)) << 7)
            | (i32::from(report.byte(4) & 0x03) << 14);
        sink.set_abs(Axis::X, x);
        sink.set_abs(Axis::Y, y);
        sink.set_abs(Axis::Pressure, pressure);
        sink.set_key(Key::Touch, report.bit(4, 0x08));
        sink.set_key(Key::Stylus, report.bit(4, 0x10));
        sink.set_key(Key::Stylus2, tool == Tool::Pen && report.bit(4, 0x20));
    } else {
        if state.tool[0] != Some(Tool::Rubber) {
            state.tool[0] = Some(Tool::Pen);
        }
        rest_position(profile, sink);
        PenSample::default().report(sink);
        sink.set_key(state.tool[0].unwrap_or(Tool::Pen).key(), false);
    }

    state.in_proximity = prox;
    DecodeResult::Commit
}

pub fn ptu(
    _profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != ids::PENABLED {
        debug!(report_id = report.id(), "PTU: unknown report");
        return DecodeResult::Ignored;
    }

    let in_range = report.bit(1, 0x20);
    let eraser = report.bit(1, 0x04);
    let (tool, id, tip) = if eraser {
        (Tool::Rubber, tool_id::ERASER, report.bit(1, 0x08))
    } else {
        (Tool::Pen, tool_id::STYLUS, report.bit(1, 0x01))
    };
    state.id[0] = id;
    sink.set_key(tool.key(), in_range);
    sink.set_abs(Axis::Misc, id as i32);
    sink.set_abs(Axis::X, i32::from(report.le16(2)));
    sink.set_abs(Axis::Y, i32::from(report.le16(4)));
    PenSample {
        pressure: i32::from(report.le16(6)),
        touch: tip,
        stylus: report.bit(1, 0x02),
        stylus2: report.bit(1, 0x10),
    }
    .in_proximity(in_range)
    .report(sink);
    DecodeResult::Commit
}

/// Serial reported with DTU-S pad events, which arrive on the pen interface.
const DTUS_PAD_SERIAL: u32 = 0xf0;

pub fn dtus(
    _profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
    has_pad: bool,
) -> DecodeResult {
    match report.id() {
        ids::DTUSPAD if has_pad => {
            let buttons = report.byte(1);
            for n in 0..4u8 {
                sink.set_key(Key::Num(n), buttons & (1 << n) != 0);
            }
            let id = if buttons & 0x0f != 0 { tool_id::PAD } else { 0 };
            sink.set_abs(Axis::Misc, id as i32);
            sink.misc_serial(DTUS_PAD_SERIAL);
            DecodeResult::Commit
        }
        ids::DTUS => {
            let prox = report.bit(1, 0x80);
            if prox {
                match (report.byte(1) >> 3) & 3 {
                    1 => select_tool(state, Tool::Rubber, tool_id::ERASER, sink),
                    2 => select_tool(state, Tool::Pen, tool_id::STYLUS, sink),
                    _ => {}
                }
            }
            sink.set_abs(Axis::X, i32::from(report.be16(3)));
            sink.set_abs(Axis::Y, i32::from(report.be16(5)));
            let pressure = (i32::from(report.byte(1) & 0x03) << 8) | i32::from(report.byte(2));
            PenSample {
                pressure,
                touch: pressure > 10,
                stylus: report.bit(1, 0x20),
                stylus2: report.bit(1, 0x40),
            }
            .in_proximity(prox)
            .report(sink);
            if !prox {
                state.id[0] = 0;
            }
            sink.set_key(state.tool[0].unwrap_or(Tool::Pen).key(), prox);
            sink.set_abs(Axis::Misc, state.id[0] as i32);
            sink.misc_serial(1);
            DecodeResult::Commit
        }
        other => {
            debug!(report_id = other, "DTU-S: unknown report");
            DecodeResult::Ignored
        }
    }
}

pub fn dth1152(
    _profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    if report.id() != DTH1152_PEN {
        debug!(report_id = report.id(), "DTH-1152: unknown report");
        return DecodeResult::Ignored;
    }

    let prox = report.bit(1, 0x80);
    if prox {
        state.tool[0] = Some(Tool::Pen);
        state.id[0] = tool_id::STYLUS;
    }
    sink.set_abs(Axis::X, i32::from(report.le16(4)));
    sink.set_abs(Axis::Y, i32::from(report.le16(6)));
    PenSample {
        pressure: i32::from(report.le16(2)),
        touch: report.bit(1, 0x10),
        stylus: report.bit(1, 0x20),
        stylus2: false,
    }
    .in_proximity(prox)
    .report(sink);
    if !prox {
        state.id[0] = 0;
    }
    sink.set_key(state.tool[0].unwrap_or(Tool::Pen).key(), prox);
    sink.set_abs(Axis::Misc, state.id[0] as i32);
    DecodeResult::Commit
}
