//! Per-family report decoders.
//!
//! Each decoder reads one report, updates the channel's [`DecoderState`]
//! and emits events into the sink. It returns a [`DecodeResult`] telling the
//! dispatcher whether the emitted events form a finished frame.

pub mod bamboo;
pub mod graphire;
pub mod intuos;
pub mod mspro;
pub mod multitouch;
pub mod pen;
pub mod tabletpc;

use crate::device::DeviceProfile;
use crate::event::{numbered_button_key, Axis, EventSink, Key};
use crate::state::{DecoderState, Tool};
use serde::Serialize;

/// Outcome of decoding one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodeResult {
    /// Not a report this decoder understands. Nothing was emitted or changed.
    Ignored,
    /// State was updated but there is nothing to show yet.
    StateOnly,
    /// A visible batch of events is ready to commit.
    Commit,
}

impl DecodeResult {
    pub fn is_commit(self) -> bool {
        self == Self::Commit
    }
}

/// Splits one report into several frames.
///
/// Each call to [`FrameSeq::next`] after the first commits the frame before
/// it. The last frame is left open for the dispatcher to commit.
pub(crate) struct FrameSeq<'a> {
    sink: &'a mut dyn EventSink,
    frames: usize,
}

impl<'a> FrameSeq<'a> {
    pub(crate) fn new(sink: &'a mut dyn EventSink) -> Self {
        Self { sink, frames: 0 }
    }

    /// Start a new frame and return the sink to emit it into.
    pub(crate) fn next(&mut self) -> &mut dyn EventSink {
        if self.frames > 0 {
            self.sink.commit();
        }
        self.frames += 1;
        &mut *self.sink
    }

    /// `Commit` if any frame was started, else `otherwise`.
    pub(crate) fn finish(&self, otherwise: DecodeResult) -> DecodeResult {
        if self.frames > 0 {
            DecodeResult::Commit
        } else {
            otherwise
        }
    }
}

/// Position reported when a tool leaves proximity: the top-left corner of
/// the active area.
pub(crate) fn rest_position(profile: &DeviceProfile, sink: &mut dyn EventSink) {
    sink.set_abs(Axis::X, profile.offset_left);
    sink.set_abs(Axis::Y, profile.offset_top);
}

/// Make `tool` the current tool of slot 0. A different tool still in
/// proximity has its key released first.
pub(crate) fn select_tool(state: &mut DecoderState, tool: Tool, id: u32, sink: &mut dyn EventSink) {
    if state.id[0] != 0 {
        if let Some(old) = state.tool[0].filter(|&old| old != tool) {
            sink.set_key(old.key(), false);
        }
    }
    state.tool[0] = Some(tool);
    state.id[0] = id;
}

/// Tip and barrel button state of one pen sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PenSample {
    pub pressure: i32,
    pub touch: bool,
    pub stylus: bool,
    pub stylus2: bool,
}

impl PenSample {
    /// Out of proximity everything reads as released.
    pub(crate) fn in_proximity(self, prox: bool) -> Self {
        if prox {
            self
        } else {
            Self::default()
        }
    }

    pub(crate) fn report(self, sink: &mut dyn EventSink) {
        sink.set_abs(Axis::Pressure, self.pressure);
        sink.set_key(Key::Touch, self.touch);
        sink.set_key(Key::Stylus, self.stylus);
        sink.set_key(Key::Stylus2, self.stylus2);
    }
}

/// Report the first `count` numbered pad buttons from a bitmask.
pub(crate) fn report_numbered_buttons(sink: &mut dyn EventSink, count: u8, mask: u32) {
    for n in 0..usize::from(count) {
        if let Some(key) = numbered_button_key(n) {
            let pressed = n < 32 && mask & (1 << n) != 0;
            sink.set_key(key, pressed);
        }
    }
}

/// Expose a professional tool id on the misc axis.
///
/// The high bits are shifted up by four so the tool-type nibble stays
/// separate from the generation bits.
pub fn mangle_tool_id(id: u32) -> i32 {
    (((id & !0xFFF) << 4) | (id & 0xFFF)) as i32
}

/// Resolve a professional tool id to its tool. Unknown ids are pens.
pub fn tool_type(id: u32) -> Tool {
    match id {
        // Inking pens
        0x812 | 0x801 | 0x12802 | 0x012 => Tool::Pencil,
        // General, grip, classic, marker and art pens
        0x822 | 0x842 | 0x852 | 0x823 | 0x813 | 0x885 | 0x802 | 0x804 | 0x8e2 | 0x022
        | 0x10804 | 0x14802 | 0x16802 | 0x18802 | 0x10802 => Tool::Pen,
        // Stroke pens
        0x832 | 0x032 => Tool::Brush,
        // 4D, 2D and Intuos4 mice
        0x007 | 0x09c | 0x094 | 0x017 | 0x806 => Tool::Mouse,
        0x096 | 0x097 | 0x006 => Tool::Lens,
        0x82a | 0x84a | 0x85a | 0x91a | 0xd1a | 0x0fa | 0x82b | 0x81b | 0x91b | 0x80c
        | 0x80a | 0x90a | 0x1480a | 0x1090a | 0x1080c | 0x1680a | 0x1880a | 0x1080a => {
            Tool::Rubber
        }
        0xd12 | 0x912 | 0x112 | 0x913 | 0x902 | 0x10902 => Tool::Airbrush,
        _ => Tool::Pen,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventRecorder;

    #[test]
    fn tool_table() {
        assert_eq!(tool_type(0x802), Tool::Pen);
        assert_eq!(tool_type(0x80a), Tool::Rubber);
        assert_eq!(tool_type(0x12802), Tool::Pencil);
        assert_eq!(tool_type(0x832), Tool::Brush);
        assert_eq!(tool_type(0x902), Tool::Airbrush);
        assert_eq!(tool_type(0x806), Tool::Mouse);
        assert_eq!(tool_type(0x097), Tool::Lens);
        assert_eq!(tool_type(0xABCDE), Tool::Pen);
    }

    #[test]
    fn mangle_shifts_generation_bits() {
        assert_eq!(mangle_tool_id(0x802), 0x802);
        assert_eq!(mangle_tool_id(0x10802), 0x100802);
        assert_eq!(mangle_tool_id(0), 0);
    }

    #[test]
    fn numbered_buttons_follow_mask() {
        let mut rec = EventRecorder::new();
        report_numbered_buttons(&mut rec, 11, 0b100_0000_0101);
        rec.commit();
        let f = &rec.frames()[0];
        assert_eq!(f.events.len(), 11);
        assert_eq!(f.key(Key::Num(0)), Some(true));
        assert_eq!(f.key(Key::Num(1)), Some(false));
        assert_eq!(f.key(Key::Num(2)), Some(true));
        assert_eq!(f.key(Key::A), Some(true));
    }

    #[test]
    fn frame_seq_commits_between_frames() {
        let mut rec = EventRecorder::new();
        let mut seq = FrameSeq::new(&mut rec);
        assert_eq!(seq.finish(DecodeResult::Ignored), DecodeResult::Ignored);
        seq.next().set_abs(Axis::X, 1);
        seq.next().set_abs(Axis::X, 2);
        assert_eq!(seq.finish(DecodeResult::Ignored), DecodeResult::Commit);
        assert_eq!(rec.frames().len(), 1);
        assert_eq!(rec.pending().len(), 1);
    }
}
