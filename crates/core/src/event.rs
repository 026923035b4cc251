//! Normalized events and the sink they are delivered to.
//!
//! Decoders never talk to an OS input layer directly. They emit into an
//! [`EventSink`] so that a real uinput/evdev writer, a capability checker,
//! and the test recorder all share the same interface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Button and tool keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    Touch,
    Stylus,
    Stylus2,
    ToolPen,
    ToolRubber,
    ToolBrush,
    ToolPencil,
    ToolAirbrush,
    ToolMouse,
    ToolLens,
    ToolFinger,
    ToolDoubleTap,
    ToolTripleTap,
    ToolQuadTap,
    Left,
    Right,
    Middle,
    Side,
    Extra,
    Forward,
    Back,
    /// BTN_0 .. BTN_9.
    Num(u8),
    A,
    B,
    C,
    X,
    Y,
    Z,
    Base,
    Base2,
    /// KEY_PROG1 .. KEY_PROG3.
    Prog(u8),
}

/// Absolute axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Throttle,
    Wheel,
    Pressure,
    Distance,
    TiltX,
    TiltY,
    ToolWidth,
    /// Tool id of the tool currently reported.
    Misc,
    MtSlot,
    MtTrackingId,
    MtPositionX,
    MtPositionY,
}

/// Relative axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelAxis {
    Wheel,
}

/// Maximum number of numbered pad buttons that have a key.
pub const MAX_NUMBERED_BUTTONS: usize = 18;

/// Key for the `n`th numbered pad button.
///
/// Buttons 0-9 map to the digit keys, 10-15 to the letter keys and 16-17 to
/// the base keys. Higher indices have no key.
pub fn numbered_button_key(n: usize) -> Option<Key> {
    const LETTERS: [Key; 6] = [Key::A, Key::B, Key::C, Key::X, Key::Y, Key::Z];
    match n {
        0..=9 => Some(Key::Num(n as u8)),
        10..=15 => LETTERS.get(n - 10).copied(),
        16 => Some(Key::Base),
        17 => Some(Key::Base2),
        _ => None,
    }
}

/// One normalized field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Key { key: Key, pressed: bool },
    Abs { axis: Axis, value: i32 },
    Rel { axis: RelAxis, delta: i32 },
    Serial { value: u32 },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key { key, pressed } => write!(f, "KEY {key:?}={}", u8::from(*pressed)),
            Self::Abs { axis, value } => write!(f, "ABS {axis:?}={value}"),
            Self::Rel { axis, delta } => write!(f, "REL {axis:?}={delta}"),
            Self::Serial { value } => write!(f, "MSC Serial=0x{value:X}"),
        }
    }
}

/// Destination for decoded events.
///
/// Implementations buffer events until [`EventSink::commit`] marks the end
/// of one coherent sample.
pub trait EventSink {
    fn set_abs(&mut self, axis: Axis, value: i32);
    fn set_key(&mut self, key: Key, pressed: bool);
    fn set_rel(&mut self, axis: RelAxis, delta: i32);
    fn misc_serial(&mut self, value: u32);
    /// Flush everything emitted since the previous commit as one update.
    fn commit(&mut self);
}

/// A committed batch of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub events: Vec<Event>,
}

impl Frame {
    /// Last value reported for `axis` in this frame.
    pub fn abs(&self, axis: Axis) -> Option<i32> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Abs { axis: a, value } if *a == axis => Some(*value),
            _ => None,
        })
    }

    /// Last state reported for `key` in this frame.
    pub fn key(&self, key: Key) -> Option<bool> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Key { key: k, pressed } if *k == key => Some(*pressed),
            _ => None,
        })
    }

    pub fn rel(&self, axis: RelAxis) -> Option<i32> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Rel { axis: a, delta } if *a == axis => Some(*delta),
            _ => None,
        })
    }

    pub fn serial(&self) -> Option<u32> {
        self.events.iter().rev().find_map(|e| match e {
            Event::Serial { value } => Some(*value),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.events.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Sink that records committed frames in memory.
///
/// Used by the CLI to print decoded output and by tests to inspect it.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pending: Vec<Event>,
    frames: Vec<Frame>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames committed so far.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Events emitted but not yet committed.
    pub fn pending(&self) -> &[Event] {
        &self.pending
    }

    /// Drain committed frames, keeping uncommitted events buffered.
    pub fn take_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }
}

impl EventSink for EventRecorder {
    fn set_abs(&mut self, axis: Axis, value: i32) {
        self.pending.push(Event::Abs { axis, value });
    }

    fn set_key(&mut self, key: Key, pressed: bool) {
        self.pending.push(Event::Key { key, pressed });
    }

    fn set_rel(&mut self, axis: RelAxis, delta: i32) {
        self.pending.push(Event::Rel { axis, delta });
    }

    fn misc_serial(&mut self, value: u32) {
        self.pending.push(Event::Serial { value });
    }

    fn commit(&mut self) {
        let events = std::mem::take(&mut self.pending);
        self.frames.push(Frame { events });
    }
}
