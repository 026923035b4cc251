//! Capability declaration: the keys, axes and ranges a channel may emit.
//!
//! [`declare`] is a pure function of the profile. [`CheckedSink`] holds a
//! decoder to that declaration in debug builds.

use crate::device::{BambooModel, DeviceProfile, DeviceType, Family, GraphireModel, IntuosModel};
use crate::event::{numbered_button_key, Axis, EventSink, Key, RelAxis};
use crate::report::len;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Range and filtering parameters of one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AbsInfo {
    pub min: i32,
    pub max: i32,
    pub fuzz: i32,
    pub flat: i32,
}

impl AbsInfo {
    pub const fn new(min: i32, max: i32, fuzz: i32) -> Self {
        Self { min, max, fuzz, flat: 0 }
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Full input surface of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub keys: BTreeSet<Key>,
    pub abs: BTreeMap<Axis, AbsInfo>,
    pub rel: BTreeSet<RelAxis>,
    pub msc_serial: bool,
    /// Multi-touch slot count, zero for channels without slots.
    pub slots: usize,
}

/// Ring and strip sensor range.
const STRIP_MAX: i32 = 4096;
pub(crate) const ROTATION_MIN: i32 = -900;
pub(crate) const ROTATION_MAX: i32 = 899;
pub(crate) const TILT_MIN: i32 = -64;
pub(crate) const TILT_MAX: i32 = 127;
/// Airbrush wheel travel on the pro pens.
pub(crate) const WHEEL_MAX: i32 = 1023;

impl Capabilities {
    fn key(&mut self, key: Key) -> &mut Self {
        self.keys.insert(key);
        self
    }

    fn keys(&mut self, keys: &[Key]) -> &mut Self {
        self.keys.extend(keys.iter().copied());
        self
    }

    fn abs(&mut self, axis: Axis, min: i32, max: i32, fuzz: i32) -> &mut Self {
        self.abs.insert(axis, AbsInfo::new(min, max, fuzz));
        self
    }

    fn serial(&mut self) -> &mut Self {
        self.msc_serial = true;
        self
    }

    fn wheel(&mut self) -> &mut Self {
        self.rel.insert(RelAxis::Wheel);
        self
    }

    pub fn has_key(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn abs_info(&self, axis: Axis) -> Option<&AbsInfo> {
        self.abs.get(&axis)
    }

    fn misc(&mut self) -> &mut Self {
        self.abs(Axis::Misc, i32::MIN, i32::MAX, 0)
    }

    fn numbered_buttons(&mut self, count: u8) -> &mut Self {
        for n in 0..usize::from(count) {
            if let Some(key) = numbered_button_key(n) {
                self.keys.insert(key);
            }
        }
        self
    }

    fn prog_keys(&mut self) -> &mut Self {
        self.keys(&[Key::Prog(1), Key::Prog(2), Key::Prog(3)])
    }

    fn basic_pen(&mut self) -> &mut Self {
        self.keys(&[Key::ToolPen, Key::ToolRubber, Key::Stylus, Key::Stylus2])
    }

    /// Every tool the professional tool table can resolve, plus the axes
    /// their packets carry.
    fn pro_tools(&mut self, p: &DeviceProfile) -> &mut Self {
        self.serial()
            .keys(&[
                Key::ToolPen,
                Key::ToolRubber,
                Key::ToolBrush,
                Key::ToolPencil,
                Key::ToolAirbrush,
                Key::ToolMouse,
                Key::ToolLens,
                Key::Stylus,
                Key::Stylus2,
                Key::Left,
                Key::Right,
                Key::Middle,
                Key::Side,
                Key::Extra,
            ])
            .wheel()
            .abs(Axis::Distance, 0, p.distance_max, p.distance_fuzz)
            .abs(Axis::Wheel, 0, WHEEL_MAX, 0)
            .abs(Axis::TiltX, TILT_MIN, TILT_MAX, p.tilt_fuzz)
            .abs(Axis::TiltY, TILT_MIN, TILT_MAX, p.tilt_fuzz)
            .abs(Axis::Z, ROTATION_MIN, ROTATION_MAX, 0)
            .abs(Axis::Rz, ROTATION_MIN, ROTATION_MAX, 0)
            .abs(Axis::Throttle, -1023, 1023, 0)
    }

    fn pad(&mut self, p: &DeviceProfile) -> &mut Self {
        self.key(Key::ToolFinger)
            .numbered_buttons(p.numbered_buttons)
            .serial()
    }

    fn touch_keys(&mut self) -> &mut Self {
        self.keys(&[Key::ToolDoubleTap, Key::ToolTripleTap])
    }

    fn bamboo_touch(&mut self, p: &DeviceProfile) -> &mut Self {
        self.keys(&[
            Key::Left,
            Key::Right,
            Key::Forward,
            Key::Back,
            Key::ToolFinger,
            Key::ToolDoubleTap,
        ]);
        if p.pkglen == len::BBTOUCH3 {
            // Width is reported in hundredths of the raw contact size.
            self.keys(&[Key::ToolTripleTap, Key::ToolQuadTap])
                .abs(Axis::ToolWidth, 0, 255 * 100, 0);
        }
        self
    }

    fn mt_slots(&mut self, p: &DeviceProfile) -> &mut Self {
        self.serial()
            .misc()
            .touch_keys()
            .abs(Axis::Rx, 0, p.x_phy, 0)
            .abs(Axis::Ry, 0, p.y_phy, 0);
        if p.touch_max > 1 {
            let slots = p.slot_count();
            self.slots = slots;
            self.abs(Axis::MtSlot, 0, slots as i32 - 1, 0)
                .abs(Axis::MtTrackingId, -1, i32::from(u16::MAX), 0)
                .abs(Axis::MtPositionX, 0, p.x_max, p.x_fuzz)
                .abs(Axis::MtPositionY, 0, p.y_max, p.y_fuzz);
        }
        self
    }
}

/// Declare the input surface of the channel described by `profile`.
pub fn declare(profile: &DeviceProfile) -> Capabilities {
    let p = profile;
    let mut caps = Capabilities::default();

    caps.key(Key::Touch)
        .abs(Axis::X, p.offset_left, p.x_max - p.offset_right, p.x_fuzz)
        .abs(Axis::Y, p.offset_top, p.y_max - p.offset_bottom, p.y_fuzz);
    if p.device_type == DeviceType::Pen {
        caps.abs(Axis::Pressure, 0, p.pressure_max, p.pressure_fuzz);
    }

    match p.family {
        Family::PenPartner => {
            caps.keys(&[Key::ToolPen, Key::ToolRubber, Key::Stylus]).misc();
        }
        Family::Dtu | Family::Pl | Family::Ptu | Family::Dth1152 => {
            caps.basic_pen().misc();
        }
        Family::Dtus { pad } => {
            caps.basic_pen().misc().serial();
            if pad {
                caps.keys(&[Key::Num(0), Key::Num(1), Key::Num(2), Key::Num(3)]);
            }
        }
        Family::Graphire(model) => {
            caps.basic_pen()
                .misc()
                .serial()
                .wheel()
                .keys(&[Key::ToolMouse, Key::Left, Key::Right, Key::Middle])
                .abs(Axis::Distance, 0, p.distance_max, p.distance_fuzz);
            match model {
                GraphireModel::Graphire => {}
                GraphireModel::Graphire4 => {
                    caps.keys(&[Key::ToolFinger, Key::Num(0), Key::Num(4)]);
                }
                GraphireModel::BambooFun => {
                    caps.keys(&[Key::ToolFinger, Key::Num(0), Key::Num(1), Key::Num(4), Key::Num(5)])
                        .abs(Axis::Wheel, 0, 71, 0);
                }
            }
        }
        Family::Bamboo(model) => match p.device_type {
            DeviceType::Pen if model == BambooModel::IntuosHt2 => {
                caps.misc().pro_tools(p);
            }
            DeviceType::Pen => {
                caps.basic_pen()
                    .abs(Axis::Distance, 0, p.distance_max, p.distance_fuzz);
            }
            _ => {
                caps.bamboo_touch(p);
            }
        },
        Family::Intuos(model) => {
            if p.device_type == DeviceType::Pen {
                caps.misc()
                    .pro_tools(p)
                    .pad(p)
                    .abs(Axis::Rx, 0, STRIP_MAX, 0)
                    .abs(Axis::Ry, 0, STRIP_MAX, 0);
                if matches!(
                    model,
                    IntuosModel::Cintiq24Hd | IntuosModel::Cintiq27Qhd | IntuosModel::Cintiq22Hd
                ) {
                    caps.prog_keys();
                }
            } else {
                caps.bamboo_touch(p);
            }
        }
        Family::TabletPc(_) => {
            caps.misc();
            if p.is_touch() {
                caps.mt_slots(p)
                    .abs(Axis::Pressure, 0, p.pressure_max, p.pressure_fuzz);
            } else {
                caps.basic_pen();
            }
        }
        Family::MobileStudioPro | Family::IntuosPro2 => {
            if p.is_touch() {
                caps.mt_slots(p);
            } else {
                caps.misc().pro_tools(p);
                if p.numbered_buttons > 0 {
                    caps.pad(p);
                }
            }
        }
        Family::TouchStream(_) => {
            caps.mt_slots(p);
        }
    }

    caps
}

/// A declaration mismatch observed by [`CheckedSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    UndeclaredKey(Key),
    UndeclaredAxis(Axis),
    UndeclaredRel(RelAxis),
    UndeclaredSerial,
    OutOfRange { axis: Axis, value: i32, info: AbsInfo },
}

impl Violation {
    /// The decoder emitted something that was never declared at all.
    pub fn is_undeclared(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. })
    }
}

/// Sink adapter that checks every emission against a declaration.
///
/// Events are always forwarded. Checks run only with debug assertions on.
pub struct CheckedSink<'a, S: EventSink + ?Sized> {
    inner: &'a mut S,
    caps: &'a Capabilities,
    violations: Vec<Violation>,
}

impl<'a, S: EventSink + ?Sized> CheckedSink<'a, S> {
    pub fn new(inner: &'a mut S, caps: &'a Capabilities) -> Self {
        Self {
            inner,
            caps,
            violations: Vec::new(),
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }

    fn record(&mut self, violation: Violation) {
        warn!(?violation, "Event outside declared capabilities");
        self.violations.push(violation);
    }
}

impl<S: EventSink + ?Sized> EventSink for CheckedSink<'_, S> {
    fn set_abs(&mut self, axis: Axis, value: i32) {
        if cfg!(debug_assertions) {
            match self.caps.abs_info(axis).copied() {
                None => self.record(Violation::UndeclaredAxis(axis)),
                Some(info) if !info.contains(value) => {
                    self.record(Violation::OutOfRange { axis, value, info })
                }
                Some(_) => {}
            }
        }
        self.inner.set_abs(axis, value);
    }

    fn set_key(&mut self, key: Key, pressed: bool) {
        if cfg!(debug_assertions) && !self.caps.has_key(key) {
            self.record(Violation::UndeclaredKey(key));
        }
        self.inner.set_key(key, pressed);
    }

    fn set_rel(&mut self, axis: RelAxis, delta: i32) {
        if cfg!(debug_assertions) && !self.caps.rel.contains(&axis) {
            self.record(Violation::UndeclaredRel(axis));
        }
        self.inner.set_rel(axis, delta);
    }

    fn misc_serial(&mut self, value: u32) {
        if cfg!(debug_assertions) && !self.caps.msc_serial {
            self.record(Violation::UndeclaredSerial);
        }
        self.inner.misc_serial(value);
    }

    fn commit(&mut self) {
        self.inner.commit();
    }
}
