//! Device model: wire-format families, profiles, and attach-time quirks.

use crate::event::MAX_NUMBERED_BUTTONS;
use crate::report::len;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Graphire-style mouse/pen combo tablets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphireModel {
    /// Graphire 1-3, Volito, Bamboo1. No pad.
    Graphire,
    /// Graphire4: two pad buttons and a relative wheel.
    Graphire4,
    /// BambooFun: four pad buttons and an absolute touch ring.
    BambooFun,
}

/// Bamboo / Intuos HT pen-and-touch tablets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BambooModel {
    BambooPt,
    IntuosHt,
    /// Second generation: the pen interface speaks the professional protocol.
    IntuosHt2,
}

/// Professional tablets sharing the multi-packet pad/in-out/general protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntuosModel {
    Intuos,
    Intuos3S,
    Intuos3,
    Intuos3L,
    Intuos4S,
    Intuos4,
    Intuos4L,
    Intuos5S,
    Intuos5,
    Intuos5L,
    IntuosProS,
    IntuosProM,
    IntuosProL,
    Cintiq,
    CintiqBee,
    Cintiq13Hd,
    Cintiq21Ux2,
    Cintiq22Hd,
    Cintiq24Hd,
    Cintiq27Qhd,
    Dtk,
}

/// How a professional tablet lays out its pad report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadLayout {
    Intuos4,
    Dtk,
    Cintiq13Hd,
    Cintiq24Hd,
    Cintiq27Qhd,
    Intuos5,
    Cintiq21Ux2 { prog_keys: bool },
    /// Cintiq 21UX / Bee and first-generation Intuos3: two touch strips.
    Strips,
}

impl IntuosModel {
    /// First-generation Intuos reports half-resolution coordinates and has
    /// two independent tool channels selected by bit 0 of byte 1.
    pub fn is_first_gen(self) -> bool {
        self == Self::Intuos
    }

    pub fn is_intuos3(self) -> bool {
        matches!(self, Self::Intuos3S | Self::Intuos3 | Self::Intuos3L)
    }

    pub fn is_intuos4(self) -> bool {
        matches!(self, Self::Intuos4S | Self::Intuos4 | Self::Intuos4L)
    }

    /// Intuos5 and Intuos Pro: pen and pad on one interface, touch on a
    /// second interface only recognisable by its packet size.
    pub fn is_intuos5(self) -> bool {
        matches!(
            self,
            Self::Intuos5S
                | Self::Intuos5
                | Self::Intuos5L
                | Self::IntuosProS
                | Self::IntuosProM
                | Self::IntuosProL
        )
    }

    /// Small and medium tablets do not support the lens cursor.
    pub fn rejects_lens(self) -> bool {
        matches!(
            self,
            Self::Intuos3
                | Self::Intuos3S
                | Self::Intuos4
                | Self::Intuos4S
                | Self::Intuos5
                | Self::Intuos5S
                | Self::IntuosProM
                | Self::IntuosProS
        )
    }

    pub fn pad_layout(self) -> PadLayout {
        match self {
            m if m.is_intuos4() => PadLayout::Intuos4,
            m if m.is_intuos5() => PadLayout::Intuos5,
            Self::Dtk => PadLayout::Dtk,
            Self::Cintiq13Hd => PadLayout::Cintiq13Hd,
            Self::Cintiq24Hd => PadLayout::Cintiq24Hd,
            Self::Cintiq27Qhd => PadLayout::Cintiq27Qhd,
            Self::Cintiq21Ux2 => PadLayout::Cintiq21Ux2 { prog_keys: false },
            Self::Cintiq22Hd => PadLayout::Cintiq21Ux2 { prog_keys: true },
            _ => PadLayout::Strips,
        }
    }
}

/// Tablet PC digitizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TabletPcModel {
    /// Pen plus optional single-finger touch.
    TabletPc,
    /// Pen plus two-finger touch.
    TwoFinger,
    /// 40-byte multi-touch packets.
    MultiTouch,
    MultiTouchB,
    /// Like `MultiTouch` but without contact width/height fields.
    MultiTouchC,
}

impl TabletPcModel {
    pub fn is_multitouch(self) -> bool {
        matches!(self, Self::MultiTouch | Self::MultiTouchB | Self::MultiTouchC)
    }
}

/// Touch-only interfaces using the generic contact-stream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TouchStreamModel {
    MobileStudioPro,
    Dth1152,
}

/// Wire-format family. Selects the decoder; model sub-enums carry only the
/// distinctions their decoder actually branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    PenPartner,
    Graphire(GraphireModel),
    Pl,
    Ptu,
    Dtu,
    /// DTU-S pen displays; `pad` is false for the X variant without keys.
    Dtus { pad: bool },
    Dth1152,
    Bamboo(BambooModel),
    Intuos(IntuosModel),
    TabletPc(TabletPcModel),
    MobileStudioPro,
    IntuosPro2,
    TouchStream(TouchStreamModel),
}

impl Family {
    /// Families whose touch interface is only identifiable by endpoint packet size.
    pub fn touch_from_packet_size(self) -> bool {
        match self {
            Self::Bamboo(_) => true,
            Self::Intuos(m) => m.is_intuos5(),
            _ => false,
        }
    }

    /// Whether this family can expose a touch channel at all.
    pub fn has_touch(self) -> bool {
        matches!(
            self,
            Self::Bamboo(_) | Self::TabletPc(_) | Self::IntuosPro2 | Self::TouchStream(_)
        ) || self.touch_from_packet_size()
    }
}

/// Which logical channel an interface carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Pen,
    /// Single-finger touch.
    Finger,
    /// Two-finger touch.
    DoubleTap,
    /// Three or more fingers.
    TripleTap,
}

impl DeviceType {
    pub fn is_touch(self) -> bool {
        self != Self::Pen
    }
}

/// Attach-time adjustments recorded on the profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quirks {
    /// Channel type and geometry were chosen from the endpoint packet size
    /// because the descriptor does not describe the touch interface.
    pub touch_from_packet_size: bool,
    /// First-generation Bamboo touch: 11-bit coordinates scaled by 32.
    pub bbtouch_lowres: bool,
    /// Geometry was replaced from a configuration override.
    pub geometry_override: bool,
}

/// Static table row: identity plus the geometry the vendor documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileEntry {
    pub name: &'static str,
    pub vendor: u16,
    pub product: u16,
    pub pkglen: usize,
    pub x_max: i32,
    pub y_max: i32,
    pub pressure_max: i32,
    pub distance_max: i32,
    pub family: Family,
    pub numbered_buttons: u8,
    /// Inset of the active area on all four edges.
    pub offset: i32,
    /// Fixed channel type, or `None` when the interface decides.
    pub device_type: Option<DeviceType>,
}

impl ProfileEntry {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        name: &'static str,
        product: u16,
        pkglen: usize,
        x_max: i32,
        y_max: i32,
        pressure_max: i32,
        distance_max: i32,
        family: Family,
    ) -> Self {
        Self {
            name,
            vendor: crate::WACOM_VID,
            product,
            pkglen,
            x_max,
            y_max,
            pressure_max,
            distance_max,
            family,
            numbered_buttons: 0,
            offset: 0,
            device_type: None,
        }
    }

    /// Touch-only interface with geometry supplied by the descriptor.
    pub const fn touch(name: &'static str, product: u16, pkglen: usize, family: Family) -> Self {
        Self {
            device_type: Some(DeviceType::TripleTap),
            ..Self::new(name, product, pkglen, 0, 0, 0, 0, family)
        }
    }

    pub const fn buttons(self, numbered_buttons: u8) -> Self {
        Self {
            numbered_buttons,
            ..self
        }
    }

    pub const fn offset(self, offset: i32) -> Self {
        Self { offset, ..self }
    }

    pub const fn vendor(self, vendor: u16) -> Self {
        Self { vendor, ..self }
    }
}

/// What the transport learned about the interface from its descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// wMaxPacketSize of the interrupt endpoint.
    pub max_packet_size: Option<usize>,
    /// Channel type reported by the HID descriptor, if it describes one.
    pub device_type: Option<DeviceType>,
    /// Maximum simultaneous contacts reported by the descriptor.
    pub touch_max: Option<u8>,
    /// Touch geometry from the descriptor: (x_max, y_max, x_phy, y_phy).
    pub touch_geometry: Option<(i32, i32, i32, i32)>,
}

impl InterfaceInfo {
    pub fn pen() -> Self {
        Self {
            device_type: Some(DeviceType::Pen),
            ..Self::default()
        }
    }

    pub fn touch(device_type: DeviceType) -> Self {
        Self {
            device_type: Some(device_type),
            ..Self::default()
        }
    }

    pub fn with_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = Some(size);
        self
    }

    pub fn with_touch_max(mut self, touch_max: u8) -> Self {
        self.touch_max = Some(touch_max);
        self
    }

    pub fn with_touch_geometry(mut self, x_max: i32, y_max: i32, x_phy: i32, y_phy: i32) -> Self {
        self.touch_geometry = Some((x_max, y_max, x_phy, y_phy));
        self
    }
}

/// Immutable per-interface profile, shared by every decode call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub family: Family,
    pub device_type: DeviceType,
    pub pkglen: usize,
    pub x_max: i32,
    pub y_max: i32,
    pub pressure_max: i32,
    pub distance_max: i32,
    pub x_fuzz: i32,
    pub y_fuzz: i32,
    pub pressure_fuzz: i32,
    pub distance_fuzz: i32,
    pub tilt_fuzz: i32,
    pub offset_left: i32,
    pub offset_top: i32,
    pub offset_right: i32,
    pub offset_bottom: i32,
    pub numbered_buttons: u8,
    pub x_phy: i32,
    pub y_phy: i32,
    /// Maximum simultaneous contacts; sizes the slot table.
    pub touch_max: u8,
    pub quirks: Quirks,
}

/// Default touch geometry when the descriptor does not supply one.
const DEFAULT_TOUCH_MAX_COORD: i32 = 1023;
/// Geometry of the 3rd-generation Bamboo / Intuos5 touch interface.
const BBTOUCH3_COORD_MAX: i32 = 4096;
/// Coordinate scale of the first-generation Bamboo touch interface.
const BBTOUCH_LOWRES_SHIFT: u32 = 5;

impl DeviceProfile {
    /// Build the profile of one interface from its table entry.
    ///
    /// Applies the attach-time quirks: channel type from packet size for
    /// families whose descriptors omit the touch interface, default touch
    /// geometry, and low-resolution Bamboo touch scaling.
    pub fn attach(entry: &ProfileEntry, iface: InterfaceInfo) -> Self {
        let mut profile = Self {
            name: entry.name.to_string(),
            vendor: entry.vendor,
            product: entry.product,
            family: entry.family,
            device_type: entry
                .device_type
                .or(iface.device_type)
                .unwrap_or(DeviceType::Pen),
            pkglen: entry.pkglen,
            x_max: entry.x_max,
            y_max: entry.y_max,
            pressure_max: entry.pressure_max,
            distance_max: entry.distance_max,
            x_fuzz: 4,
            y_fuzz: 4,
            pressure_fuzz: 0,
            distance_fuzz: 0,
            tilt_fuzz: 1,
            offset_left: entry.offset,
            offset_top: entry.offset,
            offset_right: entry.offset,
            offset_bottom: entry.offset,
            numbered_buttons: entry.numbered_buttons.min(MAX_NUMBERED_BUTTONS as u8),
            x_phy: 0,
            y_phy: 0,
            touch_max: 0,
            quirks: Quirks::default(),
        };

        let packet = iface.max_packet_size;

        if entry.family.touch_from_packet_size() {
            if let Some(size) = packet {
                profile.quirks.touch_from_packet_size = true;
                profile.device_type = match size {
                    len::BBTOUCH3 => {
                        profile.pkglen = len::BBTOUCH3;
                        profile.x_max = BBTOUCH3_COORD_MAX;
                        profile.y_max = BBTOUCH3_COORD_MAX;
                        profile.touch_max = 16;
                        DeviceType::DoubleTap
                    }
                    len::BBTOUCH if matches!(entry.family, Family::Bamboo(BambooModel::BambooPt)) => {
                        profile.pkglen = len::BBTOUCH;
                        profile.x_max = 0;
                        profile.y_max = 0;
                        profile.touch_max = 2;
                        DeviceType::DoubleTap
                    }
                    _ => DeviceType::Pen,
                };
            }
        }

        if entry.family == Family::IntuosPro2 && packet == Some(len::INTUOSP2T) {
            profile.device_type = DeviceType::TripleTap;
            profile.pkglen = len::INTUOSP2T;
            profile.x_max = 0;
            profile.y_max = 0;
            profile.pressure_max = 0;
            profile.distance_max = 0;
            profile.numbered_buttons = 0;
            profile.quirks.touch_from_packet_size = true;
        }

        if profile.device_type.is_touch() {
            if let Some((x_max, y_max, x_phy, y_phy)) = iface.touch_geometry {
                profile.x_max = x_max;
                profile.y_max = y_max;
                profile.x_phy = x_phy;
                profile.y_phy = y_phy;
            }
            if profile.x_max == 0 {
                profile.x_max = DEFAULT_TOUCH_MAX_COORD;
                profile.y_max = DEFAULT_TOUCH_MAX_COORD;
            }
            // Pen offsets do not apply to the touch surface.
            profile.offset_left = 0;
            profile.offset_top = 0;
            profile.offset_right = 0;
            profile.offset_bottom = 0;
            if profile.touch_max == 0 {
                profile.touch_max = default_touch_max(entry.family, profile.device_type);
            }
            if let Some(n) = iface.touch_max {
                profile.touch_max = n;
            }
        }

        if matches!(entry.family, Family::Bamboo(BambooModel::BambooPt))
            && profile.pkglen == len::BBTOUCH
        {
            profile.x_max <<= BBTOUCH_LOWRES_SHIFT;
            profile.y_max <<= BBTOUCH_LOWRES_SHIFT;
            profile.x_fuzz <<= BBTOUCH_LOWRES_SHIFT;
            profile.y_fuzz <<= BBTOUCH_LOWRES_SHIFT;
            profile.quirks.bbtouch_lowres = true;
        }

        debug!(
            name = %profile.name,
            family = ?profile.family,
            device_type = ?profile.device_type,
            pkglen = profile.pkglen,
            x_max = profile.x_max,
            y_max = profile.y_max,
            "Profile attached"
        );
        profile
    }

    /// Whether this channel carries touch data.
    pub fn is_touch(&self) -> bool {
        self.device_type.is_touch()
    }

    /// Number of contact slots the decoder state must provide.
    pub fn slot_count(&self) -> usize {
        crate::slots::clamp_slot_count(self.touch_max)
    }
}

fn default_touch_max(family: Family, device_type: DeviceType) -> u8 {
    match (family, device_type) {
        (Family::TouchStream(_), _) | (Family::IntuosPro2, _) => 10,
        (Family::TabletPc(m), _) if m.is_multitouch() => 2,
        (_, DeviceType::Finger) => 1,
        _ => 2,
    }
}
