//! Static device table keyed by (vendor, product).

use crate::device::{
    BambooModel::*, Family, GraphireModel::*, IntuosModel::*, ProfileEntry,
    TabletPcModel::*, TouchStreamModel,
};
use crate::error::{Error, Result};
use crate::report::len;

const CINTIQ_OFFSET: i32 = 400;
const DTU_OFFSET: i32 = 200;
const LENOVO_VID: u16 = 0x17EF;

#[allow(clippy::too_many_arguments)]
const fn pen(
    name: &'static str,
    product: u16,
    pkglen: usize,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    distance_max: i32,
    family: Family,
) -> ProfileEntry {
    ProfileEntry::new(name, product, pkglen, x_max, y_max, pressure_max, distance_max, family)
}

#[allow(clippy::too_many_arguments)]
const fn intuos(
    name: &'static str,
    product: u16,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    distance_max: i32,
    model: crate::device::IntuosModel,
    buttons: u8,
) -> ProfileEntry {
    pen(name, product, len::INTUOS, x_max, y_max, pressure_max, distance_max, Family::Intuos(model))
        .buttons(buttons)
}

const fn cintiq(
    name: &'static str,
    product: u16,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    model: crate::device::IntuosModel,
    buttons: u8,
) -> ProfileEntry {
    intuos(name, product, x_max, y_max, pressure_max, 63, model, buttons).offset(CINTIQ_OFFSET)
}

const fn graphire(name: &'static str, product: u16, x_max: i32, y_max: i32, pressure_max: i32) -> ProfileEntry {
    pen(name, product, len::GRAPHIRE, x_max, y_max, pressure_max, 63, Family::Graphire(Graphire))
}

const fn pl(name: &'static str, product: u16, x_max: i32, y_max: i32, pressure_max: i32) -> ProfileEntry {
    pen(name, product, len::GRAPHIRE, x_max, y_max, pressure_max, 0, Family::Pl)
}

const fn tpc(name: &'static str, product: u16, x_max: i32, y_max: i32, pressure_max: i32) -> ProfileEntry {
    pen(name, product, len::GRAPHIRE, x_max, y_max, pressure_max, 0, Family::TabletPc(TabletPc))
}

const fn mttpc(
    name: &'static str,
    product: u16,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    model: crate::device::TabletPcModel,
) -> ProfileEntry {
    pen(name, product, len::MTTPC, x_max, y_max, pressure_max, 0, Family::TabletPc(model))
}

#[allow(clippy::too_many_arguments)]
const fn bamboo(
    name: &'static str,
    product: u16,
    pkglen: usize,
    x_max: i32,
    y_max: i32,
    distance_max: i32,
    model: crate::device::BambooModel,
) -> ProfileEntry {
    pen(name, product, pkglen, x_max, y_max, 1023, distance_max, Family::Bamboo(model))
}

const fn dtus(
    name: &'static str,
    product: u16,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    buttons: u8,
) -> ProfileEntry {
    pen(name, product, len::DTUS, x_max, y_max, pressure_max, 0, Family::Dtus { pad: true })
        .buttons(buttons)
        .offset(DTU_OFFSET)
}

const fn mspro(name: &'static str, product: u16, x_max: i32, y_max: i32, buttons: u8) -> ProfileEntry {
    pen(name, product, len::MSPRO, x_max, y_max, 8191, 63, Family::MobileStudioPro)
        .buttons(buttons)
        .offset(CINTIQ_OFFSET)
}

const fn mspro_touch(name: &'static str, product: u16) -> ProfileEntry {
    ProfileEntry::touch(name, product, len::MSPROT, Family::TouchStream(TouchStreamModel::MobileStudioPro))
}

/// Every supported device.
pub static PROFILES: &[ProfileEntry] = &[
    pen("Wacom Penpartner", 0x00, len::PENPRTN, 5040, 3780, 255, 0, Family::PenPartner),
    graphire("Wacom Graphire", 0x10, 10206, 7422, 511),
    graphire("Wacom Graphire2 4x5", 0x11, 10206, 7422, 511),
    graphire("Wacom Graphire2 5x7", 0x12, 13918, 10206, 511),
    graphire("Wacom Graphire3", 0x13, 10208, 7424, 511),
    graphire("Wacom Graphire3 6x8", 0x14, 16704, 12064, 511),
    pen("Wacom Graphire4 4x5", 0x15, len::GRAPHIRE, 10208, 7424, 511, 63, Family::Graphire(Graphire4)),
    pen("Wacom Graphire4 6x8", 0x16, len::GRAPHIRE, 16704, 12064, 511, 63, Family::Graphire(Graphire4)),
    pen("Wacom BambooFun 4x5", 0x17, len::BBFUN, 14760, 9225, 511, 63, Family::Graphire(BambooFun)),
    pen("Wacom BambooFun 6x8", 0x18, len::BBFUN, 21648, 13530, 511, 63, Family::Graphire(BambooFun)),
    graphire("Wacom Bamboo1 Medium", 0x19, 16704, 12064, 511),
    graphire("Wacom Volito", 0x60, 5104, 3712, 511),
    graphire("Wacom PenStation2", 0x61, 3250, 2320, 255),
    graphire("Wacom Volito2 4x5", 0x62, 5104, 3712, 511),
    graphire("Wacom Volito2 2x3", 0x63, 3248, 2320, 511),
    graphire("Wacom PenPartner2", 0x64, 3250, 2320, 511),
    pen("Wacom Bamboo", 0x65, len::BBFUN, 14760, 9225, 511, 63, Family::Graphire(BambooFun)),
    graphire("Wacom Bamboo1", 0x69, 5104, 3712, 511),
    graphire("Wacom Bamboo1 4x6", 0x6A, 14760, 9225, 1023),
    graphire("Wacom Bamboo1 5x8", 0x6B, 21648, 13530, 1023),
    bamboo("Wacom BambooFun 2FG 4x5", 0xD1, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom Bamboo Pen 4x5", 0xD4, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom Bamboo Craft", 0xD2, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom BambooFun 2FG 6x8", 0xD3, len::BBFUN, 21648, 13700, 63, BambooPt),
    bamboo("Wacom Bamboo 2FG", 0xD0, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom Bamboo Pen 6x8", 0xD5, len::BBFUN, 21648, 13700, 63, BambooPt),
    bamboo("Wacom BambooPT 2FG 4x5", 0xD6, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom BambooPT 2FG Small", 0xD7, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom Bamboo Comic 2FG", 0xD8, len::BBFUN, 21648, 13700, 63, BambooPt),
    bamboo("Wacom Bamboo 2FG 4x5 SE", 0xDA, len::BBFUN, 14720, 9200, 63, BambooPt),
    bamboo("Wacom Bamboo 2FG 6x8 SE", 0xDB, len::BBFUN, 21648, 13700, 63, BambooPt),
    bamboo("Wacom Bamboo Connect", 0xDD, len::BBPEN, 14720, 9200, 31, BambooPt),
    bamboo("Wacom Bamboo 16FG 4x5", 0xDE, len::BBPEN, 14720, 9200, 31, BambooPt),
    bamboo("Wacom Bamboo 16FG 6x8", 0xDF, len::BBPEN, 21648, 13700, 31, BambooPt),
    bamboo("Wacom Bamboo One S", 0x300, len::BBPEN, 14720, 9225, 31, BambooPt),
    bamboo("Wacom Bamboo One M", 0x301, len::BBPEN, 21648, 13530, 31, BambooPt),
    bamboo("Wacom Intuos PT S", 0x302, len::BBPEN, 15200, 9500, 31, IntuosHt),
    bamboo("Wacom Intuos PT M", 0x303, len::BBPEN, 21600, 13500, 31, IntuosHt),
    bamboo("Wacom Intuos S", 0x30E, len::BBPEN, 15200, 9500, 31, IntuosHt),
    bamboo("Wacom Intuos P M", 0x323, len::BBPEN, 21600, 13500, 31, IntuosHt),
    pen("Wacom Intuos S 2", 0x33B, len::INTUOS, 15200, 9500, 2047, 63, Family::Bamboo(IntuosHt2)),
    pen("Wacom Intuos PT S 2", 0x33C, len::INTUOS, 15200, 9500, 2047, 63, Family::Bamboo(IntuosHt2)),
    pen("Wacom Intuos P M 2", 0x33D, len::INTUOS, 21600, 13500, 2047, 63, Family::Bamboo(IntuosHt2)),
    pen("Wacom Intuos PT M 2", 0x33E, len::INTUOS, 21600, 13500, 2047, 63, Family::Bamboo(IntuosHt2)),
    intuos("Wacom Intuos 4x5", 0x20, 12700, 10600, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos 6x8", 0x21, 20320, 16240, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos 9x12", 0x22, 30480, 24060, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos 12x12", 0x23, 30480, 31680, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos 12x18", 0x24, 45720, 31680, 1023, 31, Intuos, 0),
    pl("Wacom PL400", 0x30, 5408, 4056, 255),
    pl("Wacom PL500", 0x31, 6144, 4608, 255),
    pl("Wacom PL600", 0x32, 6126, 4604, 255),
    pl("Wacom PL600SX", 0x33, 6260, 5016, 255),
    pl("Wacom PL550", 0x34, 6144, 4608, 511),
    pl("Wacom PL800", 0x35, 7220, 5780, 511),
    pl("Wacom PL700", 0x37, 6758, 5406, 511),
    pl("Wacom PL510", 0x38, 6282, 4762, 511),
    pl("Wacom DTU710", 0x39, 34080, 27660, 511),
    pl("Wacom DTF521", 0xC4, 6282, 4762, 511),
    pl("Wacom DTF720", 0xC0, 6858, 5506, 511),
    pl("Wacom DTF720a", 0xC2, 6858, 5506, 511),
    pen("Wacom Cintiq Partner", 0x03, len::GRAPHIRE, 20480, 15360, 511, 0, Family::Ptu),
    intuos("Wacom Intuos2 4x5", 0x41, 12700, 10600, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos2 6x8", 0x42, 20320, 16240, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos2 9x12", 0x43, 30480, 24060, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos2 12x12", 0x44, 30480, 31680, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos2 12x18", 0x45, 45720, 31680, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos2 6x8", 0x47, 20320, 16240, 1023, 31, Intuos, 0),
    intuos("Wacom Intuos3 4x5", 0xB0, 25400, 20320, 1023, 63, Intuos3S, 4),
    intuos("Wacom Intuos3 6x8", 0xB1, 40640, 30480, 1023, 63, Intuos3, 8),
    intuos("Wacom Intuos3 9x12", 0xB2, 60960, 45720, 1023, 63, Intuos3, 8),
    intuos("Wacom Intuos3 12x12", 0xB3, 60960, 60960, 1023, 63, Intuos3L, 8),
    intuos("Wacom Intuos3 12x19", 0xB4, 97536, 60960, 1023, 63, Intuos3L, 8),
    intuos("Wacom Intuos3 6x11", 0xB5, 54204, 31750, 1023, 63, Intuos3, 8),
    intuos("Wacom Intuos3 4x6", 0xB7, 31496, 19685, 1023, 63, Intuos3S, 4),
    intuos("Wacom Intuos4 4x6", 0xB8, 31496, 19685, 2047, 63, Intuos4S, 7),
    intuos("Wacom Intuos4 6x9", 0xB9, 44704, 27940, 2047, 63, Intuos4, 9),
    intuos("Wacom Intuos4 8x13", 0xBA, 65024, 40640, 2047, 63, Intuos4L, 9),
    intuos("Wacom Intuos4 12x19", 0xBB, 97536, 60960, 2047, 63, Intuos4L, 9),
    intuos("Wacom Intuos4 WL", 0xBC, 40640, 25400, 2047, 63, Intuos4, 9),
    intuos("Wacom Intuos5 touch S", 0x26, 31496, 19685, 2047, 63, Intuos5S, 7),
    intuos("Wacom Intuos5 touch M", 0x27, 44704, 27940, 2047, 63, Intuos5, 9),
    intuos("Wacom Intuos5 touch L", 0x28, 65024, 40640, 2047, 63, Intuos5L, 9),
    intuos("Wacom Intuos5 S", 0x29, 31496, 19685, 2047, 63, Intuos5S, 7),
    intuos("Wacom Intuos5 M", 0x2A, 44704, 27940, 2047, 63, Intuos5, 9),
    intuos("Wacom Intuos Pro S", 0x314, 31496, 19685, 2047, 63, IntuosProS, 7),
    intuos("Wacom Intuos Pro M", 0x315, 44704, 27940, 2047, 63, IntuosProM, 9),
    intuos("Wacom Intuos Pro L", 0x317, 65024, 40640, 2047, 63, IntuosProL, 9),
    cintiq("Wacom Cintiq 24HD", 0xF4, 104080, 65200, 2047, Cintiq24Hd, 16),
    cintiq("Wacom Cintiq 24HD touch", 0xF8, 104080, 65200, 2047, Cintiq24Hd, 16),
    cintiq("Wacom Cintiq 27QHD", 0x32A, 119740, 67520, 2047, Cintiq27Qhd, 0),
    cintiq("Wacom Cintiq 27QHD touch", 0x32B, 119740, 67520, 2047, Cintiq27Qhd, 0),
    intuos("Wacom Cintiq 21UX", 0x3F, 87200, 65600, 1023, 63, Cintiq, 8),
    intuos("Wacom Cintiq 20WSX", 0xC5, 86680, 54180, 1023, 63, CintiqBee, 10),
    intuos("Wacom Cintiq 12WX", 0xC6, 53020, 33440, 1023, 63, CintiqBee, 10),
    cintiq("Wacom Cintiq 13HD", 0x304, 59152, 33448, 1023, Cintiq13Hd, 9),
    cintiq("Wacom Cintiq 13HD touch", 0x333, 59152, 33448, 2047, Cintiq13Hd, 9),
    pl("Wacom DTU1931", 0xC7, 37832, 30305, 511),
    pen("Wacom DTU2231", 0xCE, len::GRAPHIRE, 47864, 27011, 511, 0, Family::Dtu),
    pen("Wacom DTU1631", 0xF0, len::GRAPHIRE, 34623, 19553, 511, 0, Family::Dtu),
    dtus("Wacom DTU1031", 0xFB, 21896, 13760, 511, 4),
    pen("Wacom DTU1031X", 0x32F, len::DTUS, 22472, 12728, 511, 0, Family::Dtus { pad: false })
        .offset(DTU_OFFSET),
    dtus("Wacom DTU1141", 0x336, 23472, 13203, 1023, 6),
    dtus("Wacom DTK1651", 0x343, 34616, 19559, 1023, 4),
    cintiq("Wacom DTK2241", 0x57, 95640, 54060, 2047, Dtk, 6),
    cintiq("Wacom DTH2242", 0x59, 95640, 54060, 2047, Dtk, 6),
    cintiq("Wacom Cintiq 21UX2", 0xCC, 86800, 65200, 2047, Cintiq21Ux2, 18),
    cintiq("Wacom Cintiq 22HD", 0xFA, 95440, 53860, 2047, Cintiq22Hd, 18),
    cintiq("Wacom Cintiq 22HDT", 0x5B, 95440, 53860, 2047, Cintiq22Hd, 18),
    tpc("Wacom ISDv4 90", 0x90, 26202, 16325, 255),
    tpc("Wacom ISDv4 93", 0x93, 26202, 16325, 255),
    tpc("Wacom ISDv4 97", 0x97, 26202, 16325, 511),
    tpc("Wacom ISDv4 9A", 0x9A, 26202, 16325, 255),
    tpc("Wacom ISDv4 9F", 0x9F, 26202, 16325, 255),
    pen("Wacom ISDv4 E2", 0xE2, len::TPC2FG, 26202, 16325, 255, 0, Family::TabletPc(TwoFinger)),
    pen("Wacom ISDv4 E3", 0xE3, len::TPC2FG, 26202, 16325, 255, 0, Family::TabletPc(TwoFinger)),
    pen("Wacom ISDv4 E6", 0xE6, len::TPC2FG, 27760, 15694, 255, 0, Family::TabletPc(TwoFinger)),
    mttpc("Wacom ISDv4 100", 0x100, 26202, 16325, 255, MultiTouch),
    mttpc("Wacom ISDv4 101", 0x101, 26202, 16325, 255, MultiTouch),
    mttpc("Wacom ISDv4 10D", 0x10D, 26202, 16325, 255, MultiTouch),
    mttpc("Wacom ISDv4 10F", 0x10F, 27760, 15694, 255, MultiTouch),
    tpc("Wacom ISDv4 116", 0x116, 26202, 16325, 255),
    tpc("Wacom ISDv4 12C", 0x12C, 27848, 15752, 2047),
    mttpc("Wacom ISDv4 4001", 0x4001, 26202, 16325, 255, MultiTouch),
    mttpc("Wacom ISDv4 4004", 0x4004, 11060, 6220, 255, MultiTouchB),
    mttpc("Wacom ISDv4 5000", 0x5000, 27848, 15752, 255, MultiTouchB),
    mttpc("Wacom ISDv4 5002", 0x5002, 29576, 16724, 1023, MultiTouchB),
    mttpc("Wacom ISDv4 5010", 0x5010, 13756, 7736, 1023, MultiTouchB),
    mttpc("Wacom ISDv4 5013", 0x5013, 11752, 6612, 1023, MultiTouchB),
    mttpc("Wacom ISDv4 5044", 0x5044, 27648, 15552, 2047, MultiTouchC),
    mttpc("Wacom ISDv4 5048", 0x5048, 27648, 15552, 2047, MultiTouchC),
    mttpc("Wacom ISDv4 5090", 0x5090, 27648, 15552, 2047, MultiTouchC),
    tpc("ISD-V4", 0x6004, 12800, 8000, 255).vendor(LENOVO_VID),
    mspro_touch("Wacom MobileStudio Pro 13 Touch", 0x34A),
    mspro_touch("Wacom MobileStudio Pro 16 Touch", 0x34B),
    mspro("Wacom MobileStudio Pro 13", 0x34D, 59552, 33848, 11),
    mspro("Wacom MobileStudio Pro 16", 0x34E, 69920, 39680, 13),
    mspro("Wacom Cintiq Pro 13FHD", 0x34F, 59552, 33848, 0),
    mspro("Wacom Cintiq Pro 16UHD", 0x350, 69920, 39680, 0),
    mspro_touch("Wacom Cintiq Pro 13FHD Touch", 0x353),
    mspro_touch("Wacom Cintiq Pro 16UHD Touch", 0x354),
    pen("Wacom Intuos Pro M", 0x357, len::INTUOSP2, 44800, 29600, 8191, 63, Family::IntuosPro2).buttons(9),
    pen("Wacom Intuos Pro L", 0x358, len::INTUOSP2, 62200, 43200, 8191, 63, Family::IntuosPro2).buttons(9),
    pen("Wacom DTH-1152", 0x35A, len::DTH1152, 22320, 12555, 1024, 0, Family::Dth1152),
    ProfileEntry::touch(
        "Wacom DTH-1152 Touch",
        0x368,
        len::QHDT27,
        Family::TouchStream(TouchStreamModel::Dth1152),
    ),
];

/// Find the table entry for a vendor/product pair.
pub fn lookup(vendor: u16, product: u16) -> Option<&'static ProfileEntry> {
    PROFILES
        .iter()
        .find(|e| e.vendor == vendor && e.product == product)
}

/// Like [`lookup`], but an unknown pair is an attach-time error.
pub fn require(vendor: u16, product: u16) -> Result<&'static ProfileEntry> {
    lookup(vendor, product).ok_or(Error::UnsupportedDevice { vendor, product })
}

/// Whether any table entry carries this vendor id.
pub fn is_supported_vendor(vendor: u16) -> bool {
    PROFILES.iter().any(|e| e.vendor == vendor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;
    use crate::WACOM_VID;
    use std::collections::HashSet;

    #[test]
    fn lookup_known_products() {
        let e = lookup(WACOM_VID, 0x15).expect("graphire4");
        assert_eq!(e.name, "Wacom Graphire4 4x5");
        assert_eq!(e.family, Family::Graphire(Graphire4));
        assert_eq!(e.pkglen, len::GRAPHIRE);

        let e = lookup(LENOVO_VID, 0x6004).expect("lenovo isd-v4");
        assert_eq!(e.family, Family::TabletPc(TabletPc));
    }

    #[test]
    fn unknown_product_is_unsupported() {
        assert!(lookup(WACOM_VID, 0xFFFF).is_none());
        assert!(lookup(0x1234, 0x15).is_none());
        match require(0x1234, 0x15) {
            Err(Error::UnsupportedDevice { vendor, product }) => {
                assert_eq!(vendor, 0x1234);
                assert_eq!(product, 0x15);
            }
            other => panic!("expected UnsupportedDevice, got {other:?}"),
        }
    }

    #[test]
    fn no_duplicate_identities() {
        let mut seen = HashSet::new();
        for e in PROFILES {
            assert!(
                seen.insert((e.vendor, e.product)),
                "duplicate entry for {:04X}:{:04X}",
                e.vendor,
                e.product
            );
        }
    }

    #[test]
    fn offsets_and_buttons() {
        let e = lookup(WACOM_VID, 0xCC).expect("21ux2");
        assert_eq!(e.offset, 400);
        assert_eq!(e.numbered_buttons, 18);

        let e = lookup(WACOM_VID, 0xFB).expect("dtu1031");
        assert_eq!(e.offset, 200);
        assert_eq!(e.family, Family::Dtus { pad: true });

        let e = lookup(WACOM_VID, 0x32F).expect("dtu1031x");
        assert_eq!(e.family, Family::Dtus { pad: false });
    }

    #[test]
    fn touch_only_entries_are_fixed_channels() {
        for pid in [0x34A, 0x34B, 0x353, 0x354, 0x368] {
            let e = lookup(WACOM_VID, pid).expect("touch entry");
            assert_eq!(e.device_type, Some(DeviceType::TripleTap));
            assert_eq!(e.x_max, 0);
        }
    }

    #[test]
    fn supported_vendors() {
        assert!(is_supported_vendor(WACOM_VID));
        assert!(is_supported_vendor(LENOVO_VID));
        assert!(!is_supported_vendor(0x046D));
    }
}
