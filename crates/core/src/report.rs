//! Raw report access: report IDs, packet lengths, and bounds-safe field reads.
//!
//! Every decoder reads its fields through [`Report`]. Reads past the end of
//! the buffer yield zero instead of panicking, so a short report degrades to
//! "nothing interesting in it" rather than aborting the device session.

/// Leading report-type bytes.
pub mod ids {
    pub const PENABLED: u8 = 2;
    pub const INTUOS_ID1: u8 = 5;
    pub const INTUOS_ID2: u8 = 6;
    pub const INTUOSPAD: u8 = 12;
    pub const INTUOS5PAD: u8 = 3;
    pub const DTUSPAD: u8 = 21;
    pub const TPC1FG: u8 = 6;
    pub const TPC2FG: u8 = 13;
    pub const CINTIQ: u8 = 16;
    pub const INTUOS_PEN: u8 = 16;
    pub const CINTIQPAD: u8 = 17;
    pub const DTUS: u8 = 17;
    pub const MSPRO: u8 = 16;
    pub const MSPROPAD: u8 = 17;
    pub const MSPRODEVICE: u8 = 19;
    pub const VENDOR_DEF_TOUCH: u8 = 33;
    /// Bamboo touch reports.
    pub const BBTOUCH: u8 = 2;
}

/// Fixed packet lengths, used both as profile report lengths and as the
/// length discriminant for families that share one endpoint.
pub mod len {
    pub const PENPRTN: usize = 7;
    pub const GRAPHIRE: usize = 8;
    pub const BBFUN: usize = 9;
    pub const INTUOS: usize = 10;
    pub const TPC1FG: usize = 5;
    pub const TPC1FG_B: usize = 10;
    pub const TPC2FG: usize = 14;
    pub const BBTOUCH: usize = 20;
    pub const BBTOUCH3: usize = 64;
    pub const BBPEN: usize = 10;
    pub const MTTPC: usize = 40;
    pub const DTUS: usize = 68;
    pub const PENABLED: usize = 8;
    pub const QHDT27: usize = 64;
    pub const MSPRO: usize = 64;
    pub const MSPROT: usize = 50;
    pub const INTUOSP2: usize = 64;
    pub const INTUOSP2T: usize = 44;
    pub const DTH1152: usize = 12;
}

/// One received report, borrowed for the duration of a decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report<'a> {
    data: &'a [u8],
}

impl<'a> Report<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Report length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Leading report-type byte.
    pub fn id(&self) -> u8 {
        self.byte(0)
    }

    /// Raw bytes.
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Byte at `offset`, or 0 past the end.
    pub fn byte(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    /// Whether any bit of `mask` is set in byte `offset`.
    pub fn bit(&self, offset: usize, mask: u8) -> bool {
        self.byte(offset) & mask != 0
    }

    pub fn le16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.byte(offset), self.byte(offset + 1)])
    }

    pub fn be16(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.byte(offset), self.byte(offset + 1)])
    }

    pub fn le32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.byte(offset),
            self.byte(offset + 1),
            self.byte(offset + 2),
            self.byte(offset + 3),
        ])
    }

    pub fn le64(&self, offset: usize) -> u64 {
        let mut raw = [0u8; 8];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = self.byte(offset + i);
        }
        u64::from_le_bytes(raw)
    }

    /// A sub-report starting at `offset`, used for fixed-size contact and
    /// button messages packed into one report.
    pub fn slice_from(&self, offset: usize) -> Report<'a> {
        Report {
            data: self.data.get(offset..).unwrap_or(&[]),
        }
    }
}

/// Format report bytes for trace logging.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_and_big_endian_fields() {
        let data = [0x02, 0x64, 0x00, 0xC8, 0x00, 0x12, 0x34];
        let report = Report::new(&data);
        assert_eq!(report.id(), ids::PENABLED);
        assert_eq!(report.le16(1), 100);
        assert_eq!(report.le16(3), 200);
        assert_eq!(report.be16(5), 0x1234);
    }

    #[test]
    fn reads_past_end_are_zero() {
        let data = [0xFF, 0xFF];
        let report = Report::new(&data);
        assert_eq!(report.byte(5), 0);
        assert_eq!(report.le16(1), 0x00FF);
        assert_eq!(report.le32(0), 0x0000_FFFF);
        assert_eq!(report.le64(10), 0);
    }

    #[test]
    fn wide_fields() {
        let data = [0x10, 0x78, 0x56, 0x34, 0x12, 1, 2, 3, 4, 5, 6, 7, 8];
        let report = Report::new(&data);
        assert_eq!(report.le32(1), 0x1234_5678);
        assert_eq!(report.le64(5), 0x0807_0605_0403_0201);
    }

    #[test]
    fn slice_from_offsets_reads() {
        let data = [0x00, 0x00, 0xAA, 0xBB];
        let sub = Report::new(&data).slice_from(2);
        assert_eq!(sub.byte(0), 0xAA);
        assert_eq!(sub.len(), 2);
        assert!(Report::new(&data).slice_from(9).is_empty());
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(hex(&[0x02, 0xA0, 0x0F]), "02 A0 0F");
    }
}
