//! Integration tests: drive whole tablets through the dispatcher.
//!
//! These tests attach real table profiles, feed report sequences through
//! [`Tablet`] and [`Channel`], and check the committed frames, the decoder
//! state and the capability checks together.
//!
//! [`Tablet`]: crate::dispatch::Tablet
//! [`Channel`]: crate::dispatch::Channel

#[cfg(test)]
mod tests {
    use crate::decoder::DecodeResult;
    use crate::device::{DeviceProfile, DeviceType, InterfaceInfo};
    use crate::dispatch::{self, Channel, ChannelKind, Tablet};
    use crate::event::{Axis, EventRecorder, Frame, Key};
    use crate::report::{ids, len};
    use crate::state::{tool_id, DecoderState, SharedState, RING_UNTOUCHED};
    use crate::table;
    use proptest::prelude::*;

    fn attach(product: u16, iface: InterfaceInfo) -> DeviceProfile {
        let entry = table::lookup(crate::WACOM_VID, product).expect("table entry");
        DeviceProfile::attach(entry, iface)
    }

    fn pen(product: u16) -> DeviceProfile {
        attach(product, InterfaceInfo::pen())
    }

    /// One channel of every family and the interesting sub-variants.
    fn channels() -> Vec<DeviceProfile> {
        vec![
            pen(0x00),
            pen(0x10),
            pen(0x15),
            pen(0x17),
            pen(0x34),
            pen(0x03),
            pen(0xCE),
            pen(0xFB),
            pen(0x32F),
            pen(0x35A),
            attach(0x368, InterfaceInfo::default()),
            pen(0x20),
            pen(0xB1),
            pen(0xB9),
            pen(0xCC),
            pen(0xFA),
            pen(0x26),
            attach(0x26, InterfaceInfo::default().with_packet_size(len::BBTOUCH3)),
            pen(0xD4),
            attach(0xD6, InterfaceInfo::default().with_packet_size(len::BBTOUCH)),
            attach(0x302, InterfaceInfo::default().with_packet_size(len::BBTOUCH3)),
            pen(0x33B),
            pen(0x90),
            attach(0x90, InterfaceInfo::touch(DeviceType::Finger)),
            pen(0xE3),
            attach(0xE3, InterfaceInfo::touch(DeviceType::DoubleTap)),
            pen(0x100),
            attach(0x100, InterfaceInfo::touch(DeviceType::DoubleTap)),
            pen(0x34D),
            pen(0x34E),
            pen(0x34F),
            attach(0x34A, InterfaceInfo::default()),
            pen(0x357),
            attach(0x357, InterfaceInfo::default().with_packet_size(len::INTUOSP2T)),
        ]
    }

    /// Leading bytes the decoders dispatch on.
    const REPORT_IDS: [u8; 12] = [2, 3, 5, 6, 12, 13, 16, 17, 19, 21, 33, 0];

    fn report_strategy() -> impl Strategy<Value = (bool, u8, Vec<u8>)> {
        (
            any::<bool>(),
            proptest::sample::select(REPORT_IDS.to_vec()),
            proptest::collection::vec(any::<u8>(), len::DTUS),
        )
    }

    /// Shape a random report for `profile`: endpoint-sized, and half the
    /// time carrying a report id the decoders know.
    fn shape(profile: &DeviceProfile, (use_id, id, mut data): (bool, u8, Vec<u8>)) -> Vec<u8> {
        data.truncate(profile.pkglen.max(1));
        if use_id {
            data[0] = id;
        }
        data
    }

    fn frames_of(profile: &DeviceProfile, reports: &[Vec<u8>]) -> (Vec<Frame>, DecoderState) {
        let mut state = DecoderState::standalone(profile);
        let mut rec = EventRecorder::new();
        for data in reports {
            dispatch::decode(profile, &mut state, data, &mut rec);
        }
        (rec.frames().to_vec(), state)
    }

    /// After a tool leaves, every per-tool value it reported is neutral.
    fn assert_released(frame: &Frame, distance_max: i32) {
        for key in [Key::Touch, Key::Stylus, Key::Stylus2] {
            assert_ne!(frame.key(key), Some(true), "{key:?} still down in {frame}");
        }
        for axis in [Axis::Pressure, Axis::TiltX, Axis::TiltY] {
            assert!(matches!(frame.abs(axis), None | Some(0)), "{axis:?} not reset in {frame}");
        }
        if let Some(d) = frame.abs(Axis::Distance) {
            assert!(d == 0 || d == distance_max, "distance {d} not neutral in {frame}");
        }
    }

    #[test]
    fn rubber_selector_on_mouse_pen_combo() {
        let profile = pen(0x10);
        let mut state = DecoderState::standalone(&profile);
        let mut rec = EventRecorder::new();
        let report = [ids::PENABLED, 0xA0, 100, 0, 200, 0, 0, 0];
        assert_eq!(dispatch::decode(&profile, &mut state, &report, &mut rec), DecodeResult::Commit);
        let f = rec.last_frame().expect("frame");
        assert_eq!(f.key(Key::ToolRubber), Some(true));
        assert_eq!(f.abs(Axis::X), Some(100));
        assert_eq!(f.abs(Axis::Y), Some(200));
        assert_eq!(f.abs(Axis::Misc), Some(tool_id::ERASER as i32));
    }

    #[test]
    fn oversized_contact_count_lifts_every_slot() {
        let mut tablet = Tablet::new(pen(0x100), Some(attach(0x100, InterfaceInfo::touch(DeviceType::DoubleTap))));
        let mut rec = EventRecorder::new();

        let mt = |count: u8, contacts: &[(u16, u16, u16)]| {
            let mut data = vec![0u8; len::MTTPC];
            data[0] = ids::TPC2FG;
            data[2] = count;
            for (i, &(id, x, y)) in contacts.iter().enumerate() {
                let off = 7 * i + 3;
                data[off] = 0x01;
                data[off + 1..off + 3].copy_from_slice(&id.to_le_bytes());
                data[off + 3..off + 5].copy_from_slice(&x.to_le_bytes());
                data[off + 5..off + 7].copy_from_slice(&y.to_le_bytes());
            }
            data
        };

        tablet.decode(ChannelKind::Touch, &mt(2, &[(5, 10, 10), (6, 20, 20)]), &mut rec);
        let touch = tablet.channel(ChannelKind::Touch).expect("touch channel");
        assert_eq!(touch.state().slots.active(), 2);
        let before = rec.frames().len();

        let result = tablet.decode(ChannelKind::Touch, &mt(3, &[(5, 10, 10), (6, 20, 20), (7, 30, 30)]), &mut rec);
        assert_eq!(result, DecodeResult::Commit);
        let lifted = &rec.frames()[before..];
        assert_eq!(lifted.len(), 2);
        assert!(lifted.iter().all(|f| f.abs(Axis::MtTrackingId) == Some(-1)));
        assert_eq!(lifted[0].key(Key::Touch), Some(false));

        let touch = tablet.channel_mut(ChannelKind::Touch).expect("touch channel");
        assert!(touch.state().slots.is_empty());
        assert!(!touch.state().shared.touch_down());
        assert!(touch.take_violations().iter().all(|v| !v.is_undeclared()));
    }

    #[test]
    fn untouched_ring_emits_once_then_stays_quiet() {
        let mut channel = Channel::new(pen(0x357), SharedState::new());
        let mut rec = EventRecorder::new();
        let pad = |b1: u8, ring: u16| {
            let mut data = vec![0u8; len::INTUOSP2];
            data[0] = ids::MSPROPAD;
            data[1] = b1;
            data[4..6].copy_from_slice(&ring.to_le_bytes());
            data
        };

        assert_eq!(channel.decode(&pad(0, 0x80 | 5), &mut rec), DecodeResult::Commit);
        assert_eq!(channel.decode(&pad(0, RING_UNTOUCHED), &mut rec), DecodeResult::Commit);
        let release = rec.last_frame().expect("release frame");
        assert_eq!(release.key(Key::ToolFinger), Some(false));
        assert_eq!(release.abs(Axis::Misc), Some(0));
        assert!(release.serial().is_some());

        let count = rec.frames().len();
        assert_eq!(channel.decode(&pad(0, RING_UNTOUCHED), &mut rec), DecodeResult::Ignored);
        assert_eq!(rec.frames().len(), count);
        assert!(rec.pending().is_empty());
    }

    #[test]
    fn exit_releases_everything_for_every_pen_family() {
        let enter_pen_intuos = [2, 0xC0, 0x80, 0x21, 0x23, 0x45, 0x67, 0x80, 0x00, 0x00];
        let mut mspro_in = vec![0u8; len::MSPRO];
        mspro_in[0] = ids::MSPRO;
        mspro_in[1] = 0x67;
        mspro_in[8] = 0x40;
        mspro_in[10] = 20;
        mspro_in[25] = 0x02;
        mspro_in[26] = 0x08;
        let mut mspro_out = mspro_in.clone();
        mspro_out[1] = 0x00;

        let sessions: Vec<(u16, Vec<Vec<u8>>)> = vec![
            (0x10, vec![vec![2, 0x87, 1, 0, 1, 0, 0x40, 0], vec![2, 0, 0, 0, 0, 0, 0, 0]]),
            (0xCE, vec![vec![2, 0x37, 1, 0, 1, 0, 0x40, 0], vec![2, 0, 0, 0, 0, 0, 0, 0]]),
            (0x90, vec![vec![2, 0x37, 1, 0, 1, 0, 0x40, 0], vec![2, 0, 0, 0, 0, 0, 0, 0]]),
            (0xD4, vec![vec![2, 0x27, 1, 0, 1, 0, 0x40, 0, 10], vec![2, 0, 0, 0, 0, 0, 0, 0, 0]]),
            (
                0xB9,
                vec![
                    enter_pen_intuos.to_vec(),
                    vec![2, 0xE6, 0x10, 0x00, 0x08, 0x00, 0x40, 0x00, 0x00, 0x0A],
                    vec![2, 0x80, 0, 0, 0, 0, 0, 0, 0, 0],
                ],
            ),
            (0x34D, vec![mspro_in, mspro_out]),
        ];

        for (product, reports) in sessions {
            let mut channel = Channel::new(pen(product), SharedState::new());
            let mut rec = EventRecorder::new();
            for data in &reports {
                channel.decode(data, &mut rec);
            }
            let last = rec.last_frame().unwrap_or_else(|| panic!("no frames for 0x{product:X}"));
            assert_released(last, channel.profile().distance_max);
            assert!(
                channel.take_violations().iter().all(|v| !v.is_undeclared()),
                "undeclared events for 0x{product:X}"
            );
        }
    }

    #[test]
    fn finger_on_the_surface_holds_back_the_pen() {
        let mut tablet = Tablet::new(pen(0xE3), Some(attach(0xE3, InterfaceInfo::touch(DeviceType::DoubleTap))));
        let mut rec = EventRecorder::new();
        let finger = [ids::TPC2FG, 0x01, 0x10, 0x00, 0, 0, 0x30, 0x00, 0, 0, 0, 0, 0, 0];
        tablet.decode(ChannelKind::Touch, &finger, &mut rec);
        let count = rec.frames().len();

        let result = tablet.decode(ChannelKind::Pen, &[2, 0x21, 1, 0, 1, 0, 0x40, 0], &mut rec);
        assert_eq!(result, DecodeResult::StateOnly);
        assert_eq!(rec.frames().len(), count);

        // The pen is now near: the next touch report lifts the finger.
        tablet.decode(ChannelKind::Touch, &finger, &mut rec);
        assert_eq!(rec.last_frame().and_then(|f| f.key(Key::Touch)), Some(false));
    }

    #[test]
    fn intuos5_touch_blocks_pen_data() {
        let touch = attach(0x26, InterfaceInfo::default().with_packet_size(len::BBTOUCH3));
        let mut tablet = Tablet::new(pen(0x26), Some(touch));
        let mut rec = EventRecorder::new();

        let mut contact = vec![0u8; len::BBTOUCH3];
        contact[0] = ids::BBTOUCH;
        contact[1] = 1;
        contact[2] = 2;
        contact[3] = 0x80;
        tablet.decode(ChannelKind::Touch, &contact, &mut rec);
        let count = rec.frames().len();

        tablet.decode(ChannelKind::Pen, &[2, 0xC0, 0x80, 0x21, 0x23, 0x45, 0x67, 0x80, 0x00, 0x00], &mut rec);
        let data = [2, 0xE0, 0x10, 0x00, 0x08, 0x00, 0x40, 0x00, 0x00, 0x0A];
        assert_eq!(tablet.decode(ChannelKind::Pen, &data, &mut rec), DecodeResult::StateOnly);
        assert_eq!(rec.frames().len(), count);
    }

    #[test]
    fn every_listed_channel_declares_what_it_needs() {
        for profile in channels() {
            let caps = crate::capability::declare(&profile);
            assert!(caps.has_key(Key::Touch), "{} lacks BTN_TOUCH", profile.name);
            assert!(caps.abs_info(Axis::X).is_some(), "{} lacks ABS_X", profile.name);
        }
    }

    proptest! {
        #[test]
        fn decoding_is_deterministic(
            idx in 0usize..34,
            raw in proptest::collection::vec(report_strategy(), 0..24),
        ) {
            let profiles = channels();
            let profile = &profiles[idx % profiles.len()];
            let reports: Vec<Vec<u8>> = raw.into_iter().map(|r| shape(profile, r)).collect();
            let (frames_a, state_a) = frames_of(profile, &reports);
            let (frames_b, state_b) = frames_of(profile, &reports);
            prop_assert_eq!(frames_a, frames_b);
            prop_assert_eq!(state_a, state_b);
        }

        #[test]
        fn ignored_reports_leave_no_trace(
            idx in 0usize..34,
            raw in proptest::collection::vec(report_strategy(), 1..24),
        ) {
            let profiles = channels();
            let profile = &profiles[idx % profiles.len()];
            let mut state = DecoderState::standalone(profile);
            for r in raw {
                let data = shape(profile, r);
                let before = state.clone();
                let flags = (state.shared.stylus_in_proximity(), state.shared.touch_down());
                let mut rec = EventRecorder::new();
                let result = dispatch::decode(profile, &mut state, &data, &mut rec);
                if result == DecodeResult::Ignored {
                    prop_assert_eq!(&state, &before);
                    prop_assert_eq!((state.shared.stylus_in_proximity(), state.shared.touch_down()), flags);
                    prop_assert!(rec.frames().is_empty());
                    prop_assert!(rec.pending().is_empty());
                }
            }
        }

        #[test]
        fn decoders_only_emit_declared_events(
            idx in 0usize..34,
            raw in proptest::collection::vec(report_strategy(), 0..24),
        ) {
            let profiles = channels();
            let profile = profiles[idx % profiles.len()].clone();
            let name = profile.name.clone();
            let mut channel = Channel::new(profile, SharedState::new());
            let mut rec = EventRecorder::new();
            for r in raw {
                let data = shape(channel.profile(), r);
                channel.decode(&data, &mut rec);
            }
            let undeclared: Vec<_> = channel
                .take_violations()
                .into_iter()
                .filter(|v| v.is_undeclared())
                .collect();
            prop_assert!(undeclared.is_empty(), "{}: {:?}", name, undeclared);
        }

        #[test]
        fn commits_close_every_frame(
            idx in 0usize..34,
            raw in proptest::collection::vec(report_strategy(), 0..24),
        ) {
            let profiles = channels();
            let profile = &profiles[idx % profiles.len()];
            let mut state = DecoderState::standalone(profile);
            let mut rec = EventRecorder::new();
            for r in raw {
                let data = shape(profile, r);
                let before = rec.frames().len();
                let result = dispatch::decode(profile, &mut state, &data, &mut rec);
                if result == DecodeResult::Commit {
                    prop_assert!(rec.pending().is_empty());
                    prop_assert!(rec.frames().len() > before);
                } else {
                    // Only a Commit result may flush frames.
                    prop_assert_eq!(rec.frames().len(), before);
                }
            }
        }
    }
}
