//! Report routing: one entry point for every family, plus the channel and
//! tablet wrappers that own decoder state for an attached device.

use crate::capability::{self, Capabilities, CheckedSink, Violation};
use crate::decoder::{bamboo, graphire, intuos, mspro, multitouch, pen, tabletpc, DecodeResult};
use crate::device::{DeviceProfile, Family};
use crate::event::EventSink;
use crate::report::{hex, ids, Report};
use crate::state::{DecoderState, SharedState};
use tracing::trace;

/// Decode one raw report for the channel described by `profile`.
///
/// The report length is the slice length. When the decoder finishes a
/// frame the sink receives exactly one `commit()` for it.
pub fn decode(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    data: &[u8],
    sink: &mut dyn EventSink,
) -> DecodeResult {
    trace!(len = data.len(), bytes = %hex(data), "Report");
    if data.is_empty() {
        return DecodeResult::Ignored;
    }
    let result = route(profile, state, Report::new(data), sink);
    if result.is_commit() {
        sink.commit();
    }
    result
}

fn route(
    profile: &DeviceProfile,
    state: &mut DecoderState,
    report: Report<'_>,
    sink: &mut dyn EventSink,
) -> DecodeResult {
    match profile.family {
        Family::PenPartner => pen::penpartner(profile, state, report, sink),
        Family::Dtu => pen::dtu(profile, state, report, sink),
        Family::Pl => pen::pl(profile, state, report, sink),
        Family::Ptu => pen::ptu(profile, state, report, sink),
        Family::Dtus { pad } => pen::dtus(profile, state, report, sink, pad),
        Family::Dth1152 => pen::dth1152(profile, state, report, sink),
        Family::Graphire(_) => graphire::decode(profile, state, report, sink),
        Family::Bamboo(_) => bamboo::decode(profile, state, report, sink),
        Family::Intuos(_) if profile.is_touch() => bamboo::touch3(profile, state, report, sink),
        Family::Intuos(_) => intuos::decode(profile, state, report, sink),
        Family::TabletPc(_) => tabletpc::decode(profile, state, report, sink),
        Family::MobileStudioPro => mspro::decode(profile, state, report, sink),
        Family::IntuosPro2 if profile.is_touch() => match report.id() {
            ids::VENDOR_DEF_TOUCH => multitouch::decode(profile, state, report, sink),
            id => {
                trace!(report_id = id, "Intuos Pro touch: unknown report");
                DecodeResult::Ignored
            }
        },
        Family::IntuosPro2 => mspro::decode(profile, state, report, sink),
        Family::TouchStream(_) => multitouch::decode(profile, state, report, sink),
    }
}

/// One logical channel of an attached tablet: its profile, declared
/// capabilities and decoder memory.
#[derive(Debug, Clone)]
pub struct Channel {
    profile: DeviceProfile,
    caps: Capabilities,
    state: DecoderState,
    violations: Vec<Violation>,
}

impl Channel {
    pub fn new(profile: DeviceProfile, shared: SharedState) -> Self {
        let caps = capability::declare(&profile);
        let state = DecoderState::new(&profile, shared);
        Self {
            profile,
            caps,
            state,
            violations: Vec::new(),
        }
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Decode `data`, checking every emission against the declared
    /// capabilities in debug builds.
    pub fn decode(&mut self, data: &[u8], sink: &mut dyn EventSink) -> DecodeResult {
        let mut checked = CheckedSink::new(sink, &self.caps);
        let result = decode(&self.profile, &mut self.state, data, &mut checked);
        self.violations.extend(checked.into_violations());
        result
    }

    /// Capability violations recorded since the last call.
    pub fn take_violations(&mut self) -> Vec<Violation> {
        std::mem::take(&mut self.violations)
    }
}

/// Which channel of a tablet a report arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Pen,
    Touch,
}

/// The sibling channels of one physical tablet. Both see the same shared
/// stylus/touch flags.
#[derive(Debug, Clone)]
pub struct Tablet {
    pen: Channel,
    touch: Option<Channel>,
}

impl Tablet {
    pub fn new(pen: DeviceProfile, touch: Option<DeviceProfile>) -> Self {
        let shared = SharedState::new();
        let touch = touch.map(|profile| Channel::new(profile, shared.clone()));
        Self {
            pen: Channel::new(pen, shared),
            touch,
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        match kind {
            ChannelKind::Pen => Some(&self.pen),
            ChannelKind::Touch => self.touch.as_ref(),
        }
    }

    pub fn channel_mut(&mut self, kind: ChannelKind) -> Option<&mut Channel> {
        match kind {
            ChannelKind::Pen => Some(&mut self.pen),
            ChannelKind::Touch => self.touch.as_mut(),
        }
    }

    /// Decode a report on `kind`. Reports for a channel the tablet does not
    /// have are ignored.
    pub fn decode(&mut self, kind: ChannelKind, data: &[u8], sink: &mut dyn EventSink) -> DecodeResult {
        match self.channel_mut(kind) {
            Some(channel) => channel.decode(data, sink),
            None => {
                trace!(?kind, "No such channel");
                DecodeResult::Ignored
            }
        }
    }
}
