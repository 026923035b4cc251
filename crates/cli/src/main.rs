//! open-tablet CLI: inspect tablet profiles and decode live or captured
//! reports.

mod hid;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use open_tablet_core::capability;
use open_tablet_core::capture::{self, CaptureRecord};
use open_tablet_core::config::Config;
use open_tablet_core::device::{DeviceProfile, DeviceType, InterfaceInfo};
use open_tablet_core::dispatch::{Channel, ChannelKind, Tablet};
use open_tablet_core::event::{EventRecorder, Frame};
use open_tablet_core::state::SharedState;
use open_tablet_core::table;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(
    name = "open-tablet",
    version,
    about = "Inspect tablet profiles and decode tablet reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected HID interfaces from supported vendors.
    ListDevices,
    /// Print the built-in profile table.
    Profiles {
        /// Print attached pen profiles as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the capabilities a channel declares, as JSON.
    Capabilities {
        #[command(flatten)]
        device: DeviceArgs,
    },
    /// Decode a capture file and print the committed frames.
    Replay {
        /// Capture file: one hex report per line.
        capture: PathBuf,
        #[command(flatten)]
        device: DeviceArgs,
        /// Print one JSON object per frame.
        #[arg(long)]
        json: bool,
    },
    /// Read reports from a connected tablet and print frames as they commit.
    Listen {
        #[command(flatten)]
        device: DeviceArgs,
        /// HID interface number to open.
        #[arg(long)]
        interface: Option<i32>,
        /// Print one JSON object per frame.
        #[arg(long)]
        json: bool,
    },
}

/// Touch channel flavour, as the HID descriptor would report it.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum TouchKind {
    Finger,
    DoubleTap,
    TripleTap,
}

impl From<TouchKind> for DeviceType {
    fn from(kind: TouchKind) -> Self {
        match kind {
            TouchKind::Finger => DeviceType::Finger,
            TouchKind::DoubleTap => DeviceType::DoubleTap,
            TouchKind::TripleTap => DeviceType::TripleTap,
        }
    }
}

#[derive(Args)]
struct DeviceArgs {
    /// USB product id (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_id)]
    product: u16,
    /// USB vendor id (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_id, default_value = "0x056A")]
    vendor: u16,
    /// wMaxPacketSize of the interrupt endpoint.
    #[arg(long)]
    packet_size: Option<usize>,
    /// Treat the interface as a touch channel of this kind.
    #[arg(long, value_enum)]
    touch: Option<TouchKind>,
    /// Contact count from the touch descriptor.
    #[arg(long)]
    touch_max: Option<u8>,
    /// Geometry overrides file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,
}

impl DeviceArgs {
    fn config(&self) -> Result<Option<Config>> {
        self.config
            .as_deref()
            .map(|path| Config::load(path).with_context(|| format!("loading {}", path.display())))
            .transpose()
    }

    /// Attach the profile of one channel.
    fn profile(&self, kind: ChannelKind, config: Option<&Config>) -> Result<DeviceProfile> {
        let entry = table::require(self.vendor, self.product)?;
        let mut iface = match kind {
            ChannelKind::Pen => InterfaceInfo::pen(),
            ChannelKind::Touch => {
                InterfaceInfo::touch(self.touch.map_or(DeviceType::DoubleTap, DeviceType::from))
            }
        };
        // The endpoint size describes the interface named on the command line.
        if let Some(size) = self.packet_size.filter(|_| kind == self.kind()) {
            iface = iface.with_packet_size(size);
        }
        if let Some(n) = self.touch_max {
            iface = iface.with_touch_max(n);
        }
        let mut profile = DeviceProfile::attach(entry, iface);
        if let Some(config) = config {
            config.apply(&mut profile);
        }
        Ok(profile)
    }

    /// The channel selected by `--touch`.
    fn kind(&self) -> ChannelKind {
        if self.touch.is_some() {
            ChannelKind::Touch
        } else {
            ChannelKind::Pen
        }
    }
}

fn parse_id(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid id '{s}': {e}"))
}

fn channel_name(kind: ChannelKind) -> &'static str {
    match kind {
        ChannelKind::Pen => "pen",
        ChannelKind::Touch => "touch",
    }
}

fn print_frame(line: usize, kind: ChannelKind, frame: &Frame, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "line": line,
            "channel": channel_name(kind),
            "events": frame.events,
        });
        println!("{}", serde_json::to_string(&value)?);
    } else {
        println!("{line:>5} {:<5} {frame}", channel_name(kind));
    }
    Ok(())
}

fn report_violations(kind: ChannelKind, channel: &mut Channel) {
    for violation in channel.take_violations() {
        warn!(channel = channel_name(kind), ?violation, "Capability violation");
    }
}

fn replay(capture: PathBuf, device: DeviceArgs, json: bool) -> Result<()> {
    let records: Vec<CaptureRecord> = capture::load(&capture)?;
    let config = device.config()?;
    let config = config.as_ref();

    let has_touch = device.touch.is_some() || records.iter().any(|r| r.channel == ChannelKind::Touch);
    let pen = device.profile(ChannelKind::Pen, config)?;
    let touch = if has_touch {
        Some(device.profile(ChannelKind::Touch, config)?)
    } else {
        None
    };
    let mut tablet = Tablet::new(pen, touch);
    let mut rec = EventRecorder::new();

    // With --touch every unprefixed line belongs to the touch channel.
    let default_touch = device.touch.is_some() && !records.iter().any(|r| r.channel == ChannelKind::Touch);
    for record in &records {
        let kind = if default_touch { ChannelKind::Touch } else { record.channel };
        let result = tablet.decode(kind, &record.data, &mut rec);
        debug!(line = record.line, ?kind, ?result, "Replayed report");
        for frame in rec.take_frames() {
            print_frame(record.line, kind, &frame, json)?;
        }
        if let Some(channel) = tablet.channel_mut(kind) {
            report_violations(kind, channel);
        }
    }
    Ok(())
}

fn listen(device: DeviceArgs, interface: Option<i32>, json: bool) -> Result<()> {
    let config = device.config()?;
    let kind = device.kind();
    let profile = device.profile(kind, config.as_ref())?;
    let reader = hid::ReportReader::open(device.vendor, device.product, interface)?;
    println!("Listening on {} ({} channel), Ctrl-C to stop", profile.name, channel_name(kind));

    let mut channel = Channel::new(profile, SharedState::new());
    let mut rec = EventRecorder::new();
    let mut buf = [0u8; hid::MAX_REPORT_LEN];
    let mut count = 0usize;
    loop {
        let Some(n) = reader.read(&mut buf)? else {
            continue;
        };
        count += 1;
        channel.decode(&buf[..n], &mut rec);
        for frame in rec.take_frames() {
            print_frame(count, kind, &frame, json)?;
        }
        report_violations(kind, &mut channel);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ListDevices => {
            let interfaces = hid::discover()?;
            if interfaces.is_empty() {
                println!("No tablets found.");
                println!("Ensure the tablet is connected and the hidraw nodes are readable.");
            } else {
                for i in &interfaces {
                    let name = i
                        .name
                        .map(str::to_string)
                        .or_else(|| i.product_string.clone())
                        .unwrap_or_else(|| "unknown product".to_string());
                    println!(
                        "{name} (VID: 0x{:04X}, PID: 0x{:04X}, interface: {}, path: {}){}",
                        i.vendor,
                        i.product,
                        i.interface,
                        i.path,
                        if i.name.is_some() { "" } else { " [unsupported]" }
                    );
                }
            }
        }
        Commands::Profiles { json } => {
            if json {
                let profiles: Vec<DeviceProfile> = table::PROFILES
                    .iter()
                    .map(|e| DeviceProfile::attach(e, InterfaceInfo::default()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&profiles)?);
            } else {
                for e in table::PROFILES {
                    println!(
                        "0x{:04X}:0x{:04X}  {:<40} {:?} pkglen={} buttons={}",
                        e.vendor, e.product, e.name, e.family, e.pkglen, e.numbered_buttons
                    );
                }
            }
        }
        Commands::Capabilities { device } => {
            let config = device.config()?;
            let profile = device.profile(device.kind(), config.as_ref())?;
            let caps = capability::declare(&profile);
            let value = serde_json::json!({
                "profile": profile,
                "capabilities": caps,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Replay { capture, device, json } => replay(capture, device, json)?,
        Commands::Listen { device, interface, json } => listen(device, interface, json)?,
    }

    Ok(())
}
