//! Report captures: recorded interrupt reports as text, one per line.
//!
//! ```text
//! # Intuos4 M, pen enters then lifts
//! 02 C0 80 21 23 45 67 80 00 00
//! pen: 02 E0 10 00 08 00 40 00 00 0A
//! touch: 02 01 02 80 01 23 45 00
//! ```
//!
//! Bytes are hex, separated by whitespace or commas, with an optional `0x`
//! prefix; a run of bytes may also be written without separators. Text
//! after `#` is a comment. A `pen:` or `touch:` prefix names the channel,
//! so reports from both interfaces of one tablet replay against shared
//! state. Unprefixed lines belong to the pen channel.

use crate::dispatch::ChannelKind;
use crate::error::{Error, Result};
use crate::report::hex;
use std::path::Path;

/// One report from a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// 1-based source line.
    pub line: usize,
    pub channel: ChannelKind,
    pub data: Vec<u8>,
}

impl CaptureRecord {
    /// Render back to capture syntax.
    pub fn to_line(&self) -> String {
        let prefix = match self.channel {
            ChannelKind::Pen => "pen",
            ChannelKind::Touch => "touch",
        };
        format!("{prefix}: {}", hex(&self.data))
    }
}

/// Parse capture text.
pub fn parse(text: &str) -> Result<Vec<CaptureRecord>> {
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| parse_line(i + 1, raw).transpose())
        .collect()
}

/// Read and parse a capture file.
pub fn load(path: &Path) -> Result<Vec<CaptureRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Capture {
        line: 0,
        reason: format!("{}: {e}", path.display()),
    })?;
    parse(&text)
}

fn parse_line(line: usize, raw: &str) -> Result<Option<CaptureRecord>> {
    let text = raw.split('#').next().unwrap_or_default().trim();
    if text.is_empty() {
        return Ok(None);
    }

    let (channel, body) = match text.split_once(':') {
        Some((label, rest)) => {
            let channel = match label.trim().to_ascii_lowercase().as_str() {
                "pen" => ChannelKind::Pen,
                "touch" => ChannelKind::Touch,
                other => {
                    return Err(Error::Capture {
                        line,
                        reason: format!("unknown channel '{other}'"),
                    })
                }
            };
            (channel, rest)
        }
        None => (ChannelKind::Pen, text),
    };

    let mut data = Vec::new();
    for token in body.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        if digits.is_empty() || (digits.len() % 2 != 0 && digits.len() != 1) {
            return Err(Error::Capture {
                line,
                reason: format!("odd number of hex digits in '{token}'"),
            });
        }
        if digits.len() == 1 {
            data.push(parse_byte(line, token, digits)?);
            continue;
        }
        for pair in digits.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(pair).map_err(|_| Error::Capture {
                line,
                reason: format!("invalid hex byte in '{token}'"),
            })?;
            data.push(parse_byte(line, token, pair)?);
        }
    }

    if data.is_empty() {
        return Err(Error::Capture {
            line,
            reason: "no report bytes".to_string(),
        });
    }
    Ok(Some(CaptureRecord { line, channel, data }))
}

fn parse_byte(line: usize, token: &str, digits: &str) -> Result<u8> {
    u8::from_str_radix(digits, 16).map_err(|_| Error::Capture {
        line,
        reason: format!("invalid hex byte in '{token}'"),
    })
}
