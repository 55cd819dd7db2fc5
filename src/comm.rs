/// Serial NDJSON transport.
///
/// The device streams survey snapshots as newline-delimited JSON and accepts
/// commands on the same line-oriented channel.

use embedded_hal::delay::DelayNs;

use crate::board;
use crate::protocol::{format_mac, DeviceMessage, HostCommand, MacString, MsgBuffer, RawCommand, MAX_MSG_LEN, VERSION};
use crate::radio::{Clock, Radio, RadioError};
use crate::survey::{SurveyController, SurveySnapshot};

/// Serial baud rate
pub const SERIAL_BAUD: u32 = 115200;

// ── Serialization helpers ──────────────────────────────────────────────

/// Serialize a DeviceMessage to JSON bytes and write to the output buffer.
/// Returns the number of bytes written, or None if serialization failed.
pub fn serialize_message(msg: &DeviceMessage, buf: &mut [u8]) -> Option<usize> {
    match serde_json_core::to_slice(msg, buf) {
        Ok(len) => {
            // Append newline for NDJSON
            if len < buf.len() {
                buf[len] = b'\n';
                Some(len + 1)
            } else {
                Some(len)
            }
        }
        Err(_) => None,
    }
}

/// Serialize into a fresh [`MsgBuffer`].
pub fn encode(msg: &DeviceMessage) -> Option<MsgBuffer> {
    let mut buf = MsgBuffer::new();
    buf.resize_default(MAX_MSG_LEN).ok()?;
    let len = serialize_message(msg, &mut buf)?;
    buf.truncate(len);
    Some(buf)
}

/// Deserialize a HostCommand from a JSON byte slice.
pub fn parse_command(data: &[u8]) -> Option<HostCommand> {
    let trimmed = trim_trailing_whitespace(data);
    if trimmed.is_empty() {
        return None;
    }
    let (raw, _) = serde_json_core::from_slice::<RawCommand>(trimmed).ok()?;
    match raw.cmd.as_str() {
        "start" => Some(HostCommand::Start),
        "stop" => Some(HostCommand::Stop),
        "status" => Some(HostCommand::GetStatus),
        "monitor" => raw.channel.map(|channel| HostCommand::Monitor { channel }),
        "step" => Some(HostCommand::StepChannel {
            up: raw.up.unwrap_or(true),
        }),
        _ => None,
    }
}

/// Apply a host command to the controller.
pub fn handle_command<R: Radio, C: Clock, D: DelayNs>(
    cmd: &HostCommand,
    survey: &mut SurveyController<'_, R, C, D>,
) -> Result<(), RadioError> {
    match *cmd {
        HostCommand::Start => survey.start(),
        HostCommand::Stop => {
            survey.stop()?;
            survey.stop_monitor()
        }
        HostCommand::GetStatus => Ok(()),
        HostCommand::Monitor { channel } => survey.start_monitor(channel),
        HostCommand::StepChannel { up } => survey.step_monitor_channel(up).map(|_| ()),
    }
}

/// Emit a status line followed by one line per directory entry.
pub fn emit_snapshot(snap: &SurveySnapshot, uptime_secs: u32, mut sink: impl FnMut(MsgBuffer)) {
    let status = DeviceMessage::Status {
        state: snap.state.as_str(),
        aps: snap.entries.len() as u8,
        disconnects: snap.disconnect_frames_seen,
        flood_ch: snap.flood_channel,
        rejected: snap.rejected,
        uptime: uptime_secs,
        board: board::BOARD_NAME,
        version: VERSION,
    };
    if let Some(buf) = encode(&status) {
        sink(buf);
    }

    for entry in &snap.entries {
        let mut mac = MacString::new();
        format_mac(&entry.bssid, &mut mac);
        let msg = DeviceMessage::AccessPoint {
            mac: &mac,
            ssid: &entry.label,
            rssi: entry.rssi,
            ch: entry.channel,
            live: entry.live,
        };
        if let Some(buf) = encode(&msg) {
            sink(buf);
        }
    }
}

// ── Serial NDJSON reader ───────────────────────────────────────────────

/// Serial NDJSON reader state machine.
/// Accumulates bytes until a newline is found, then yields the line.
pub struct LineReader {
    buf: [u8; MAX_MSG_LEN],
    pos: usize,
}

impl LineReader {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_MSG_LEN],
            pos: 0,
        }
    }

    /// Feed a byte into the reader. Returns a complete line (without newline)
    /// when one is detected.
    pub fn feed(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == b'\n' || byte == b'\r' {
            if self.pos > 0 {
                let line = &self.buf[..self.pos];
                self.pos = 0;
                Some(line)
            } else {
                None
            }
        } else if self.pos < self.buf.len() {
            self.buf[self.pos] = byte;
            self.pos += 1;
            None
        } else {
            // Overflow — discard and reset
            self.pos = 0;
            None
        }
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_trailing_whitespace(data: &[u8]) -> &[u8] {
    let mut end = data.len();
    while end > 0 && matches!(data[end - 1], b' ' | b'\n' | b'\r' | b'\t') {
        end -= 1;
    }
    &data[..end]
}
