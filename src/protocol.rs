/// JSON message protocol between the survey device and a serial host.
///
/// All messages are newline-delimited JSON (NDJSON).
/// Uses `heapless` types for no_std/no-alloc operation.
use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::defaults::MONITOR_GRAPH_LEN;

/// Maximum length for MAC address strings ("AA:BB:CC:DD:EE:FF")
pub type MacString = String<18>;

/// Messages sent from the device to the host
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum DeviceMessage<'a> {
    /// One directory entry
    #[serde(rename = "ap")]
    AccessPoint {
        mac: &'a MacString,
        ssid: &'a str,
        rssi: i8,
        ch: u8,
        /// Seen during the current sweep cycle
        live: bool,
    },
    /// Controller status
    #[serde(rename = "status")]
    Status {
        /// "idle", "surveying" or "monitoring"
        state: &'static str,
        /// Access points in the directory
        aps: u8,
        /// Deauthentication/disassociation frames seen this session
        disconnects: u32,
        /// Channel flagged by the last closed watch window
        #[serde(skip_serializing_if = "Option::is_none")]
        flood_ch: Option<u8>,
        /// New access points dropped because the directory was full
        rejected: u32,
        /// Uptime in seconds
        uptime: u32,
        /// Board identifier
        board: &'static str,
        /// Firmware version
        version: &'static str,
    },
    /// Packet monitor graph
    #[serde(rename = "monitor")]
    Monitor {
        ch: u8,
        total: u32,
        graph: &'a [u8; MONITOR_GRAPH_LEN],
    },
    /// A command was rejected
    #[serde(rename = "error")]
    Error { detail: &'a str },
}

/// Commands sent from the host to the device.
///
/// Deserialized manually via [`RawCommand`] in `comm::parse_command()` because
/// `serde_json_core` does not support internally tagged enums (`deserialize_any`).
#[derive(Debug, PartialEq)]
pub enum HostCommand {
    /// Start a survey
    Start,
    /// Stop the survey or packet monitor
    Stop,
    /// Request current status and directory listing
    GetStatus,
    /// Enter packet monitor mode on a channel
    Monitor { channel: u8 },
    /// Step the packet monitor channel up or down
    StepChannel { up: bool },
}

/// Wire format for host commands — flat struct that `serde_json_core` can
/// deserialize without `deserialize_any`. Converted to [`HostCommand`] in
/// `comm::parse_command()`.
#[derive(Deserialize)]
pub(crate) struct RawCommand {
    pub cmd: heapless::String<16>,
    #[serde(default)]
    pub channel: Option<u8>,
    #[serde(default)]
    pub up: Option<bool>,
}

/// Firmware version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum size of a serialized JSON message
pub const MAX_MSG_LEN: usize = 256;

/// Buffer type for serialized JSON messages
pub type MsgBuffer = Vec<u8, MAX_MSG_LEN>;

/// Format a 6-byte MAC address into "AA:BB:CC:DD:EE:FF" string
pub fn format_mac(mac: &[u8; 6], buf: &mut MacString) {
    use core::fmt::Write;
    let _ = write!(
        buf,
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
}
