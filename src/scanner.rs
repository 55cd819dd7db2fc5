/// WiFi frame capture and classification.
///
/// The sniffer callback runs in ISR context, so it only copies the leading
/// bytes of each frame into a [`RawFrame`] and pushes it onto the bounded
/// [`CaptureQueue`]. Classification happens later, on the controller's
/// cooperative tick, via the pure functions [`classify`] and
/// [`classify_disconnect`].
///
/// Parsing works on fixed 802.11 offsets:
///
/// ```text
///  0..2   frame control        beacon: 0x80 0x00
///  2..4   duration
///  4..10  addr1 (receiver)
/// 10..16  addr2 (transmitter)  beacon: BSSID
/// 16..22  addr3 (BSSID)
/// 22..24  sequence control
/// 24..36  timestamp, beacon interval, capability   (beacon only)
/// 36..    tagged elements: [tag] [len] [body...]
/// ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};

use crate::defaults::{CAPTURE_QUEUE_DEPTH, CAPTURE_SNAPLEN, HIDDEN_LABEL, MAX_LABEL_LEN};

/// Frame-control byte masks. The low two bits (protocol version) are ignored.
const FC_MASK: u8 = 0xFC;
const FC_BEACON: u8 = 0x80;
const FC_DISASSOC: u8 = 0xA0;
const FC_DEAUTH: u8 = 0xC0;

const BEACON_BSSID_OFFSET: usize = 10;
const DISCONNECT_BSSID_OFFSET: usize = 16;
const MGMT_HEADER_LEN: usize = 24;
const BEACON_ELEMENTS_OFFSET: usize = 36;
const TAG_SSID: u8 = 0;

/// Display label for an access point: up to 32 bytes of SSID.
pub type Label = String<MAX_LABEL_LEN>;

/// A captured frame, copied out of the driver buffer.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Leading bytes of the frame (at most [`CAPTURE_SNAPLEN`])
    pub data: Vec<u8, CAPTURE_SNAPLEN>,
    /// Length of the frame as received, before snapping
    pub len: u16,
    pub channel: u8,
    pub rssi: i8,
}

impl RawFrame {
    /// Copy a driver buffer, keeping at most [`CAPTURE_SNAPLEN`] bytes.
    pub fn capture(bytes: &[u8], channel: u8, rssi: i8) -> Self {
        let keep = bytes.len().min(CAPTURE_SNAPLEN);
        let mut data = Vec::new();
        // Cannot fail: keep <= capacity
        let _ = data.extend_from_slice(&bytes[..keep]);
        Self {
            data,
            len: bytes.len().min(u16::MAX as usize) as u16,
            channel,
            rssi,
        }
    }
}

/// Beacon semantics extracted from a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconInfo {
    pub bssid: [u8; 6],
    pub label: Label,
    pub rssi: i8,
    pub channel: u8,
}

/// Kind of disconnect frame seen on the air
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectKind {
    Deauthentication,
    Disassociation,
}

/// A deauthentication or disassociation frame observed by the sniffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisconnectInfo {
    pub kind: DisconnectKind,
    pub bssid: [u8; 6],
    /// Reason code, if the frame was long enough to carry one
    pub reason: Option<u16>,
    pub channel: u8,
}

/// Queue between the sniffer ISR and the controller tick.
pub type CaptureQueue = Channel<CriticalSectionRawMutex, RawFrame, CAPTURE_QUEUE_DEPTH>;

/// Capture entry point for the radio driver.
///
/// Never blocks. Returns `false` if the queue is full and the frame was dropped.
/// Safe to call from ISR context.
pub fn deliver_frame(queue: &CaptureQueue, bytes: &[u8], channel: u8, rssi: i8) -> bool {
    queue.try_send(RawFrame::capture(bytes, channel, rssi)).is_ok()
}

/// Parse a beacon. Returns `None` for anything that is not a beacon
/// or is too short to carry a BSSID.
///
/// An absent, empty, or truncated-away SSID element yields [`HIDDEN_LABEL`].
pub fn classify(frame: &RawFrame) -> Option<BeaconInfo> {
    let data = frame.data.as_slice();
    let fc = *data.first()?;
    if fc & FC_MASK != FC_BEACON {
        return None;
    }

    let bssid: [u8; 6] = data
        .get(BEACON_BSSID_OFFSET..BEACON_BSSID_OFFSET + 6)?
        .try_into()
        .ok()?;

    let label = match find_ssid(data) {
        Some(ssid) if !ssid.is_empty() => label_from_bytes(ssid),
        _ => hidden_label(),
    };

    Some(BeaconInfo {
        bssid,
        label,
        rssi: frame.rssi,
        channel: frame.channel,
    })
}

/// Recognize deauthentication and disassociation frames.
pub fn classify_disconnect(frame: &RawFrame) -> Option<DisconnectInfo> {
    let data = frame.data.as_slice();
    if data.len() < MGMT_HEADER_LEN {
        return None;
    }
    let kind = match data[0] & FC_MASK {
        FC_DEAUTH => DisconnectKind::Deauthentication,
        FC_DISASSOC => DisconnectKind::Disassociation,
        _ => return None,
    };
    let bssid: [u8; 6] = data
        .get(DISCONNECT_BSSID_OFFSET..DISCONNECT_BSSID_OFFSET + 6)?
        .try_into()
        .ok()?;
    let reason = data
        .get(MGMT_HEADER_LEN..MGMT_HEADER_LEN + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]));

    Some(DisconnectInfo {
        kind,
        bssid,
        reason,
        channel: frame.channel,
    })
}

/// Walk the tagged elements of a beacon body looking for the SSID.
///
/// Every read is bounds-checked: the walk stops once a tag header would run
/// past the buffer, and an element body is clamped to what was captured.
fn find_ssid(data: &[u8]) -> Option<&[u8]> {
    if data.len() <= BEACON_ELEMENTS_OFFSET {
        return None;
    }

    let mut pos = BEACON_ELEMENTS_OFFSET;
    while pos + 2 <= data.len() {
        let tag = data[pos];
        let len = data[pos + 1] as usize;
        let body_start = pos + 2;
        if tag == TAG_SSID {
            let body_end = (body_start + len).min(data.len());
            return data.get(body_start..body_end);
        }
        pos = body_start + len;
    }
    None
}

/// Build a label from raw SSID bytes, truncated to 32 bytes.
/// Invalid UTF-8 sequences are replaced with '?'.
fn label_from_bytes(ssid: &[u8]) -> Label {
    let ssid = &ssid[..ssid.len().min(MAX_LABEL_LEN)];
    let mut label = Label::new();
    for chunk in ssid.utf8_chunks() {
        let _ = label.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            let _ = label.push('?');
        }
    }
    label
}

fn hidden_label() -> Label {
    let mut label = Label::new();
    let _ = label.push_str(HIDDEN_LABEL);
    label
}
