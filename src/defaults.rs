/// Compile-time survey defaults.
///
/// Timing values are in milliseconds. All periodic gates compare with a
/// strict `>` against the interval, so a task first runs one millisecond
/// after its interval has fully elapsed.

/// Maximum number of access points held in the directory.
pub const DIRECTORY_CAPACITY: usize = 20;

/// 2.4 GHz channels swept during a survey, in visiting order.
pub const SURVEY_CHANNELS: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13];

/// Lowest and highest usable channel.
pub const MIN_CHANNEL: u8 = 1;
pub const MAX_CHANNEL: u8 = 13;

/// Listen time per channel during a sweep.
/// Beacons go out roughly every 102ms, so one dwell usually catches one.
pub const DWELL_MS: u32 = 100;

/// Minimum spacing between sweep starts.
pub const SCAN_INTERVAL_MS: u64 = 2000;

/// Cadence at which the disconnect watch checks whether its window closed.
pub const WATCH_TICK_MS: u64 = 50;

/// Length of one disconnect-counting window.
pub const WATCH_WINDOW_MS: u64 = 1000;

/// Disconnect frames per channel per window that count as a flood.
pub const FLOOD_THRESHOLD: u16 = 20;

/// Packet monitor graph resolution.
pub const MONITOR_SAMPLE_MS: u64 = 250;
pub const MONITOR_GRAPH_LEN: usize = 26;
/// Packets per sample that map to a full-height bar.
pub const MONITOR_FULL_SCALE: u32 = 50;
/// Height of a full bar.
pub const MONITOR_BAR_MAX: u8 = 90;

/// Depth of the ISR → controller capture queue.
pub const CAPTURE_QUEUE_DEPTH: usize = 16;

/// Leading bytes kept from each captured frame. Covers the MAC header,
/// beacon fixed fields and a full SSID element.
pub const CAPTURE_SNAPLEN: usize = 128;

/// Maximum SSID length (IEEE 802.11).
pub const MAX_LABEL_LEN: usize = 32;

/// Label used for beacons with an absent or empty SSID element.
pub const HIDDEN_LABEL: &str = "[Hidden]";
