/// Packet monitor: raw traffic rate on a single, manually chosen channel.
///
/// Every captured frame counts, regardless of type. Every sample period the
/// rate is scaled into a bar height and pushed onto a rolling graph.

use crate::defaults::{
    MAX_CHANNEL, MIN_CHANNEL, MONITOR_BAR_MAX, MONITOR_FULL_SCALE, MONITOR_GRAPH_LEN,
};

#[derive(Debug, Clone)]
pub struct PacketMonitor {
    channel: u8,
    rate: u32,
    total: u32,
    graph: [u8; MONITOR_GRAPH_LEN],
}

impl PacketMonitor {
    pub const fn new() -> Self {
        Self {
            channel: MIN_CHANNEL,
            rate: 0,
            total: 0,
            graph: [0; MONITOR_GRAPH_LEN],
        }
    }

    /// Clear counters and graph, and select `channel` (clamped to 1-13).
    pub fn reset(&mut self, channel: u8) {
        *self = Self::new();
        self.channel = channel.clamp(MIN_CHANNEL, MAX_CHANNEL);
    }

    pub fn count_frame(&mut self) {
        self.rate = self.rate.saturating_add(1);
        self.total = self.total.saturating_add(1);
    }

    /// Push the current rate onto the graph and start a new sample.
    pub fn sample(&mut self) {
        self.graph.copy_within(1.., 0);
        let scaled = self.rate.saturating_mul(MONITOR_BAR_MAX as u32) / MONITOR_FULL_SCALE;
        self.graph[MONITOR_GRAPH_LEN - 1] = scaled.min(MONITOR_BAR_MAX as u32) as u8;
        self.rate = 0;
    }

    /// Move one channel up or down, wrapping between 13 and 1.
    /// Returns the new channel.
    pub fn step_channel(&mut self, up: bool) -> u8 {
        self.channel = match (up, self.channel) {
            (true, MAX_CHANNEL) => MIN_CHANNEL,
            (true, ch) => ch + 1,
            (false, MIN_CHANNEL) => MAX_CHANNEL,
            (false, ch) => ch - 1,
        };
        self.channel
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Bar heights, oldest first.
    pub fn graph(&self) -> &[u8; MONITOR_GRAPH_LEN] {
        &self.graph
    }
}

impl Default for PacketMonitor {
    fn default() -> Self {
        Self::new()
    }
}
