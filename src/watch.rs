/// Disconnect watch: counts deauthentication and disassociation frames
/// seen by the sniffer and flags channels where they arrive in bulk.
///
/// A burst of these frames on one channel is the usual signature of a
/// deauth attack against nearby networks. Counting happens per channel in
/// fixed windows; a window that reaches [`FLOOD_THRESHOLD`] on a channel
/// marks that channel as flooded until a later window comes in clean.

use crate::defaults::{FLOOD_THRESHOLD, MAX_CHANNEL, MIN_CHANNEL, WATCH_WINDOW_MS};
use crate::scanner::DisconnectInfo;

const SLOTS: usize = MAX_CHANNEL as usize;

/// Summary of a closed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowReport {
    /// Busiest channel in the window, if any disconnect frames were seen
    pub busiest: Option<(u8, u16)>,
    /// Set when the busiest channel reached the flood threshold
    pub flood: bool,
}

#[derive(Debug)]
pub struct DisconnectWatch {
    window: [u16; SLOTS],
    window_start_ms: u64,
    total: u32,
    flood_channel: Option<u8>,
    threshold: u16,
}

impl DisconnectWatch {
    pub const fn new() -> Self {
        Self {
            window: [0; SLOTS],
            window_start_ms: 0,
            total: 0,
            flood_channel: None,
            threshold: FLOOD_THRESHOLD,
        }
    }

    pub fn reset(&mut self, now_ms: u64) {
        *self = Self {
            threshold: self.threshold,
            ..Self::new()
        };
        self.window_start_ms = now_ms;
    }

    pub fn set_threshold(&mut self, threshold: u16) {
        self.threshold = threshold.max(1);
    }

    /// Count one disconnect frame. Frames reporting a channel outside
    /// 1-13 still count toward the total.
    pub fn observe(&mut self, info: &DisconnectInfo) {
        self.total = self.total.saturating_add(1);
        if (MIN_CHANNEL..=MAX_CHANNEL).contains(&info.channel) {
            let slot = &mut self.window[(info.channel - MIN_CHANNEL) as usize];
            *slot = slot.saturating_add(1);
        }
    }

    /// Close the current window if it has run its length.
    pub fn roll(&mut self, now_ms: u64) -> Option<WindowReport> {
        if now_ms.saturating_sub(self.window_start_ms) < WATCH_WINDOW_MS {
            return None;
        }

        let busiest = self
            .window
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .max_by_key(|&(_, &n)| n)
            .map(|(i, &n)| (i as u8 + MIN_CHANNEL, n));

        let flood = matches!(busiest, Some((_, n)) if n >= self.threshold);
        self.flood_channel = if flood { busiest.map(|(ch, _)| ch) } else { None };

        self.window = [0; SLOTS];
        self.window_start_ms = now_ms;
        Some(WindowReport { busiest, flood })
    }

    /// Disconnect frames seen since the last reset
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Channel flagged by the most recent closed window
    pub fn flood_channel(&self) -> Option<u8> {
        self.flood_channel
    }
}

impl Default for DisconnectWatch {
    fn default() -> Self {
        Self::new()
    }
}
