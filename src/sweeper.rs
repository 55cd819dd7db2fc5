/// Channel sweep: visit every survey channel once, dwelling on each long
/// enough to catch beacons.
///
/// The sweep blocks the caller for `channels × dwell` (1.3s with defaults).
/// The radio listens on one channel at a time, so there is nothing to
/// parallelize; the controller gates how often a sweep may start.

use embedded_hal::delay::DelayNs;

use crate::defaults::{DWELL_MS, SURVEY_CHANNELS};
use crate::radio::Radio;

/// Sweep timing, adjustable at runtime
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub dwell_ms: u32,
}

impl SweepConfig {
    pub const fn new() -> Self {
        Self { dwell_ms: DWELL_MS }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Visit channels 1..=13 in ascending order.
///
/// `after_dwell` runs once per channel, after its dwell, so the caller can
/// drain frames captured on that channel before the radio moves on.
///
/// A channel the driver refuses to tune is logged and skipped; the sweep
/// still dwells so the overall cadence stays the same. Returns the number
/// of channels tuned successfully.
pub fn sweep<R, D, F>(radio: &mut R, delay: &mut D, config: &SweepConfig, mut after_dwell: F) -> usize
where
    R: Radio,
    D: DelayNs,
    F: FnMut(u8),
{
    let mut tuned = 0;
    for &ch in SURVEY_CHANNELS {
        match radio.set_channel(ch) {
            Ok(()) => tuned += 1,
            Err(e) => log::warn!("Sweep: {}", e),
        }
        delay.delay_ms(config.dwell_ms);
        after_dwell(ch);
    }
    tuned
}
