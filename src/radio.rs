/// Seams between the survey engine and the platform.
///
/// The library never touches hardware directly. Firmware implements
/// [`Radio`] over the esp-radio sniffer and [`Clock`] over
/// `embassy_time::Instant`; tests substitute recording fakes.
///
/// `Radio` deliberately has no transmit operation: the survey engine is
/// receive-only.

use core::fmt;

/// Errors reported by a radio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Switching into or out of promiscuous capture failed
    ModeSwitch,
    /// The driver rejected a channel change
    Channel(u8),
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioError::ModeSwitch => f.write_str("radio mode switch failed"),
            RadioError::Channel(ch) => write!(f, "failed to tune to channel {}", ch),
        }
    }
}

/// The single WiFi radio, time-multiplexed between normal operation and
/// promiscuous capture.
pub trait Radio {
    /// Tune to a 2.4 GHz channel (1-13).
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError>;

    /// Leave the prior mode (station / BLE advertising) and enable
    /// promiscuous capture with the sniffer callback installed.
    fn enter_capture(&mut self) -> Result<(), RadioError>;

    /// Disable promiscuous capture and restore the prior mode.
    fn leave_capture(&mut self) -> Result<(), RadioError>;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[cfg(test)]
pub(crate) mod fakes {
    use core::cell::Cell;

    use embedded_hal::delay::DelayNs;
    use heapless::Vec;

    use super::*;

    /// Radio event recorded by [`FakeRadio`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RadioCall {
        Channel(u8),
        EnterCapture,
        LeaveCapture,
    }

    /// Records every call; can be told to fail mode switches.
    #[derive(Default)]
    pub struct FakeRadio {
        pub calls: Vec<RadioCall, 256>,
        pub fail_enter: bool,
        pub fail_leave: bool,
    }

    impl FakeRadio {
        pub fn channels(&self) -> Vec<u8, 256> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    RadioCall::Channel(ch) => Some(*ch),
                    _ => None,
                })
                .collect()
        }
    }

    impl Radio for FakeRadio {
        fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
            let _ = self.calls.push(RadioCall::Channel(channel));
            Ok(())
        }

        fn enter_capture(&mut self) -> Result<(), RadioError> {
            let _ = self.calls.push(RadioCall::EnterCapture);
            if self.fail_enter {
                Err(RadioError::ModeSwitch)
            } else {
                Ok(())
            }
        }

        fn leave_capture(&mut self) -> Result<(), RadioError> {
            let _ = self.calls.push(RadioCall::LeaveCapture);
            if self.fail_leave {
                Err(RadioError::ModeSwitch)
            } else {
                Ok(())
            }
        }
    }

    /// Manually advanced clock.
    #[derive(Default)]
    pub struct ManualClock {
        now: Cell<u64>,
    }

    impl ManualClock {
        pub fn set(&self, ms: u64) {
            self.now.set(ms);
        }

        pub fn advance(&self, ms: u64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for &ManualClock {
        fn now_ms(&self) -> u64 {
            self.now.get()
        }
    }

    /// Sums requested delays without sleeping.
    #[derive(Default)]
    pub struct RecordingDelay {
        pub total_ns: u64,
        pub calls: u32,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
            self.calls += 1;
        }
    }
}
