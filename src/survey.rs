/// Survey controller: the single owner of radio, directory and timers.
///
/// The host loop calls [`SurveyController::tick`] once per iteration; the UI
/// calls `start`/`stop`/`start_monitor`/`stop_monitor` on user action and
/// polls [`SurveyController::snapshot`] once per redraw.
///
/// Frames reach the controller only through the [`CaptureQueue`] filled by
/// the sniffer ISR. All directory mutation happens here, on the caller's
/// thread, so no locking is needed beyond the queue itself.
///
/// A `tick()` may block for a full sweep (~1.3s). There is no cancellation:
/// `stop()` takes effect between ticks, never in the middle of a sweep.

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::defaults::{
    DIRECTORY_CAPACITY, FLOOD_THRESHOLD, MONITOR_SAMPLE_MS, SCAN_INTERVAL_MS, WATCH_TICK_MS,
};
use crate::directory::{ApDirectory, Upsert};
use crate::monitor::PacketMonitor;
use crate::radio::{Clock, Radio, RadioError};
use crate::scanner::{classify, classify_disconnect, CaptureQueue, Label, RawFrame};
use crate::schedule::Periodic;
use crate::sweeper::{sweep, SweepConfig};
use crate::watch::DisconnectWatch;

/// Runtime survey configuration.
#[derive(Debug, Clone, Copy)]
pub struct SurveyConfig {
    /// Minimum spacing between sweep starts
    pub scan_interval_ms: u64,
    /// How often the disconnect watch checks for a closed window
    pub watch_tick_ms: u64,
    /// Disconnect frames per channel per window that count as a flood
    pub flood_threshold: u16,
    pub sweep: SweepConfig,
}

impl SurveyConfig {
    pub const fn new() -> Self {
        Self {
            scan_interval_ms: SCAN_INTERVAL_MS,
            watch_tick_ms: WATCH_TICK_MS,
            flood_threshold: FLOOD_THRESHOLD,
            sweep: SweepConfig::new(),
        }
    }
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyState {
    Idle,
    Surveying,
    Monitoring,
}

impl SurveyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurveyState::Idle => "idle",
            SurveyState::Surveying => "surveying",
            SurveyState::Monitoring => "monitoring",
        }
    }
}

/// One access point as shown by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub bssid: [u8; 6],
    pub label: Label,
    pub channel: u8,
    pub rssi: i8,
    pub live: bool,
}

/// Read-only view of controller state for display
#[derive(Debug, Clone)]
pub struct SurveySnapshot {
    pub state: SurveyState,
    pub running: bool,
    pub entries: Vec<SnapshotEntry, DIRECTORY_CAPACITY>,
    pub disconnect_frames_seen: u32,
    pub flood_channel: Option<u8>,
    /// New access points rejected because the directory was full
    pub rejected: u32,
}

pub struct SurveyController<'q, R, C, D> {
    radio: R,
    clock: C,
    delay: D,
    queue: &'q CaptureQueue,
    config: SurveyConfig,
    state: SurveyState,
    directory: ApDirectory,
    watch: DisconnectWatch,
    monitor: PacketMonitor,
    scan_timer: Periodic,
    watch_timer: Periodic,
    monitor_timer: Periodic,
    rejected: u32,
}

impl<'q, R: Radio, C: Clock, D: DelayNs> SurveyController<'q, R, C, D> {
    pub fn new(radio: R, clock: C, delay: D, queue: &'q CaptureQueue, config: SurveyConfig) -> Self {
        let mut watch = DisconnectWatch::new();
        watch.set_threshold(config.flood_threshold);
        Self {
            radio,
            clock,
            delay,
            queue,
            config,
            state: SurveyState::Idle,
            directory: ApDirectory::new(),
            watch,
            monitor: PacketMonitor::new(),
            scan_timer: Periodic::new(config.scan_interval_ms),
            watch_timer: Periodic::new(config.watch_tick_ms),
            monitor_timer: Periodic::new(MONITOR_SAMPLE_MS),
            rejected: 0,
        }
    }

    /// Switch the radio into capture mode and begin a fresh survey.
    ///
    /// On radio failure the controller stays in its current state and the
    /// previous session's directory is left untouched.
    pub fn start(&mut self) -> Result<(), RadioError> {
        match self.state {
            SurveyState::Surveying => return Ok(()),
            SurveyState::Monitoring => self.stop_monitor()?,
            SurveyState::Idle => {}
        }

        if let Err(e) = self.radio.enter_capture() {
            log::warn!("Survey start failed: {}", e);
            return Err(e);
        }

        let now = self.clock.now_ms();
        self.queue.clear();
        self.directory.clear();
        self.watch.reset(now);
        self.rejected = 0;
        self.scan_timer.stamp(now);
        self.watch_timer.stamp(now);
        self.state = SurveyState::Surveying;

        log::info!("Survey started");
        Ok(())
    }

    /// Leave capture mode. The directory stays populated for display.
    ///
    /// The controller is Idle afterwards even if the radio reports an error.
    pub fn stop(&mut self) -> Result<(), RadioError> {
        if self.state != SurveyState::Surveying {
            return Ok(());
        }
        self.state = SurveyState::Idle;
        self.queue.clear();
        log::info!(
            "Survey stopped: {} APs, {} disconnect frames seen",
            self.directory.len(),
            self.watch.total()
        );
        self.leave_capture()
    }

    /// Enter packet monitor mode on `channel`. Ends a running survey first.
    pub fn start_monitor(&mut self, channel: u8) -> Result<(), RadioError> {
        match self.state {
            SurveyState::Monitoring => return Ok(()),
            SurveyState::Surveying => self.stop()?,
            SurveyState::Idle => {}
        }

        if let Err(e) = self.radio.enter_capture() {
            log::warn!("Monitor start failed: {}", e);
            return Err(e);
        }

        self.queue.clear();
        self.monitor.reset(channel);
        self.state = SurveyState::Monitoring;
        self.monitor_timer.stamp(self.clock.now_ms());

        if let Err(e) = self.radio.set_channel(self.monitor.channel()) {
            log::warn!("Monitor: {}", e);
        }
        log::info!("Packet monitor started on channel {}", self.monitor.channel());
        Ok(())
    }

    pub fn stop_monitor(&mut self) -> Result<(), RadioError> {
        if self.state != SurveyState::Monitoring {
            return Ok(());
        }
        self.state = SurveyState::Idle;
        self.queue.clear();
        log::info!("Packet monitor stopped: {} frames", self.monitor.total());
        self.leave_capture()
    }

    /// Move the packet monitor one channel up or down (wrapping 13 ↔ 1).
    /// Ignored unless monitoring.
    pub fn step_monitor_channel(&mut self, up: bool) -> Result<u8, RadioError> {
        if self.state != SurveyState::Monitoring {
            return Ok(self.monitor.channel());
        }
        let ch = self.monitor.step_channel(up);
        self.radio.set_channel(ch)?;
        Ok(ch)
    }

    /// Run whatever periodic work is due. Call once per host-loop iteration.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        match self.state {
            SurveyState::Idle => self.queue.clear(),
            SurveyState::Surveying => self.tick_survey(now),
            SurveyState::Monitoring => self.tick_monitor(now),
        }
    }

    fn tick_survey(&mut self, now: u64) {
        drain_survey(self.queue, &mut self.directory, &mut self.watch, &mut self.rejected);

        if self.scan_timer.poll(now) {
            self.directory.reset_liveness();
            let queue = self.queue;
            let directory = &mut self.directory;
            let watch = &mut self.watch;
            let rejected = &mut self.rejected;
            sweep(&mut self.radio, &mut self.delay, &self.config.sweep, |_| {
                drain_survey(queue, directory, watch, rejected)
            });
        }

        if self.watch_timer.poll(now) {
            if let Some(report) = self.watch.roll(now) {
                if let (true, Some((ch, n))) = (report.flood, report.busiest) {
                    log::warn!("Disconnect flood on channel {}: {} frames in window", ch, n);
                }
            }
        }
    }

    fn tick_monitor(&mut self, now: u64) {
        while self.queue.try_receive().is_ok() {
            self.monitor.count_frame();
        }
        if self.monitor_timer.poll(now) {
            self.monitor.sample();
        }
    }

    fn leave_capture(&mut self) -> Result<(), RadioError> {
        self.radio.leave_capture().map_err(|e| {
            log::warn!("Radio restore failed: {}", e);
            e
        })
    }

    pub fn state(&self) -> SurveyState {
        self.state
    }

    pub fn directory(&self) -> &ApDirectory {
        &self.directory
    }

    pub fn monitor(&self) -> &PacketMonitor {
        &self.monitor
    }

    pub fn snapshot(&self) -> SurveySnapshot {
        let entries = self
            .directory
            .entries()
            .iter()
            .map(|r| SnapshotEntry {
                bssid: *r.bssid(),
                label: Label::try_from(r.label()).unwrap_or_default(),
                channel: r.channel,
                rssi: r.rssi,
                live: r.live,
            })
            .collect();

        SurveySnapshot {
            state: self.state,
            running: self.state == SurveyState::Surveying,
            entries,
            disconnect_frames_seen: self.watch.total(),
            flood_channel: self.watch.flood_channel(),
            rejected: self.rejected,
        }
    }
}

/// Drain queued frames into the directory and watch.
fn drain_survey(
    queue: &CaptureQueue,
    directory: &mut ApDirectory,
    watch: &mut DisconnectWatch,
    rejected: &mut u32,
) {
    while let Ok(frame) = queue.try_receive() {
        ingest(&frame, directory, watch, rejected);
    }
}

fn ingest(frame: &RawFrame, directory: &mut ApDirectory, watch: &mut DisconnectWatch, rejected: &mut u32) {
    if let Some(info) = classify(frame) {
        match directory.upsert(&info) {
            Ok(Upsert::Inserted) => log::debug!("New AP '{}' ch {} {} dBm", info.label, info.channel, info.rssi),
            Ok(Upsert::Updated) => {}
            Err(_) => *rejected = rejected.saturating_add(1),
        }
    } else if let Some(disconnect) = classify_disconnect(frame) {
        watch.observe(&disconnect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::CAPTURE_QUEUE_DEPTH;
    use crate::radio::fakes::{FakeRadio, ManualClock, RadioCall, RecordingDelay};
    use crate::scanner::deliver_frame;
    use crate::scanner::tests::{beacon_bytes, TEST_BSSID};

    type TestController<'a> = SurveyController<'a, FakeRadio, &'a ManualClock, RecordingDelay>;

    fn controller<'a>(queue: &'a CaptureQueue, clock: &'a ManualClock) -> TestController<'a> {
        SurveyController::new(
            FakeRadio::default(),
            clock,
            RecordingDelay::default(),
            queue,
            SurveyConfig::new(),
        )
    }

    fn bssid(last: u8) -> [u8; 6] {
        [0x02, 0x11, 0x22, 0x33, 0x44, last]
    }

    fn deauth_bytes(ap: [u8; 6]) -> [u8; 26] {
        let mut b = [0u8; 26];
        b[0] = 0xC0;
        b[4..10].copy_from_slice(&[0xFF; 6]);
        b[10..16].copy_from_slice(&ap);
        b[16..22].copy_from_slice(&ap);
        b[24] = 0x01;
        b
    }

    #[test]
    fn start_then_stop_leaves_everything_empty() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);

        c.start().unwrap();
        c.stop().unwrap();

        let snap = c.snapshot();
        assert!(!snap.running);
        assert!(snap.entries.is_empty());
        assert_eq!(snap.disconnect_frames_seen, 0);
        assert_eq!(snap.rejected, 0);
        assert_eq!(
            c.radio.calls.as_slice(),
            &[RadioCall::EnterCapture, RadioCall::LeaveCapture]
        );
    }

    #[test]
    fn tick_is_noop_when_idle() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);

        deliver_frame(&queue, &beacon_bytes(TEST_BSSID, Some(b"test")), 6, -40);
        clock.advance(10_000);
        c.tick();

        assert!(c.directory().is_empty());
        assert!(c.radio.calls.is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn beacon_lands_in_directory_on_tick() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        deliver_frame(&queue, &beacon_bytes(TEST_BSSID, Some(b"test")), 6, -40);
        c.tick();

        let snap = c.snapshot();
        assert!(snap.running);
        assert_eq!(snap.entries.len(), 1);
        assert_eq!(snap.entries[0].bssid, TEST_BSSID);
        assert_eq!(snap.entries[0].label.as_str(), "test");
        assert_eq!(snap.entries[0].channel, 6);
        assert!(snap.entries[0].live);
    }

    #[test]
    fn non_beacon_leaves_directory_unchanged() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        let mut probe_resp = beacon_bytes(TEST_BSSID, Some(b"test"));
        probe_resp[0] = 0x50;
        deliver_frame(&queue, &probe_resp, 6, -40);
        c.tick();

        assert!(c.directory().is_empty());
    }

    #[test]
    fn repeated_sighting_updates_signal() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        let bytes = beacon_bytes(TEST_BSSID, Some(b"test"));
        deliver_frame(&queue, &bytes, 6, -70);
        deliver_frame(&queue, &bytes, 6, -35);
        c.tick();

        assert_eq!(c.directory().len(), 1);
        assert_eq!(c.directory().entries()[0].rssi, -35);
    }

    #[test]
    fn sweep_gated_by_scan_interval() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        clock.set(1_000);
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        clock.set(3_000);
        c.tick();
        assert!(c.radio.channels().is_empty());

        clock.set(3_001);
        c.tick();
        assert_eq!(c.radio.channels().len(), 13);

        clock.set(4_000);
        c.tick();
        assert_eq!(c.radio.channels().len(), 13);

        clock.set(5_002);
        c.tick();
        assert_eq!(c.radio.channels().len(), 26);
    }

    #[test]
    fn sweep_resets_liveness_before_listening() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        deliver_frame(&queue, &beacon_bytes(bssid(1), Some(b"a")), 1, -50);
        deliver_frame(&queue, &beacon_bytes(bssid(2), Some(b"b")), 1, -50);
        c.tick();
        assert!(c.directory().entries().iter().all(|r| r.live));

        // Only AP 2 is heard again, and it arrives during the sweep
        clock.advance(2_001);
        c.tick();
        assert!(c.directory().entries().iter().all(|r| !r.live));

        deliver_frame(&queue, &beacon_bytes(bssid(2), Some(b"b")), 1, -45);
        c.tick();
        let entries = c.directory().entries();
        assert!(!entries[0].live);
        assert!(entries[1].live);
    }

    #[test]
    fn directory_capacity_reported_in_snapshot() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        for i in 0..25u8 {
            deliver_frame(&queue, &beacon_bytes(bssid(i), Some(b"ap")), 6, -50);
            c.tick();
        }

        let snap = c.snapshot();
        assert_eq!(snap.entries.len(), DIRECTORY_CAPACITY);
        assert_eq!(snap.rejected, 5);
    }

    #[test]
    fn stop_keeps_directory_and_next_start_clears_it() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();
        deliver_frame(&queue, &beacon_bytes(TEST_BSSID, Some(b"test")), 6, -40);
        c.tick();

        c.stop().unwrap();
        assert_eq!(c.snapshot().entries.len(), 1);

        c.start().unwrap();
        assert!(c.snapshot().entries.is_empty());
    }

    #[test]
    fn start_failure_stays_idle() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.radio.fail_enter = true;

        assert_eq!(c.start(), Err(RadioError::ModeSwitch));
        assert_eq!(c.state(), SurveyState::Idle);
    }

    #[test]
    fn stop_failure_still_goes_idle() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();
        c.radio.fail_leave = true;

        assert_eq!(c.stop(), Err(RadioError::ModeSwitch));
        assert_eq!(c.state(), SurveyState::Idle);
    }

    #[test]
    fn start_is_idempotent() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();
        c.start().unwrap();
        assert_eq!(c.radio.calls.as_slice(), &[RadioCall::EnterCapture]);
    }

    #[test]
    fn no_sweep_after_stop() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();
        c.stop().unwrap();

        deliver_frame(&queue, &beacon_bytes(TEST_BSSID, Some(b"late")), 6, -50);
        clock.advance(10_000);
        c.tick();

        assert!(c.radio.channels().is_empty());
        assert!(c.directory().is_empty());
    }

    #[test]
    fn disconnect_flood_flagged() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start().unwrap();

        for _ in 0..2 {
            for _ in 0..CAPTURE_QUEUE_DEPTH {
                deliver_frame(&queue, &deauth_bytes(TEST_BSSID), 11, -30);
            }
            c.tick();
        }
        assert_eq!(c.snapshot().disconnect_frames_seen, 32);
        assert_eq!(c.snapshot().flood_channel, None);

        clock.set(1_001);
        c.tick();
        assert_eq!(c.snapshot().flood_channel, Some(11));
        assert!(c.directory().is_empty());
    }

    #[test]
    fn monitor_counts_every_frame_and_samples() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start_monitor(6).unwrap();
        assert_eq!(c.state(), SurveyState::Monitoring);
        assert_eq!(c.radio.channels().as_slice(), &[6]);

        for _ in 0..10 {
            deliver_frame(&queue, &[0x88, 0x00, 0x00], 6, -50);
        }
        c.tick();
        assert_eq!(c.monitor().total(), 10);

        clock.set(251);
        c.tick();
        assert_eq!(c.monitor().graph()[25], 18);
        assert!(c.directory().is_empty());
    }

    #[test]
    fn monitor_channel_steps_wrap() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start_monitor(13).unwrap();
        assert_eq!(c.step_monitor_channel(true), Ok(1));
        assert_eq!(c.step_monitor_channel(false), Ok(13));
        assert_eq!(c.radio.channels().as_slice(), &[13, 1, 13]);
    }

    #[test]
    fn start_leaves_monitor_first() {
        let queue = CaptureQueue::new();
        let clock = ManualClock::default();
        let mut c = controller(&queue, &clock);
        c.start_monitor(3).unwrap();
        c.start().unwrap();

        assert_eq!(c.state(), SurveyState::Surveying);
        assert_eq!(
            c.radio.calls.as_slice(),
            &[
                RadioCall::EnterCapture,
                RadioCall::Channel(3),
                RadioCall::LeaveCapture,
                RadioCall::EnterCapture,
            ]
        );
    }
}
