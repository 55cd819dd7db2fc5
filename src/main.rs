//! airsurvey — passive WiFi access-point survey firmware
//!
//! Captures beacons in promiscuous mode, keeps a bounded directory of nearby
//! access points, watches for disconnect floods, and reports everything as
//! NDJSON over serial. Commands arrive as NDJSON lines on UART0.

#![no_std]
#![no_main]

extern crate alloc;

use esp_backtrace as _;

esp_bootloader_esp_idf::esp_app_desc!();

pub(crate) use airsurvey::{board, comm, protocol, radio, scanner, survey};

use core::sync::atomic::{AtomicBool, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Instant, Timer};
use esp_hal::delay::Delay;
use esp_hal::interrupt::software::SoftwareInterruptControl;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::Async;

use comm::LineReader;
use protocol::{DeviceMessage, HostCommand, VERSION};
use radio::{Clock, Radio, RadioError};
use scanner::CaptureQueue;
use survey::{SurveyConfig, SurveyController, SurveyState};

// ── Static channels and shared state ─────────────────────────────────

/// Frames from the WiFi sniffer ISR, drained by the survey tick
static CAPTURE_QUEUE: CaptureQueue = Channel::new();

/// Host commands parsed by the UART task
static CMD_CHANNEL: Channel<CriticalSectionRawMutex, HostCommand, 4> = Channel::new();

/// Drop non-management frames in the ISR while surveying, so data traffic
/// does not crowd beacons out of the capture queue.
static MGMT_ONLY: AtomicBool = AtomicBool::new(true);

/// Snapshot cadence on serial
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Host loop pacing between ticks
const LOOP_PERIOD: Duration = Duration::from_millis(10);

// ── Radio / clock backends ───────────────────────────────────────────

/// WiFi sniffer callback — called from ISR context by the esp-radio sniffer.
/// Copies the frame into the capture queue via `try_send` (non-blocking).
fn wifi_sniffer_callback(pkt: esp_radio::wifi::sniffer::PromiscuousPkt<'_>) {
    let data = pkt.data;
    if MGMT_ONLY.load(Ordering::Relaxed) && data.first().map_or(true, |fc| fc & 0x0C != 0) {
        return;
    }
    let _ = scanner::deliver_frame(
        &CAPTURE_QUEUE,
        data,
        pkt.rx_cntl.channel as u8,
        pkt.rx_cntl.rssi as i8,
    );
}

// FFI binding for WiFi channel control.
// The symbol is linked via esp-radio's WiFi driver.
unsafe extern "C" {
    fn esp_wifi_set_channel(primary: u8, second: u32) -> i32;
}

/// esp-radio sniffer as a [`Radio`].
struct SnifferRadio {
    sniffer: esp_radio::wifi::sniffer::Sniffer<'static>,
}

impl Radio for SnifferRadio {
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        let rc = unsafe { esp_wifi_set_channel(channel, 0) };
        if rc == 0 {
            Ok(())
        } else {
            Err(RadioError::Channel(channel))
        }
    }

    fn enter_capture(&mut self) -> Result<(), RadioError> {
        self.sniffer
            .set_promiscuous_mode(true)
            .map_err(|_| RadioError::ModeSwitch)
    }

    fn leave_capture(&mut self) -> Result<(), RadioError> {
        self.sniffer
            .set_promiscuous_mode(false)
            .map_err(|_| RadioError::ModeSwitch)
    }
}

struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

// ── Entry point ──────────────────────────────────────────────────────

#[esp_rtos::main]
async fn main(spawner: embassy_executor::Spawner) {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_alloc::heap_allocator!(size: 64 * 1024);

    // Start the RTOS — requires timer + software interrupt
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);

    log::info!("airsurvey v{} starting on {}", VERSION, board::BOARD_NAME);

    // Hold power on (M5StickC Plus2 needs GPIO4 HIGH to stay powered)
    #[cfg(feature = "board-m5stickc")]
    let _power_hold = esp_hal::gpio::Output::new(
        peripherals.GPIO4,
        esp_hal::gpio::Level::High,
        esp_hal::gpio::OutputConfig::default(),
    );

    // ── Serial command input ───────────────────────────────────────────

    #[cfg(feature = "esp32s3")]
    let rx_pin = peripherals.GPIO44;
    #[cfg(not(feature = "esp32s3"))]
    let rx_pin = peripherals.GPIO3;

    let uart = Uart::new(peripherals.UART0, UartConfig::default().with_baudrate(comm::SERIAL_BAUD))
        .expect("UART init failed")
        .with_rx(rx_pin)
        .into_async();
    spawner.spawn(command_task(uart)).unwrap();

    // ── WiFi sniffer initialization ─────────────────────────────────────

    let (_wifi_controller, wifi_interfaces) =
        esp_radio::wifi::new(peripherals.WIFI, Default::default()).expect("WiFi init failed");

    let mut sniffer = wifi_interfaces.sniffer;
    sniffer.set_receive_cb(wifi_sniffer_callback);

    log::info!("WiFi sniffer ready (capture off until start)");

    let mut survey = SurveyController::new(
        SnifferRadio { sniffer },
        EmbassyClock,
        Delay::new(),
        &CAPTURE_QUEUE,
        SurveyConfig::new(),
    );

    // ── Host loop ───────────────────────────────────────────────────────

    let cmd_rx = CMD_CHANNEL.receiver();
    let mut last_report = Instant::now();

    loop {
        while let Ok(cmd) = cmd_rx.try_receive() {
            if let Err(e) = comm::handle_command(&cmd, &mut survey) {
                log::error!("Command {:?} failed: {}", cmd, e);
                let mut detail = heapless::String::<48>::new();
                let _ = core::fmt::write(&mut detail, format_args!("{}", e));
                emit(&DeviceMessage::Error { detail: &detail });
            }
            MGMT_ONLY.store(survey.state() != SurveyState::Monitoring, Ordering::Relaxed);
            if matches!(cmd, HostCommand::GetStatus) {
                report(&survey);
            }
        }

        survey.tick();

        if last_report.elapsed() >= REPORT_INTERVAL {
            last_report = Instant::now();
            report(&survey);
        }

        Timer::after(LOOP_PERIOD).await;
    }
}

/// Write the current snapshot (or monitor graph) to serial.
fn report<R: Radio, C: Clock>(survey: &SurveyController<'_, R, C, Delay>) {
    let uptime_secs = (Instant::now().as_millis() / 1000) as u32;
    comm::emit_snapshot(&survey.snapshot(), uptime_secs, |buf| print_line(&buf));

    if survey.state() == SurveyState::Monitoring {
        let monitor = survey.monitor();
        emit(&DeviceMessage::Monitor {
            ch: monitor.channel(),
            total: monitor.total(),
            graph: monitor.graph(),
        });
    }
}

fn emit(msg: &DeviceMessage) {
    if let Some(buf) = comm::encode(msg) {
        print_line(&buf);
    }
}

fn print_line(buf: &[u8]) {
    if let Ok(s) = core::str::from_utf8(buf) {
        esp_println::println!("{}", s.trim_end());
    }
}

/// UART command task — accumulates NDJSON lines and forwards parsed
/// commands to the host loop.
#[embassy_executor::task]
async fn command_task(mut uart: Uart<'static, Async>) {
    let mut reader = LineReader::new();
    let mut buf = [0u8; 32];

    loop {
        match uart.read_async(&mut buf).await {
            Ok(n) => {
                for &byte in &buf[..n] {
                    if let Some(line) = reader.feed(byte) {
                        match comm::parse_command(line) {
                            Some(cmd) => {
                                let _ = CMD_CHANNEL.try_send(cmd);
                            }
                            None => log::warn!("Ignoring unrecognized command line"),
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("UART read error: {:?}", e);
                Timer::after(Duration::from_millis(100)).await;
            }
        }
    }
}
