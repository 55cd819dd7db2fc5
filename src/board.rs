/// Hardware abstraction for supported boards.
///
/// Each board module defines pin assignments and capabilities
/// selected at compile time via feature flags.

#[cfg(feature = "board-xiao")]
mod hw {
    pub const LED_PIN: u8 = 9; // WS2812 addressable LED
    pub const HAS_PSRAM: bool = true;
    pub const HAS_DISPLAY: bool = false;
    pub const BOARD_NAME: &str = "xiao_esp32s3";
}

#[cfg(all(feature = "board-m5stickc", not(feature = "board-xiao")))]
mod hw {
    pub const LED_PIN: u8 = 10; // Built-in LED
    pub const HAS_PSRAM: bool = false;
    pub const HAS_DISPLAY: bool = true;
    /// GPIO that must be held high to keep the M5StickC Plus2 powered.
    pub const POWER_HOLD_PIN: u8 = 4;
    pub const BOARD_NAME: &str = "m5stickc_plus2";
}

#[cfg(not(any(feature = "board-xiao", feature = "board-m5stickc")))]
mod hw {
    pub const BOARD_NAME: &str = "unknown";
}

pub use hw::*;
