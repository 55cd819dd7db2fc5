//! airsurvey library — passive WiFi access-point survey engine.
//!
//! This crate contains all frame classification, directory, sweep, watch
//! and protocol logic with no platform dependencies, testable on any host
//! with `cargo test --no-default-features`. The ESP32 firmware binary is a
//! thin consumer that provides the radio, a clock and the serial sink.
//!
//! Data flow:
//! - sniffer ISR → [`scanner::deliver_frame`] → bounded capture queue
//! - host loop → [`survey::SurveyController::tick`] → drain queue →
//!   [`scanner::classify`] → [`directory::ApDirectory::upsert`]
//! - UI / serial → [`survey::SurveyController::snapshot`]
//!
//! The engine is receive-only. [`radio::Radio`] has no transmit operation.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod comm;
pub mod defaults;
pub mod directory;
pub mod monitor;
pub mod protocol;
pub mod radio;
pub mod scanner;
pub mod schedule;
pub mod survey;
pub mod sweeper;
pub mod watch;
