#![no_std]

//! ESP32 board glue for the timekeeper: flash-backed state store, the
//! RTC-seeded wall clock, and SoftAP event plumbing.

pub mod clock;
pub mod storage;
pub mod wifi;
