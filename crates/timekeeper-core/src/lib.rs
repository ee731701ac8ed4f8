#![cfg_attr(not(test), no_std)]

//! Platform-independent daily check-in logic: state machine, calendar math,
//! persisted record codec, and display-frame derivation.

pub mod app;
pub mod clock;
pub mod render;
pub mod state;
