//! Board collaborators driven from the DMA callbacks.
//!
//! This module contains the display refresh trigger and the status LEDs of the
//! STM32L4R9I-Discovery.

/// DSI display refresh
pub mod display;
/// User LEDs used as error indicators
pub mod status_led;
