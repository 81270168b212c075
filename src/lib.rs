//! Camera-to-display bring-up for the STM32L4R9I-Discovery.
//!
//! Clock trees, DMA channels and interrupt priorities for the LTDC display
//! controller, the DSI host, the DMA2D blitter and the DCMI camera interface.
//!
//! The bring-up routines in [`peripherals`] are generic over
//! [`peripherals::Board`] and build on the host. The `firmware` feature adds the
//! STM32L4R9 register implementation, the board collaborators and the tasks
//! used by the binary.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod apps;
pub mod config;
pub mod drivers;
pub mod error;
pub mod peripherals;

#[cfg(test)]
mod testing;

pub use error::{Error, FaultHandler, OrFault, Result};
