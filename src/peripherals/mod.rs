//! Peripheral bring-up for the STM32L4R9I-Discovery.
//!
//! One `msp_init` routine per peripheral, each generic over [`Board`]. The
//! firmware runs them against [`stm32l4r9::L4r9Board`]; tests run them against
//! a recording board.

pub mod board;
pub mod dcmi;
pub mod dma;
pub mod dma2d;
pub mod dsi;
pub mod ltdc;
pub mod nvic;
pub mod rcc;
#[cfg(feature = "firmware")]
pub mod stm32l4r9;
#[cfg(feature = "firmware")]
pub mod system;

pub use board::Board;
pub use dcmi::DcmiHandle;
pub use dma::{DmaHandle, TransferListener};
#[cfg(feature = "firmware")]
pub use stm32l4r9::L4r9Board;
#[cfg(feature = "firmware")]
pub use system::{init_system, Halt, SystemReset};
