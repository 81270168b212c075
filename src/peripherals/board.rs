//! The hardware surface the bring-up routines drive.
//!
//! Each method is one RCC, GPIO, NVIC or DMA operation. The firmware implements
//! it over the STM32L4R9 registers; the host tests implement it with a recorder.

use super::dma::{ChannelFlags, DmaChannel, DmaInit, Transfer};
use super::nvic::{Priority, PriorityGrouping};
use super::rcc::{OscConfig, PeriphClockConfig};
use crate::error::ClockError;

/// Peripherals with an RCC clock enable and reset line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    Ltdc,
    Dsi,
    Dma2d,
    Dma1,
    Dma2,
    Dmamux1,
    GpioH,
}

/// Interrupt lines armed during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    Ltdc,
    LtdcError,
    Dsi,
    Dma1Channel5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    H,
}

/// A GPIO pin, e.g. PH0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    pub port: Port,
    pub index: u8,
}

impl Pin {
    /// OSC_IN, held low while the HSE crystal starts
    pub const PH0: Pin = Pin {
        port: Port::H,
        index: 0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    OutputPushPull,
    OutputOpenDrain,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub mode: PinMode,
    pub pull: Pull,
    pub speed: Speed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Register-level operations used by the peripheral bring-up routines
pub trait Board {
    /// Enable the bus clock of `peripheral`
    fn enable_clock(&mut self, peripheral: Peripheral);
    /// Assert the RCC reset line of `peripheral`
    fn force_reset(&mut self, peripheral: Peripheral);
    /// Release the RCC reset line of `peripheral`
    fn release_reset(&mut self, peripheral: Peripheral);

    /// Start PLLSAI2 and route it to the LTDC kernel clock. `config` has been
    /// validated by the caller.
    fn configure_kernel_clock(&mut self, config: &PeriphClockConfig) -> Result<(), ClockError>;
    /// Current oscillator state
    fn oscillator_config(&self) -> OscConfig;
    /// Apply an oscillator request and wait for the oscillators to settle
    fn configure_oscillators(&mut self, config: &OscConfig) -> Result<(), ClockError>;

    fn configure_pin(&mut self, pin: Pin, config: &PinConfig);
    fn write_pin(&mut self, pin: Pin, level: Level);

    /// Set the priority of `irq`, encoded under the current grouping
    fn set_priority(&mut self, irq: Irq, priority: Priority);
    fn enable_irq(&mut self, irq: Irq);
    fn priority_grouping(&self) -> PriorityGrouping;
    fn set_priority_grouping(&mut self, grouping: PriorityGrouping);

    /// Disable the channel and clear its configuration and flags
    fn dma_deinit(&mut self, channel: DmaChannel);
    /// Write the channel configuration and request routing, channel left disabled
    fn dma_init(&mut self, channel: DmaChannel, init: &DmaInit);
    /// Program addresses and count, then enable the channel
    fn dma_start(&mut self, channel: DmaChannel, transfer: &Transfer);
    /// Read the channel's interrupt flags
    fn dma_flags(&mut self, channel: DmaChannel) -> ChannelFlags;
    /// Clear exactly the given flags, leaving any others pending
    fn dma_clear_flags(&mut self, channel: DmaChannel, flags: ChannelFlags);
}
