//! DMA channel record for the STM32L4R9 DMA1/DMA2 + DMAMUX1 controllers.
//!
//! A [`DmaHandle`] carries the channel it drives, the configuration written at
//! init, the transfer state and the listener notified from the channel's
//! interrupt flags. The register work is delegated to [`Board`].

use super::board::Board;
use crate::error::DmaError;

/// DMA controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaController {
    Dma1,
    Dma2,
}

/// One channel of a DMA controller, numbered 1..=7 as in the reference manual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaChannel {
    controller: DmaController,
    number: u8,
}

impl DmaChannel {
    pub const DMA1_CH5: DmaChannel = DmaChannel {
        controller: DmaController::Dma1,
        number: 5,
    };

    /// Channel `number` of `controller`, `None` outside 1..=7
    pub const fn new(controller: DmaController, number: u8) -> Option<Self> {
        match number {
            1..=7 => Some(Self { controller, number }),
            _ => None,
        }
    }

    pub const fn controller(self) -> DmaController {
        self.controller
    }

    pub const fn number(self) -> u8 {
        self.number
    }

    /// Zero-based channel index within its controller
    pub const fn index(self) -> usize {
        self.number as usize - 1
    }

    /// DMAMUX1 output channel routed to this DMA channel.
    ///
    /// DMAMUX1 channels 0..=6 feed DMA1, 7..=13 feed DMA2.
    pub const fn dmamux_channel(self) -> usize {
        match self.controller {
            DmaController::Dma1 => self.index(),
            DmaController::Dma2 => 7 + self.index(),
        }
    }
}

/// DMAMUX request line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaRequest {
    /// No peripheral request, the channel runs as fast as the bus allows
    MemToMem,
    /// Peripheral request by DMAMUX input id
    Peripheral(u8),
}

impl DmaRequest {
    /// `DMAREQ_ID` value
    pub const fn id(self) -> u8 {
        match self {
            DmaRequest::MemToMem => 0,
            DmaRequest::Peripheral(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    PeriphToMemory,
    MemoryToPeriph,
    MemoryToMemory,
}

/// Width of one transfer item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataSize {
    Byte,
    HalfWord,
    Word,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaMode {
    /// Single shot, the channel stops when the counter reaches zero
    Normal,
    /// Counter reloads and the transfer restarts
    Circular,
}

/// Software priority between channels of the same controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaPriority {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Channel configuration written by [`DmaHandle::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaInit {
    pub request: DmaRequest,
    pub direction: Direction,
    pub periph_inc: bool,
    pub mem_inc: bool,
    pub periph_align: DataSize,
    pub mem_align: DataSize,
    pub mode: DmaMode,
    pub priority: DmaPriority,
}

impl DmaInit {
    /// Register reset values
    pub const RESET: DmaInit = DmaInit {
        request: DmaRequest::MemToMem,
        direction: Direction::PeriphToMemory,
        periph_inc: false,
        mem_inc: false,
        periph_align: DataSize::Byte,
        mem_align: DataSize::Byte,
        mode: DmaMode::Normal,
        priority: DmaPriority::Low,
    };

    /// Reject combinations the channel cannot run
    pub fn validate(&self) -> Result<(), DmaError> {
        if self.direction == Direction::MemoryToMemory && self.mode == DmaMode::Circular {
            return Err(DmaError::CircularMemToMem);
        }
        Ok(())
    }
}

impl Default for DmaInit {
    fn default() -> Self {
        Self::RESET
    }
}

/// One programmed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Transfer {
    /// Source address (`CPAR` for memory-to-memory)
    pub src: u32,
    /// Destination address (`CMAR` for memory-to-memory)
    pub dst: u32,
    /// Item count loaded into `CNDTR`
    pub items: u16,
}

/// Channel interrupt flags as read from `ISR`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFlags {
    pub transfer_complete: bool,
    pub half_transfer: bool,
    pub transfer_error: bool,
}

impl ChannelFlags {
    pub const fn is_empty(&self) -> bool {
        !(self.transfer_complete || self.half_transfer || self.transfer_error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaState {
    /// Not initialised
    Reset,
    /// Initialised and idle
    Ready,
    /// Transfer in flight
    Busy,
}

/// Receives the outcome of transfers on a [`DmaHandle`].
///
/// Called from whatever context services the channel flags, so keep it short.
pub trait TransferListener {
    fn transfer_complete(&self, channel: DmaChannel);
    fn transfer_error(&self, channel: DmaChannel);
}

/// DMA channel record
pub struct DmaHandle<'a> {
    /// Channel this record drives; must be set before init
    pub instance: Option<DmaChannel>,
    /// Configuration applied by [`DmaHandle::init`]
    pub init: DmaInit,
    state: DmaState,
    error: Option<DmaError>,
    listener: Option<&'a (dyn TransferListener + Sync)>,
}

impl<'a> DmaHandle<'a> {
    pub const fn new() -> Self {
        Self {
            instance: None,
            init: DmaInit::RESET,
            state: DmaState::Reset,
            error: None,
            listener: None,
        }
    }

    pub fn state(&self) -> DmaState {
        self.state
    }

    /// Error recorded by the last failed transfer
    pub fn error(&self) -> Option<DmaError> {
        self.error
    }

    /// Register the completion/error listener
    pub fn set_listener(&mut self, listener: &'a (dyn TransferListener + Sync)) {
        self.listener = Some(listener);
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    fn channel(&self) -> Result<DmaChannel, DmaError> {
        self.instance.ok_or(DmaError::NoInstance)
    }

    /// Return the channel to its reset configuration
    pub fn deinit<B: Board>(&mut self, board: &mut B) -> Result<(), DmaError> {
        let channel = self.channel()?;
        board.dma_deinit(channel);
        self.state = DmaState::Reset;
        self.error = None;
        Ok(())
    }

    /// Write [`DmaHandle::init`] to the channel
    pub fn init<B: Board>(&mut self, board: &mut B) -> Result<(), DmaError> {
        let channel = self.channel()?;
        if self.state == DmaState::Busy {
            return Err(DmaError::Busy);
        }
        self.init.validate()?;

        board.dma_init(channel, &self.init);
        self.state = DmaState::Ready;
        self.error = None;
        debug!("DMA channel {} initialised", channel.number);
        Ok(())
    }

    /// Start a transfer of `items` items from `src` to `dst`
    pub fn start<B: Board>(
        &mut self,
        board: &mut B,
        src: u32,
        dst: u32,
        items: usize,
    ) -> Result<(), DmaError> {
        let channel = self.channel()?;
        if self.state != DmaState::Ready {
            return Err(DmaError::Busy);
        }
        let items = match u16::try_from(items) {
            Ok(0) | Err(_) => return Err(DmaError::InvalidLength),
            Ok(n) => n,
        };

        self.state = DmaState::Busy;
        self.error = None;
        board.dma_start(channel, &Transfer { src, dst, items });
        Ok(())
    }

    /// Read the channel flags, clear the ones seen and dispatch them.
    ///
    /// Only the observed flags are cleared, so a flag raised after the read
    /// stays pending for the next call. Returns the state after dispatch.
    pub fn service<B: Board>(&mut self, board: &mut B) -> DmaState {
        let Some(channel) = self.instance else {
            return self.state;
        };

        let flags = board.dma_flags(channel);
        if !flags.is_empty() {
            board.dma_clear_flags(channel, flags);
            self.irq_handler(flags);
        }
        self.state
    }

    /// Give up on the transfer in flight.
    ///
    /// The channel is reset and re-initialised so the next [`start`](Self::start)
    /// can run, and the listener sees a transfer error.
    pub fn abort<B: Board>(&mut self, board: &mut B) -> Result<(), DmaError> {
        let channel = self.channel()?;
        self.deinit(board)?;
        self.init(board)?;
        self.error = Some(DmaError::Timeout);
        warn!("DMA channel {} timed out", channel.number);
        if let Some(listener) = self.listener {
            listener.transfer_error(channel);
        }
        Ok(())
    }

    /// Dispatch one interrupt worth of channel flags.
    ///
    /// An error wins over a completion raised in the same interrupt, and at
    /// most one listener call is made.
    pub fn irq_handler(&mut self, flags: ChannelFlags) {
        let Some(channel) = self.instance else {
            return;
        };

        if flags.transfer_error {
            self.state = DmaState::Ready;
            self.error = Some(DmaError::Transfer);
            warn!("DMA channel {} transfer error", channel.number);
            if let Some(listener) = self.listener {
                listener.transfer_error(channel);
            }
        } else if flags.transfer_complete {
            if self.init.mode == DmaMode::Normal {
                self.state = DmaState::Ready;
            }
            if let Some(listener) = self.listener {
                listener.transfer_complete(channel);
            }
        }
    }
}

impl Default for DmaHandle<'_> {
    fn default() -> Self {
        Self::new()
    }
}
