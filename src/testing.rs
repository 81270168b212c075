//! Test doubles for running the bring-up routines on the host.
//!
//! [`MockBoard`] records every register-level operation in order so tests can
//! assert on the exact sequence a routine performs.

extern crate std;

use core::cell::RefCell;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::vec::Vec;

use crate::drivers::display::DisplayRefresh;
use crate::drivers::status_led::{Led, StatusLeds};
use crate::error::ClockError;
use crate::peripherals::board::{Board, Irq, Level, Peripheral, Pin, PinConfig};
use crate::peripherals::dma::{ChannelFlags, DmaChannel, DmaInit, TransferListener, Transfer};
use crate::peripherals::nvic::{Priority, PriorityGrouping};
use crate::peripherals::rcc::{HseState, OscConfig, PeriphClockConfig, PllState};

/// One recorded board operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    EnableClock(Peripheral),
    ForceReset(Peripheral),
    ReleaseReset(Peripheral),
    ConfigureKernelClock(PeriphClockConfig),
    ReadOscillators,
    ConfigureOscillators(OscConfig),
    ConfigurePin(Pin, PinConfig),
    WritePin(Pin, Level),
    SetPriority(Irq, Priority),
    EnableIrq(Irq),
    SetPriorityGrouping(PriorityGrouping),
    DmaDeinit(DmaChannel),
    DmaInit(DmaChannel, DmaInit),
    DmaStart(DmaChannel, Transfer),
    DmaFlags(DmaChannel),
    DmaClearFlags(DmaChannel, ChannelFlags),
}

/// Recording [`Board`] with scriptable failures
#[derive(Debug)]
pub struct MockBoard {
    calls: RefCell<Vec<Call>>,
    pub oscillators: OscConfig,
    pub grouping: PriorityGrouping,
    pub kernel_clock_result: Result<(), ClockError>,
    pub oscillator_result: Result<(), ClockError>,
    /// Channel `ISR` contents
    pub pending_flags: ChannelFlags,
    /// Raised by the hardware right after the next flag read
    pub flags_after_read: ChannelFlags,
}

impl MockBoard {
    /// Board straight after reset: HSE off, grouping 4 as set by the startup code
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            oscillators: OscConfig {
                hse: HseState::Off,
                pll: PllState::On,
            },
            grouping: PriorityGrouping::Group4,
            kernel_clock_result: Ok(()),
            oscillator_result: Ok(()),
            pending_flags: ChannelFlags::default(),
            flags_after_read: ChannelFlags::default(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Position of the first call equal to `call`
    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c == call)
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for MockBoard {
    fn enable_clock(&mut self, peripheral: Peripheral) {
        self.record(Call::EnableClock(peripheral));
    }

    fn force_reset(&mut self, peripheral: Peripheral) {
        self.record(Call::ForceReset(peripheral));
    }

    fn release_reset(&mut self, peripheral: Peripheral) {
        self.record(Call::ReleaseReset(peripheral));
    }

    fn configure_kernel_clock(&mut self, config: &PeriphClockConfig) -> Result<(), ClockError> {
        self.record(Call::ConfigureKernelClock(*config));
        self.kernel_clock_result
    }

    fn oscillator_config(&self) -> OscConfig {
        self.record(Call::ReadOscillators);
        self.oscillators
    }

    fn configure_oscillators(&mut self, config: &OscConfig) -> Result<(), ClockError> {
        self.record(Call::ConfigureOscillators(*config));
        self.oscillator_result?;
        self.oscillators.hse = config.hse;
        Ok(())
    }

    fn configure_pin(&mut self, pin: Pin, config: &PinConfig) {
        self.record(Call::ConfigurePin(pin, *config));
    }

    fn write_pin(&mut self, pin: Pin, level: Level) {
        self.record(Call::WritePin(pin, level));
    }

    fn set_priority(&mut self, irq: Irq, priority: Priority) {
        self.record(Call::SetPriority(irq, priority));
    }

    fn enable_irq(&mut self, irq: Irq) {
        self.record(Call::EnableIrq(irq));
    }

    fn priority_grouping(&self) -> PriorityGrouping {
        self.grouping
    }

    fn set_priority_grouping(&mut self, grouping: PriorityGrouping) {
        self.record(Call::SetPriorityGrouping(grouping));
        self.grouping = grouping;
    }

    fn dma_deinit(&mut self, channel: DmaChannel) {
        self.record(Call::DmaDeinit(channel));
    }

    fn dma_init(&mut self, channel: DmaChannel, init: &DmaInit) {
        self.record(Call::DmaInit(channel, *init));
    }

    fn dma_start(&mut self, channel: DmaChannel, transfer: &Transfer) {
        self.record(Call::DmaStart(channel, *transfer));
    }

    fn dma_flags(&mut self, channel: DmaChannel) -> ChannelFlags {
        self.record(Call::DmaFlags(channel));
        let seen = self.pending_flags;
        let late = core::mem::take(&mut self.flags_after_read);
        self.pending_flags.transfer_complete |= late.transfer_complete;
        self.pending_flags.half_transfer |= late.half_transfer;
        self.pending_flags.transfer_error |= late.transfer_error;
        seen
    }

    fn dma_clear_flags(&mut self, channel: DmaChannel, flags: ChannelFlags) {
        self.record(Call::DmaClearFlags(channel, flags));
        self.pending_flags.transfer_complete &= !flags.transfer_complete;
        self.pending_flags.half_transfer &= !flags.half_transfer;
        self.pending_flags.transfer_error &= !flags.transfer_error;
    }
}

/// Listener counting callbacks
#[derive(Debug, Default)]
pub struct CountingListener {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl CountingListener {
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }
}

impl TransferListener for CountingListener {
    fn transfer_complete(&self, _channel: DmaChannel) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn transfer_error(&self, _channel: DmaChannel) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Display counting refresh requests
#[derive(Debug, Default)]
pub struct CountingDisplay {
    refreshes: AtomicUsize,
}

impl CountingDisplay {
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }
}

impl DisplayRefresh for CountingDisplay {
    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }
}

/// LEDs recording every switch-on
#[derive(Debug, Default)]
pub struct RecordingLeds {
    lit: Mutex<Vec<Led>>,
}

impl RecordingLeds {
    pub fn lit(&self) -> Vec<Led> {
        self.lit.lock().unwrap().clone()
    }
}

impl StatusLeds for RecordingLeds {
    fn on(&self, led: Led) {
        self.lit.lock().unwrap().push(led);
    }
}
