//! [`Board`] over the STM32L4R9 registers.
//!
//! RCC, GPIO, DMA and DMAMUX go through `embassy_stm32::pac`; NVIC and the
//! priority grouping through the `cortex-m` core peripherals.

use cortex_m::peripheral::{NVIC, SCB};
use embassy_stm32::interrupt::Interrupt;
use embassy_stm32::pac;
use embassy_stm32::pac::bdma::vals::{Dir, Pl, Size};
use embassy_stm32::pac::gpio::vals::{Moder, Ospeedr, Ot, Pupdr};
use embassy_stm32::pac::rcc::vals::{Pllm, Plln, Pllr, Pllsai2divr, Pllsrc};
use embassy_time::{Duration, Instant};

use super::board::{Board, Irq, Level, Peripheral, Pin, PinConfig, PinMode, Port, Pull, Speed};
use super::dma::{
    ChannelFlags, DataSize, Direction, DmaChannel, DmaController, DmaInit, DmaMode, DmaPriority,
    Transfer,
};
use super::nvic::{Priority, PriorityGrouping};
use super::rcc::{HseState, OscConfig, PeriphClockConfig, PllSource, PllState};
use crate::error::{ClockDomain, ClockError};

const HSE_TIMEOUT: Duration = Duration::from_millis(100);
const PLLSAI2_TIMEOUT: Duration = Duration::from_millis(2);
const PLL_TIMEOUT: Duration = Duration::from_millis(2);

/// `AIRCR` write key
const AIRCR_VECTKEY: u32 = 0x05FA << 16;
const AIRCR_PRIGROUP_MASK: u32 = 0x7 << 8;

/// STM32L4R9 board. Owns the core peripherals it programs.
pub struct L4r9Board {
    nvic: NVIC,
    scb: SCB,
}

impl L4r9Board {
    pub fn new(nvic: NVIC, scb: SCB) -> Self {
        Self { nvic, scb }
    }
}

/// Spin until `ready` holds or `timeout` expires
fn wait_for(
    domain: ClockDomain,
    timeout: Duration,
    mut ready: impl FnMut() -> bool,
) -> Result<(), ClockError> {
    let deadline = Instant::now() + timeout;
    while !ready() {
        if Instant::now() > deadline {
            return Err(ClockError::Timeout(domain));
        }
    }
    Ok(())
}

fn pll_source(source: PllSource) -> Pllsrc {
    match source {
        PllSource::Msi => Pllsrc::MSI,
        PllSource::Hsi16 => Pllsrc::HSI,
        PllSource::Hse => Pllsrc::HSE,
    }
}

fn interrupt(irq: Irq) -> Interrupt {
    match irq {
        Irq::Ltdc => Interrupt::LTDC,
        Irq::LtdcError => Interrupt::LTDC_ER,
        Irq::Dsi => Interrupt::DSI,
        Irq::Dma1Channel5 => Interrupt::DMA1_CHANNEL5,
    }
}

fn gpio(port: Port) -> pac::gpio::Gpio {
    match port {
        Port::H => pac::GPIOH,
    }
}

fn dma(controller: DmaController) -> pac::bdma::Dma {
    match controller {
        DmaController::Dma1 => pac::DMA1,
        DmaController::Dma2 => pac::DMA2,
    }
}

fn size(size: DataSize) -> Size {
    match size {
        DataSize::Byte => Size::BITS8,
        DataSize::HalfWord => Size::BITS16,
        DataSize::Word => Size::BITS32,
    }
}

fn priority_level(priority: DmaPriority) -> Pl {
    match priority {
        DmaPriority::Low => Pl::LOW,
        DmaPriority::Medium => Pl::MEDIUM,
        DmaPriority::High => Pl::HIGH,
        DmaPriority::VeryHigh => Pl::VERYHIGH,
    }
}

fn set_reset(peripheral: Peripheral, reset: bool) {
    let rcc = pac::RCC;
    match peripheral {
        Peripheral::Ltdc => rcc.apb2rstr().modify(|w| w.set_ltdcrst(reset)),
        Peripheral::Dsi => rcc.apb2rstr().modify(|w| w.set_dsirst(reset)),
        Peripheral::Dma2d => rcc.ahb1rstr().modify(|w| w.set_dma2drst(reset)),
        Peripheral::Dma1 => rcc.ahb1rstr().modify(|w| w.set_dma1rst(reset)),
        Peripheral::Dma2 => rcc.ahb1rstr().modify(|w| w.set_dma2rst(reset)),
        Peripheral::Dmamux1 => rcc.ahb1rstr().modify(|w| w.set_dmamux1rst(reset)),
        Peripheral::GpioH => rcc.ahb2rstr().modify(|w| w.set_gpiohrst(reset)),
    }
}

impl Board for L4r9Board {
    fn enable_clock(&mut self, peripheral: Peripheral) {
        let rcc = pac::RCC;
        // Read back so the enable has reached the peripheral before it is used
        match peripheral {
            Peripheral::Ltdc => {
                rcc.apb2enr().modify(|w| w.set_ltdcen(true));
                rcc.apb2enr().read();
            }
            Peripheral::Dsi => {
                rcc.apb2enr().modify(|w| w.set_dsien(true));
                rcc.apb2enr().read();
            }
            Peripheral::Dma2d => {
                rcc.ahb1enr().modify(|w| w.set_dma2den(true));
                rcc.ahb1enr().read();
            }
            Peripheral::Dma1 => {
                rcc.ahb1enr().modify(|w| w.set_dma1en(true));
                rcc.ahb1enr().read();
            }
            Peripheral::Dma2 => {
                rcc.ahb1enr().modify(|w| w.set_dma2en(true));
                rcc.ahb1enr().read();
            }
            Peripheral::Dmamux1 => {
                rcc.ahb1enr().modify(|w| w.set_dmamux1en(true));
                rcc.ahb1enr().read();
            }
            Peripheral::GpioH => {
                rcc.ahb2enr().modify(|w| w.set_gpiohen(true));
                rcc.ahb2enr().read();
            }
        }
    }

    fn force_reset(&mut self, peripheral: Peripheral) {
        set_reset(peripheral, true);
    }

    fn release_reset(&mut self, peripheral: Peripheral) {
        set_reset(peripheral, false);
    }

    fn configure_kernel_clock(&mut self, config: &PeriphClockConfig) -> Result<(), ClockError> {
        let pll = &config.pllsai2;
        let rcc = pac::RCC;
        let source = pll_source(pll.source);

        // PLLSAI2 shares its input with the main PLL
        let current = rcc.pllcfgr().read().pllsrc();
        if current == Pllsrc::DISABLE {
            rcc.pllcfgr().modify(|w| w.set_pllsrc(source));
        } else if current != source {
            return Err(ClockError::InvalidPll);
        }

        // Factors may only change while the PLL is off
        rcc.cr().modify(|w| w.set_pllsai2on(false));
        wait_for(ClockDomain::PllSai2, PLLSAI2_TIMEOUT, || {
            !rcc.cr().read().pllsai2rdy()
        })?;

        rcc.pllsai2cfgr().write(|w| {
            w.set_pllm(Pllm::from_bits(pll.m - 1));
            w.set_plln(Plln::from_bits(pll.n));
            w.set_pllr(Pllr::from_bits(pll.r.bits()));
            w.set_pllren(true);
        });
        rcc.ccipr2()
            .modify(|w| w.set_pllsai2divr(Pllsai2divr::from_bits(config.ltdc_divider.bits())));

        rcc.cr().modify(|w| w.set_pllsai2on(true));
        wait_for(ClockDomain::PllSai2, PLLSAI2_TIMEOUT, || {
            rcc.cr().read().pllsai2rdy()
        })?;

        trace!("PLLSAI2 locked, VCO {} Hz", pll.vco_hz());
        Ok(())
    }

    fn oscillator_config(&self) -> OscConfig {
        let cr = pac::RCC.cr().read();
        let hse = HseState::from_bits(cr.hseon(), cr.hsebyp());
        let pll = if cr.pllon() { PllState::On } else { PllState::Off };
        OscConfig { hse, pll }
    }

    fn configure_oscillators(&mut self, config: &OscConfig) -> Result<(), ClockError> {
        let rcc = pac::RCC;

        match config.hse {
            HseState::Off => {
                rcc.cr().modify(|w| w.set_hseon(false));
                wait_for(ClockDomain::Hse, HSE_TIMEOUT, || !rcc.cr().read().hserdy())?;
                rcc.cr().modify(|w| w.set_hsebyp(false));
            }
            HseState::On | HseState::Bypass => {
                rcc.cr().modify(|w| {
                    w.set_hsebyp(config.hse == HseState::Bypass);
                    w.set_hseon(true);
                });
                wait_for(ClockDomain::Hse, HSE_TIMEOUT, || rcc.cr().read().hserdy())?;
            }
        }

        match config.pll {
            PllState::None => {}
            PllState::On => {
                rcc.cr().modify(|w| w.set_pllon(true));
                wait_for(ClockDomain::Pll, PLL_TIMEOUT, || rcc.cr().read().pllrdy())?;
            }
            PllState::Off => {
                rcc.cr().modify(|w| w.set_pllon(false));
                wait_for(ClockDomain::Pll, PLL_TIMEOUT, || !rcc.cr().read().pllrdy())?;
            }
        }

        Ok(())
    }

    fn configure_pin(&mut self, pin: Pin, config: &PinConfig) {
        let port = gpio(pin.port);
        let n = pin.index as usize;

        port.ospeedr().modify(|w| {
            w.set_ospeedr(
                n,
                match config.speed {
                    Speed::Low => Ospeedr::LOWSPEED,
                    Speed::Medium => Ospeedr::MEDIUMSPEED,
                    Speed::High => Ospeedr::HIGHSPEED,
                    Speed::VeryHigh => Ospeedr::VERYHIGHSPEED,
                },
            )
        });
        port.otyper().modify(|w| {
            w.set_ot(
                n,
                match config.mode {
                    PinMode::OutputOpenDrain => Ot::OPENDRAIN,
                    PinMode::OutputPushPull | PinMode::Input => Ot::PUSHPULL,
                },
            )
        });
        port.pupdr().modify(|w| {
            w.set_pupdr(
                n,
                match config.pull {
                    Pull::None => Pupdr::FLOATING,
                    Pull::Up => Pupdr::PULLUP,
                    Pull::Down => Pupdr::PULLDOWN,
                },
            )
        });
        port.moder().modify(|w| {
            w.set_moder(
                n,
                match config.mode {
                    PinMode::Input => Moder::INPUT,
                    PinMode::OutputPushPull | PinMode::OutputOpenDrain => Moder::OUTPUT,
                },
            )
        });
    }

    fn write_pin(&mut self, pin: Pin, level: Level) {
        let n = pin.index as usize;
        gpio(pin.port).bsrr().write(|w| match level {
            Level::High => w.set_bs(n, true),
            Level::Low => w.set_br(n, true),
        });
    }

    fn set_priority(&mut self, irq: Irq, priority: Priority) {
        let raw = priority.raw(self.priority_grouping());
        // SAFETY: bring-up runs before any of these lines are unmasked, so
        // no priority-based critical section can be broken
        unsafe { self.nvic.set_priority(interrupt(irq), raw) };
    }

    fn enable_irq(&mut self, irq: Irq) {
        // SAFETY: the line's priority has been set just before
        unsafe { NVIC::unmask(interrupt(irq)) };
    }

    fn priority_grouping(&self) -> PriorityGrouping {
        let prigroup = (self.scb.aircr.read() & AIRCR_PRIGROUP_MASK) >> 8;
        PriorityGrouping::from_prigroup(prigroup as u8)
    }

    fn set_priority_grouping(&mut self, grouping: PriorityGrouping) {
        let aircr = self.scb.aircr.read() & !(0xFFFF_0000 | AIRCR_PRIGROUP_MASK);
        let prigroup = u32::from(grouping.prigroup()) << 8;
        // SAFETY: only PRIGROUP changes; the reset request bits are written as 0
        unsafe { self.scb.aircr.write(aircr | AIRCR_VECTKEY | prigroup) };
    }

    fn dma_deinit(&mut self, channel: DmaChannel) {
        let regs = dma(channel.controller());
        let n = channel.index();
        let ch = regs.ch(n);

        ch.cr().modify(|w| w.set_en(false));
        ch.cr().write(|_| {});
        ch.ndtr().write(|w| w.set_ndt(0));
        ch.par().write_value(0);
        ch.mar().write_value(0);
        regs.ifcr().write(|w| w.set_gif(n, true));

        pac::DMAMUX1
            .ccr(channel.dmamux_channel())
            .write(|_| {});
    }

    fn dma_init(&mut self, channel: DmaChannel, init: &DmaInit) {
        let regs = dma(channel.controller());
        let n = channel.index();

        regs.ch(n).cr().write(|w| {
            match init.direction {
                Direction::PeriphToMemory => w.set_dir(Dir::FROM_PERIPHERAL),
                Direction::MemoryToPeriph => w.set_dir(Dir::FROM_MEMORY),
                Direction::MemoryToMemory => {
                    // CPAR is the source, CMAR the destination
                    w.set_dir(Dir::FROM_PERIPHERAL);
                    w.set_mem2mem(true);
                }
            }
            w.set_pinc(init.periph_inc);
            w.set_minc(init.mem_inc);
            w.set_psize(size(init.periph_align));
            w.set_msize(size(init.mem_align));
            w.set_circ(init.mode == DmaMode::Circular);
            w.set_pl(priority_level(init.priority));
        });

        pac::DMAMUX1
            .ccr(channel.dmamux_channel())
            .write(|w| w.set_dmareq_id(init.request.id()));
    }

    fn dma_start(&mut self, channel: DmaChannel, transfer: &Transfer) {
        let regs = dma(channel.controller());
        let n = channel.index();
        let ch = regs.ch(n);

        ch.cr().modify(|w| w.set_en(false));
        regs.ifcr().write(|w| w.set_gif(n, true));

        ch.ndtr().write(|w| w.set_ndt(transfer.items));
        ch.par().write_value(transfer.src);
        ch.mar().write_value(transfer.dst);

        // Channel interrupts stay off: embassy-stm32 owns the DMA vectors
        ch.cr().modify(|w| {
            w.set_tcie(false);
            w.set_htie(false);
            w.set_teie(false);
            w.set_en(true);
        });
    }

    fn dma_flags(&mut self, channel: DmaChannel) -> ChannelFlags {
        let isr = dma(channel.controller()).isr().read();
        let n = channel.index();

        ChannelFlags {
            transfer_complete: isr.tcif(n),
            half_transfer: isr.htif(n),
            transfer_error: isr.teif(n),
        }
    }

    fn dma_clear_flags(&mut self, channel: DmaChannel, flags: ChannelFlags) {
        let n = channel.index();

        // IFCR is write-1-to-clear, zero bits leave their flag pending
        dma(channel.controller()).ifcr().write(|w| {
            w.set_tcif(n, flags.transfer_complete);
            w.set_htif(n, flags.half_transfer);
            w.set_teif(n, flags.transfer_error);
        });
    }
}
