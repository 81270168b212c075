//! Status LEDs.

/// User LEDs on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    Led1,
    Led2,
}

/// Switch a status LED on. Must be callable from interrupt context.
pub trait StatusLeds {
    fn on(&self, led: Led);
}

#[cfg(feature = "firmware")]
pub use self::board::{BoardLeds, LedPeripherals};

#[cfg(feature = "firmware")]
mod board {
    use super::{Led, StatusLeds};
    use core::cell::RefCell;
    use embassy_stm32::{
        gpio::{Level, Output, Speed},
        peripherals::{PB13, PH4},
        Peri,
    };
    use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

    /// Peripheral collection for the status LEDs
    pub struct LedPeripherals<'d> {
        pub led1: Peri<'d, PB13>,
        pub led2: Peri<'d, PH4>,
    }

    /// Macro to claim peripherals for BoardLeds
    #[macro_export]
    macro_rules! claim_leds {
        ($peripherals:expr) => {{
            $crate::drivers::status_led::LedPeripherals {
                led1: $peripherals.PB13,
                led2: $peripherals.PH4,
            }
        }};
    }

    /// The two user LEDs, shareable with interrupt context
    pub struct BoardLeds<'d> {
        leds: Mutex<CriticalSectionRawMutex, RefCell<[Output<'d>; 2]>>,
    }

    impl<'d> BoardLeds<'d> {
        /// Claim the LED pins, both LEDs off
        pub fn new(peripherals: LedPeripherals<'d>) -> Self {
            let led1 = Output::new(peripherals.led1, Level::Low, Speed::Low);
            let led2 = Output::new(peripherals.led2, Level::Low, Speed::Low);

            Self {
                leds: Mutex::new(RefCell::new([led1, led2])),
            }
        }
    }

    impl StatusLeds for BoardLeds<'_> {
        fn on(&self, led: Led) {
            let index = match led {
                Led::Led1 => 0,
                Led::Led2 => 1,
            };
            self.leds.lock(|leds| leds.borrow_mut()[index].set_high());
        }
    }
}
