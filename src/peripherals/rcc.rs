//! Clock configuration values handed to [`Board`](super::board::Board).
//!
//! Only the pieces the bring-up routines touch are modelled: the PLLSAI2 that
//! feeds the LTDC kernel clock, and the HSE oscillator the DSI PLL runs from.

use crate::config::{HSE_FREQUENCY_HZ, HSI_FREQUENCY_HZ, MSI_FREQUENCY_HZ};
use crate::error::ClockError;

/// PLL input clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    Msi,
    Hsi16,
    Hse,
}

impl PllSource {
    /// Frequency of this source on this board
    pub const fn frequency_hz(self) -> u32 {
        match self {
            PllSource::Msi => MSI_FREQUENCY_HZ,
            PllSource::Hsi16 => HSI_FREQUENCY_HZ,
            PllSource::Hse => HSE_FREQUENCY_HZ,
        }
    }
}

/// PLLSAI2 R output divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllRDiv {
    Div2,
    Div4,
    Div6,
    Div8,
}

impl PllRDiv {
    pub const fn divisor(self) -> u32 {
        match self {
            PllRDiv::Div2 => 2,
            PllRDiv::Div4 => 4,
            PllRDiv::Div6 => 6,
            PllRDiv::Div8 => 8,
        }
    }

    /// `PLLSAI2R` field encoding
    pub const fn bits(self) -> u8 {
        match self {
            PllRDiv::Div2 => 0b00,
            PllRDiv::Div4 => 0b01,
            PllRDiv::Div6 => 0b10,
            PllRDiv::Div8 => 0b11,
        }
    }
}

/// Post divider between PLLSAI2 R and the LTDC kernel clock (`CCIPR2.PLLSAI2DIVR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LtdcDivider {
    Div2,
    Div4,
    Div8,
    Div16,
}

impl LtdcDivider {
    pub const fn divisor(self) -> u32 {
        match self {
            LtdcDivider::Div2 => 2,
            LtdcDivider::Div4 => 4,
            LtdcDivider::Div8 => 8,
            LtdcDivider::Div16 => 16,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            LtdcDivider::Div2 => 0b00,
            LtdcDivider::Div4 => 0b01,
            LtdcDivider::Div8 => 0b10,
            LtdcDivider::Div16 => 0b11,
        }
    }
}

/// PLLSAI2 factors. Only the R output is used (LTDC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllSai2Config {
    pub source: PllSource,
    /// Input divider, 1..=16
    pub m: u8,
    /// VCO multiplier, 8..=127
    pub n: u8,
    pub r: PllRDiv,
}

impl PllSai2Config {
    const VCO_INPUT_MIN_HZ: u32 = 2_660_000;
    const VCO_INPUT_MAX_HZ: u32 = 16_000_000;
    const VCO_OUTPUT_MIN_HZ: u32 = 64_000_000;
    const VCO_OUTPUT_MAX_HZ: u32 = 344_000_000;

    /// VCO input frequency (after M)
    pub const fn vco_input_hz(&self) -> u32 {
        self.source.frequency_hz() / self.m as u32
    }

    /// VCO output frequency (after N)
    pub const fn vco_hz(&self) -> u32 {
        self.vco_input_hz() * self.n as u32
    }

    /// Frequency on the R output
    pub const fn r_hz(&self) -> u32 {
        self.vco_hz() / self.r.divisor()
    }

    /// Check factor ranges and VCO limits
    pub fn validate(&self) -> Result<(), ClockError> {
        if !(1..=16).contains(&self.m) || !(8..=127).contains(&self.n) {
            return Err(ClockError::InvalidPll);
        }
        let vco_in = self.vco_input_hz();
        if !(Self::VCO_INPUT_MIN_HZ..=Self::VCO_INPUT_MAX_HZ).contains(&vco_in) {
            return Err(ClockError::InvalidPll);
        }
        let vco = self.vco_hz();
        if !(Self::VCO_OUTPUT_MIN_HZ..=Self::VCO_OUTPUT_MAX_HZ).contains(&vco) {
            return Err(ClockError::InvalidPll);
        }
        Ok(())
    }
}

/// Peripheral kernel clock selection. The LTDC is the only peripheral routed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeriphClockConfig {
    pub pllsai2: PllSai2Config,
    pub ltdc_divider: LtdcDivider,
}

impl PeriphClockConfig {
    /// LTDC kernel clock from PLLSAI2 R through the post divider
    pub const fn ltdc(pllsai2: PllSai2Config, ltdc_divider: LtdcDivider) -> Self {
        Self { pllsai2, ltdc_divider }
    }

    /// Resulting LTDC pixel clock
    pub const fn ltdc_clock_hz(&self) -> u32 {
        self.pllsai2.r_hz() / self.ltdc_divider.divisor()
    }
}

/// HSE oscillator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HseState {
    Off,
    On,
    /// External clock fed straight into OSC_IN
    Bypass,
}

impl HseState {
    /// Decode `RCC_CR.HSEON` and `RCC_CR.HSEBYP`. Bypass wins regardless of
    /// `HSEON`: OSC_IN is then driven by an external source.
    pub const fn from_bits(hseon: bool, hsebyp: bool) -> Self {
        match (hseon, hsebyp) {
            (_, true) => HseState::Bypass,
            (true, false) => HseState::On,
            (false, false) => HseState::Off,
        }
    }
}

/// Main PLL request in an oscillator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllState {
    /// Leave the main PLL as it is
    None,
    Off,
    On,
}

/// Oscillator configuration, as read back or as requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OscConfig {
    pub hse: HseState,
    pub pll: PllState,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LTDC_PLL: PllSai2Config = PllSai2Config {
        source: PllSource::Msi,
        m: 1,
        n: 60,
        r: PllRDiv::Div4,
    };

    #[test]
    fn display_pll_yields_15mhz_pixel_clock() {
        let config = PeriphClockConfig::ltdc(LTDC_PLL, LtdcDivider::Div4);
        assert_eq!(LTDC_PLL.vco_hz(), 240_000_000);
        assert_eq!(LTDC_PLL.r_hz(), 60_000_000);
        assert_eq!(config.ltdc_clock_hz(), 15_000_000);
        assert!(LTDC_PLL.validate().is_ok());
    }

    #[test]
    fn rejects_factors_out_of_range() {
        let bad_m = PllSai2Config { m: 0, ..LTDC_PLL };
        let bad_n = PllSai2Config { n: 128, ..LTDC_PLL };
        assert_eq!(bad_m.validate(), Err(ClockError::InvalidPll));
        assert_eq!(bad_n.validate(), Err(ClockError::InvalidPll));
    }

    #[test]
    fn rejects_vco_out_of_range() {
        // 4 MHz / 2 = 2 MHz VCO input is below the 2.66 MHz floor
        let low_input = PllSai2Config { m: 2, ..LTDC_PLL };
        assert_eq!(low_input.validate(), Err(ClockError::InvalidPll));

        // 16 MHz * 30 = 480 MHz VCO is over the 344 MHz ceiling
        let fast_vco = PllSai2Config {
            source: PllSource::Hse,
            n: 30,
            ..LTDC_PLL
        };
        assert_eq!(fast_vco.validate(), Err(ClockError::InvalidPll));
    }

    #[test]
    fn divider_encodings_match_the_register_layout() {
        assert_eq!(PllRDiv::Div4.bits(), 0b01);
        assert_eq!(LtdcDivider::Div4.bits(), 0b01);
        assert_eq!(LtdcDivider::Div16.divisor(), 16);
    }

    #[test]
    fn bypass_is_reported_even_with_hse_off() {
        assert_eq!(HseState::from_bits(false, true), HseState::Bypass);
        assert_eq!(HseState::from_bits(true, true), HseState::Bypass);
        assert_eq!(HseState::from_bits(true, false), HseState::On);
        assert_eq!(HseState::from_bits(false, false), HseState::Off);
    }
}
