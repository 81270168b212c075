//! Interrupt priorities for a Cortex-M4 with 4 implemented priority bits.
//!
//! A priority is a (preemption, sub) pair. How the 4 bits are split between the
//! two depends on the global grouping in `SCB->AIRCR`, so the same pair encodes
//! differently depending on the grouping active at the time it is written.

/// Number of priority bits implemented by the STM32L4R9 NVIC
pub const NVIC_PRIO_BITS: u8 = 4;

/// Split of the priority bits between preemption and sub priority.
///
/// The variant number is the count of preemption bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PriorityGrouping {
    /// 0 preemption bits, 4 sub priority bits
    Group0,
    /// 1 preemption bit, 3 sub priority bits
    Group1,
    /// 2 preemption bits, 2 sub priority bits
    Group2,
    /// 3 preemption bits, 1 sub priority bit
    Group3,
    /// 4 preemption bits, 0 sub priority bits
    Group4,
}

impl PriorityGrouping {
    /// Bits used for the preemption priority
    pub const fn preempt_bits(self) -> u8 {
        match self {
            PriorityGrouping::Group0 => 0,
            PriorityGrouping::Group1 => 1,
            PriorityGrouping::Group2 => 2,
            PriorityGrouping::Group3 => 3,
            PriorityGrouping::Group4 => 4,
        }
    }

    /// Bits used for the sub priority
    pub const fn sub_bits(self) -> u8 {
        NVIC_PRIO_BITS - self.preempt_bits()
    }

    /// Value of the `AIRCR.PRIGROUP` field selecting this grouping
    pub const fn prigroup(self) -> u8 {
        7 - self.preempt_bits()
    }

    /// Decode an `AIRCR.PRIGROUP` field.
    ///
    /// Groupings asking for more preemption bits than implemented saturate to
    /// [`PriorityGrouping::Group4`].
    pub const fn from_prigroup(prigroup: u8) -> Self {
        match prigroup & 0x7 {
            7 => PriorityGrouping::Group0,
            6 => PriorityGrouping::Group1,
            5 => PriorityGrouping::Group2,
            4 => PriorityGrouping::Group3,
            _ => PriorityGrouping::Group4,
        }
    }
}

/// Preemption and sub priority of one interrupt line. Lower values win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority {
    pub preempt: u8,
    pub sub: u8,
}

impl Priority {
    pub const fn new(preempt: u8, sub: u8) -> Self {
        Self { preempt, sub }
    }

    /// Encode into the 4-bit priority value under `grouping`.
    ///
    /// Each field is truncated to the bits the grouping gives it, matching
    /// `NVIC_EncodePriority`.
    pub const fn encode(self, grouping: PriorityGrouping) -> u8 {
        let preempt_bits = grouping.preempt_bits();
        let sub_bits = grouping.sub_bits();
        let preempt = self.preempt & ((1 << preempt_bits) - 1);
        let sub = self.sub & ((1 << sub_bits) - 1);
        (preempt << sub_bits) | sub
    }

    /// Value for the NVIC `IPR` byte: the encoded priority in the implemented upper bits
    pub const fn raw(self, grouping: PriorityGrouping) -> u8 {
        self.encode(grouping) << (8 - NVIC_PRIO_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group4_is_all_preemption() {
        assert_eq!(Priority::new(3, 0).encode(PriorityGrouping::Group4), 3);
        assert_eq!(Priority::new(3, 0).raw(PriorityGrouping::Group4), 0x30);
        // No sub priority bits: the sub value is dropped
        assert_eq!(Priority::new(3, 2).encode(PriorityGrouping::Group4), 3);
    }

    #[test]
    fn group0_is_all_sub_priority() {
        assert_eq!(Priority::new(0, 0).raw(PriorityGrouping::Group0), 0);
        assert_eq!(Priority::new(0, 5).encode(PriorityGrouping::Group0), 5);
        // No preemption bits: the preemption value is dropped
        assert_eq!(Priority::new(3, 0).encode(PriorityGrouping::Group0), 0);
    }

    #[test]
    fn mixed_grouping_packs_both_fields() {
        assert_eq!(Priority::new(2, 1).encode(PriorityGrouping::Group2), 0b1001);
        assert_eq!(Priority::new(1, 7).encode(PriorityGrouping::Group1), 0b1111);
    }

    #[test]
    fn prigroup_round_trips_and_saturates() {
        assert_eq!(PriorityGrouping::Group0.prigroup(), 7);
        assert_eq!(PriorityGrouping::Group4.prigroup(), 3);
        assert_eq!(PriorityGrouping::from_prigroup(5), PriorityGrouping::Group2);
        assert_eq!(PriorityGrouping::from_prigroup(0), PriorityGrouping::Group4);
    }
}
