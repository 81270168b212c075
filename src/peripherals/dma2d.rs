//! DMA2D (Chrom-ART) low-level bring-up. Clock and reset only, no interrupts.

use super::board::{Board, Peripheral};

pub fn msp_init<B: Board>(board: &mut B) {
    board.enable_clock(Peripheral::Dma2d);

    board.force_reset(Peripheral::Dma2d);
    board.release_reset(Peripheral::Dma2d);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockBoard};

    #[test]
    fn enables_then_resets() {
        let mut board = MockBoard::new();
        msp_init(&mut board);

        assert_eq!(
            board.calls(),
            [
                Call::EnableClock(Peripheral::Dma2d),
                Call::ForceReset(Peripheral::Dma2d),
                Call::ReleaseReset(Peripheral::Dma2d),
            ]
        );
    }
}
