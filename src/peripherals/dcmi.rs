//! DCMI low-level bring-up: the memory-to-memory DMA channel that copies
//! captured frames to the display buffer.
//!
//! The capture path itself (DCMI pins, timing, the peripheral-to-memory
//! channel) is configured by the camera driver and is not part of this module.

use super::board::{Board, Irq, Peripheral};
use super::dma::{
    DataSize, Direction, DmaHandle, DmaInit, DmaMode, DmaPriority, DmaRequest, TransferListener,
};
use super::nvic::PriorityGrouping;
use crate::config::{M2M_DMA_CHANNEL, M2M_DMA_IRQ_PRIORITY};
use crate::error::Result;

/// Word-wide, incrementing, single-shot copy at high priority
pub const M2M_DMA_INIT: DmaInit = DmaInit {
    request: DmaRequest::MemToMem,
    direction: Direction::MemoryToMemory,
    periph_inc: true,
    mem_inc: true,
    periph_align: DataSize::Word,
    mem_align: DataSize::Word,
    mode: DmaMode::Normal,
    priority: DmaPriority::High,
};

/// DCMI handle, owner of the frame copy DMA record for the lifetime of the firmware
pub struct DcmiHandle<'a> {
    pub m2m_dma: DmaHandle<'a>,
}

impl DcmiHandle<'_> {
    pub const fn new() -> Self {
        Self {
            m2m_dma: DmaHandle::new(),
        }
    }
}

impl Default for DcmiHandle<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bring up the frame copy channel and attach `listener` to it.
///
/// Sets the NVIC priority grouping to [`PriorityGrouping::Group0`] for the
/// whole chip. Priorities written earlier under another grouping keep their raw
/// value and so change meaning; a warning is logged when that happens.
///
/// # Errors
///
/// Returns [`Error::Dma`](crate::error::Error::Dma) if the channel cannot be
/// re-initialised.
pub fn msp_init<'a, B: Board>(
    board: &mut B,
    dcmi: &mut DcmiHandle<'a>,
    listener: &'a (dyn TransferListener + Sync),
) -> Result<()> {
    board.enable_clock(Peripheral::Dma1);
    board.enable_clock(Peripheral::Dma2);
    board.enable_clock(Peripheral::Dmamux1);

    let dma = &mut dcmi.m2m_dma;
    dma.init = M2M_DMA_INIT;
    dma.instance = Some(M2M_DMA_CHANNEL);

    board.set_priority(Irq::Dma1Channel5, M2M_DMA_IRQ_PRIORITY);
    board.enable_irq(Irq::Dma1Channel5);

    dma.deinit(board)?;
    dma.init(board)?;

    let previous = board.priority_grouping();
    if previous != PriorityGrouping::Group0 {
        warn!(
            "NVIC grouping {} -> Group0, earlier priorities are now sub priorities",
            previous
        );
    }
    board.set_priority_grouping(PriorityGrouping::Group0);

    dma.set_listener(listener);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peripherals::dma::{ChannelFlags, DmaChannel, DmaState};
    use crate::peripherals::nvic::Priority;
    use crate::testing::{Call, CountingListener, MockBoard};

    #[test]
    fn configures_the_copy_channel_exactly() {
        let mut board = MockBoard::new();
        let listener = CountingListener::default();
        let mut dcmi = DcmiHandle::new();

        msp_init(&mut board, &mut dcmi, &listener).unwrap();

        let init = &dcmi.m2m_dma.init;
        assert_eq!(init.request, DmaRequest::MemToMem);
        assert_eq!(init.direction, Direction::MemoryToMemory);
        assert!(init.periph_inc && init.mem_inc);
        assert_eq!(init.periph_align, DataSize::Word);
        assert_eq!(init.mem_align, DataSize::Word);
        assert_eq!(init.mode, DmaMode::Normal);
        assert_eq!(init.priority, DmaPriority::High);
        assert_eq!(dcmi.m2m_dma.instance, Some(DmaChannel::DMA1_CH5));
        assert_eq!(dcmi.m2m_dma.state(), DmaState::Ready);
        assert!(dcmi.m2m_dma.has_listener());
    }

    #[test]
    fn performs_the_bring_up_sequence() {
        let mut board = MockBoard::new();
        let listener = CountingListener::default();
        let mut dcmi = DcmiHandle::new();

        msp_init(&mut board, &mut dcmi, &listener).unwrap();

        assert_eq!(
            board.calls(),
            [
                Call::EnableClock(Peripheral::Dma1),
                Call::EnableClock(Peripheral::Dma2),
                Call::EnableClock(Peripheral::Dmamux1),
                Call::SetPriority(Irq::Dma1Channel5, Priority::new(0, 0)),
                Call::EnableIrq(Irq::Dma1Channel5),
                Call::DmaDeinit(DmaChannel::DMA1_CH5),
                Call::DmaInit(DmaChannel::DMA1_CH5, M2M_DMA_INIT),
                Call::SetPriorityGrouping(PriorityGrouping::Group0),
            ]
        );
        assert_eq!(board.grouping, PriorityGrouping::Group0);
    }

    #[test]
    fn bring_up_again_resets_a_busy_channel() {
        let mut board = MockBoard::new();
        let listener = CountingListener::default();
        let mut dcmi = DcmiHandle::new();
        msp_init(&mut board, &mut dcmi, &listener).unwrap();
        dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 16).unwrap();

        // deinit forces the channel back to reset, so a second bring-up succeeds
        msp_init(&mut board, &mut dcmi, &listener).unwrap();
        assert_eq!(dcmi.m2m_dma.state(), DmaState::Ready);
    }

    #[test]
    fn registered_listener_receives_channel_events() {
        let mut board = MockBoard::new();
        let listener = CountingListener::default();
        let mut dcmi = DcmiHandle::new();
        msp_init(&mut board, &mut dcmi, &listener).unwrap();

        dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 16).unwrap();
        dcmi.m2m_dma.irq_handler(ChannelFlags {
            transfer_complete: true,
            ..Default::default()
        });
        dcmi.m2m_dma.start(&mut board, 0x2000_0000, 0x2004_0000, 16).unwrap();
        dcmi.m2m_dma.irq_handler(ChannelFlags {
            transfer_error: true,
            ..Default::default()
        });

        assert_eq!(listener.completed(), 1);
        assert_eq!(listener.failed(), 1);
    }
}
