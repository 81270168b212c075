//! Display refresh trigger.
//!
//! The panel runs in DSI adapted command mode: the LTDC only streams a frame to
//! the panel when the DSI wrapper is told to, so every new frame in the display
//! buffer needs an explicit refresh.

/// Push the current frame buffer to the panel
pub trait DisplayRefresh {
    /// Start sending one frame. Must be callable from interrupt context.
    fn refresh(&self);
}

#[cfg(feature = "firmware")]
pub use self::dsi::DsiRefresh;

#[cfg(feature = "firmware")]
mod dsi {
    use super::DisplayRefresh;
    use embassy_stm32::pac;

    /// Refresh through the DSI wrapper (`WCR.LTDCEN`).
    ///
    /// The bit clears itself once the LTDC has sent the frame.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DsiRefresh;

    impl DisplayRefresh for DsiRefresh {
        fn refresh(&self) {
            pac::DSIHOST.wcr().modify(|w| w.set_ltdcen(true));
        }
    }
}
