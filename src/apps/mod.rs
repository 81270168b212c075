//! Application layer for the camera-to-display pipeline.
//!
//! Applications use the bring-up done by the peripherals layer and the board
//! collaborators from the drivers layer.

/// Frame copy from the capture buffer to the display buffer
pub mod capture;
