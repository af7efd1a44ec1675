//! Trait definitions for hardware and network abstraction.
//!
//! This module defines the seams that allow snapcam to:
//! - Run its control loop on the ESP32-CAM or on desktop with mocks
//! - Swap camera, display, socket, and upload implementations
//!
//! # Submodules
//!
//! - `hardware`: Camera frames, trigger, indicator, clocks, delay
//! - `network`: WiFi join, realtime socket transport, upload transport
//! - `display`: Status display trait
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`FrameProvider`]: Encoded still images with explicit release
//! - [`TriggerInput`]: The local capture button
//! - [`StatusIndicator`]: Pulse patterns on the status LED
//! - [`Clock`]: Time source for `no_std` environments

pub mod display;
pub mod hardware;
pub mod network;

pub use display::*;
pub use hardware::*;
pub use network::*;
