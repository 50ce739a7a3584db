//! Platform abstraction layer for the Spinel renderer.
//!
//! This crate provides platform-specific functionality:
//! - Window management via winit
//! - Vulkan surface creation and required-extension enumeration

mod window;

pub use window::{Surface, Window, get_required_extensions};
