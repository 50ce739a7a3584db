//! Rendering orchestration for the textured spinning quad.
//!
//! This crate sits between the windowing layer and the RHI wrappers:
//! - Frame pacing and synchronization ([`frame`])
//! - Uniform buffer layouts ([`ubo`])
//! - Static quad geometry ([`quad`])
//! - Resource lifetimes and the per-frame render cycle ([`renderer`])

pub mod frame;
pub mod quad;
pub mod renderer;
pub mod ubo;

pub use frame::FrameSynchronizer;
pub use renderer::Renderer;

/// Maximum number of frames that can be in flight simultaneously.
pub use spinel_rhi::sync::MAX_FRAMES_IN_FLIGHT;
