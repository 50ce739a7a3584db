//! RHI-specific error types.
//!
//! All variants here are fatal for the operation that raised them. The
//! recoverable "swapchain is stale" condition is deliberately not an error:
//! it is reported through the [`AcquireResult`](crate::swapchain::AcquireResult)
//! and [`PresentResult`](crate::swapchain::PresentResult) outcome enums so it
//! can never be confused with a real failure.

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface query error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain creation failed: unusable surface or native creation failure
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Submitting work to the graphics queue failed (programming error or device loss)
    #[error("Queue submit failed: {0}")]
    QueueSubmitError(ash::vk::Result),

    /// Presenting an image failed with a code that does not mean "recreate"
    #[error("Queue present failed: {0}")]
    QueuePresentError(ash::vk::Result),

    /// Buffer creation or mapped-write error
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// Texture decode or upload error
    #[error("Texture error: {0}")]
    TextureError(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_errors_carry_the_native_code() {
        let submit = RhiError::QueueSubmitError(ash::vk::Result::ERROR_DEVICE_LOST);
        assert!(submit.to_string().contains("Queue submit failed"));

        let present = RhiError::QueuePresentError(ash::vk::Result::ERROR_SURFACE_LOST_KHR);
        assert!(present.to_string().contains("Queue present failed"));
    }

    #[test]
    fn vulkan_results_convert_into_rhi_errors() {
        let err: RhiError = ash::vk::Result::ERROR_OUT_OF_DEVICE_MEMORY.into();
        assert!(matches!(err, RhiError::VulkanError(_)));
    }
}
