//! Texture loading and sampling.
//!
//! This module turns an image file into a GPU texture ready for fragment
//! shader reads.
//!
//! # Overview
//!
//! - [`Texture`] owns a sampled [`Image2D`] and its VkSampler
//! - [`Texture::from_file`] decodes PNG or JPEG via the `image` crate
//! - Pixel data moves through a staging buffer and a one-time transfer
//!   submission that transitions the image to `SHADER_READ_ONLY_OPTIMAL`
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use spinel_rhi::command::CommandPool;
//! use spinel_rhi::device::Device;
//! use spinel_rhi::texture::Texture;
//!
//! # fn example(device: Arc<Device>, pool: &CommandPool) -> Result<(), spinel_rhi::RhiError> {
//! let texture = Texture::from_file(device, pool, Path::new("assets/textures/statue.jpg"))?;
//! let descriptor = texture.descriptor_info();
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::buffer::{Buffer, BufferUsage};
use crate::command::{CommandPool, submit_one_time};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::Image2D;

/// Format used for all decoded textures.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Returns the byte length of tightly packed RGBA8 pixel data.
fn rgba8_byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Returns the subresource range covering the single color mip level.
fn color_subresource_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

/// Sampled 2D texture with linear filtering and repeat addressing.
///
/// After construction the underlying image is in `SHADER_READ_ONLY_OPTIMAL`
/// layout and stays there for its whole lifetime.
pub struct Texture {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Backing image and view.
    image: Image2D,
    /// Vulkan sampler handle.
    sampler: vk::Sampler,
}

impl Texture {
    /// Loads a texture from an image file.
    ///
    /// The file is decoded on the CPU, converted to RGBA8, and uploaded
    /// through a staging buffer. Decoding failures (missing file,
    /// unsupported format, corrupt data) are reported as
    /// [`RhiError::TextureError`].
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool for the one-time transfer submission
    /// * `path` - Path to a PNG or JPEG file
    ///
    /// # Errors
    ///
    /// Returns an error if decoding, upload, or sampler creation fails.
    pub fn from_file(device: Arc<Device>, pool: &CommandPool, path: &Path) -> RhiResult<Self> {
        let img = image::open(path)
            .map_err(|e| {
                RhiError::TextureError(format!("Failed to decode '{}': {}", path.display(), e))
            })?
            .into_rgba8();

        let (width, height) = img.dimensions();
        let pixels = img.into_raw();

        info!("Decoded texture '{}': {}x{}", path.display(), width, height);

        Self::from_rgba8(device, pool, width, height, &pixels)
    }

    /// Creates a texture from raw RGBA8 pixel data.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool for the one-time transfer submission
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `pixels` - Tightly packed RGBA8 data, `width * height * 4` bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel data length does not match the
    /// dimensions, or if upload or sampler creation fails.
    pub fn from_rgba8(
        device: Arc<Device>,
        pool: &CommandPool,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> RhiResult<Self> {
        let expected = rgba8_byte_len(width, height);
        if pixels.len() != expected {
            return Err(RhiError::TextureError(format!(
                "Pixel data is {} bytes, expected {} for {}x{} RGBA8",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;
        let image = Image2D::sampled(device.clone(), width, height, TEXTURE_FORMAT)?;

        upload_pixels(pool, &staging, &image)?;

        let sampler = create_sampler(&device)?;

        debug!("Created texture: {}x{}", width, height);

        Ok(Self {
            device,
            image,
            sampler,
        })
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image.image_view()
    }

    /// Returns the Vulkan sampler handle.
    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Returns the texture extent (width and height).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }

    /// Returns the descriptor image info for combined image sampler bindings.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.image.image_view(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
        debug!("Texture sampler destroyed");
        // The image and its allocation are released by Image2D's Drop.
    }
}

/// Copies staged pixel data into the image and leaves it shader-readable.
///
/// Records and submits a single command buffer that transitions the image
/// from `UNDEFINED` to `TRANSFER_DST_OPTIMAL`, copies the buffer contents,
/// and transitions to `SHADER_READ_ONLY_OPTIMAL`.
fn upload_pixels(pool: &CommandPool, staging: &Buffer, image: &Image2D) -> RhiResult<()> {
    let extent = image.extent();

    submit_one_time(pool, |cmd| {
        let to_transfer = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::UNDEFINED)
            .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.handle())
            .subresource_range(color_subresource_range())
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);

        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            &[to_transfer],
        );

        let region = vk::BufferImageCopy::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .mip_level(0)
                    .base_array_layer(0)
                    .layer_count(1),
            )
            .image_offset(vk::Offset3D::default())
            .image_extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            });

        cmd.copy_buffer_to_image(
            staging.handle(),
            image.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );

        let to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image.handle())
            .subresource_range(color_subresource_range())
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);

        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            &[to_shader],
        );
    })
}

/// Creates the texture sampler.
///
/// Linear filtering, repeat addressing on all axes, and anisotropic
/// filtering clamped to the device limit.
fn create_sampler(device: &Device) -> RhiResult<vk::Sampler> {
    let max_anisotropy = device.limits().max_sampler_anisotropy.min(16.0);

    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(max_anisotropy)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(0.0);

    let sampler = unsafe { device.handle().create_sampler(&create_info, None)? };

    debug!("Created sampler with max anisotropy {}", max_anisotropy);

    Ok(sampler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_format_is_srgb() {
        assert_eq!(TEXTURE_FORMAT, vk::Format::R8G8B8A8_SRGB);
    }

    #[test]
    fn rgba8_byte_len_is_four_bytes_per_pixel() {
        assert_eq!(rgba8_byte_len(2, 3), 24);
        assert_eq!(rgba8_byte_len(1024, 1024), 4 * 1024 * 1024);
        assert_eq!(rgba8_byte_len(0, 100), 0);
    }

    #[test]
    fn color_subresource_covers_single_mip() {
        let range = color_subresource_range();
        assert_eq!(range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!(range.base_mip_level, 0);
        assert_eq!(range.level_count, 1);
        assert_eq!(range.base_array_layer, 0);
        assert_eq!(range.layer_count, 1);
    }
}
