//! Frame pacing and synchronization.
//!
//! The renderer keeps [`MAX_FRAMES_IN_FLIGHT`] frame slots and cycles through
//! them round-robin. Each slot owns the semaphore pair that orders one frame's
//! acquire -> render -> present chain on the GPU, plus the fence the CPU waits
//! on before reusing the slot.
//!
//! Because the number of frame slots and the number of swapchain images differ,
//! a slot's fence can come up for reuse while an earlier frame is still
//! rendering into the image the new frame just acquired. The
//! [`ImageFenceTable`] tracks which slot fence (if any) last rendered to each
//! image so [`FrameSynchronizer::claim_image`] can wait out that hazard before
//! the image is reused.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use spinel_rhi::RhiResult;
use spinel_rhi::device::Device;
use spinel_rhi::sync::{Fence, MAX_FRAMES_IN_FLIGHT, Semaphore};

/// Synchronization objects for one frame slot.
///
/// The fence starts signaled so the first wait on a fresh slot returns
/// immediately.
struct FrameSlot {
    /// Signaled when the acquired swapchain image is ready to be rendered to.
    image_available: Semaphore,
    /// Signaled when rendering to the image has finished.
    render_finished: Semaphore,
    /// Signaled when the GPU has consumed this slot's submission.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: &Arc<Device>) -> RhiResult<Self> {
        Ok(Self {
            image_available: Semaphore::new(device.clone())?,
            render_finished: Semaphore::new(device.clone())?,
            in_flight: Fence::new(device.clone(), true)?,
        })
    }
}

/// Tracks which frame slot fence last rendered to each swapchain image.
///
/// A null fence handle means the image is not currently claimed by any
/// in-flight frame.
struct ImageFenceTable {
    fences: Vec<vk::Fence>,
}

impl ImageFenceTable {
    fn new(image_count: usize) -> Self {
        Self {
            fences: vec![vk::Fence::null(); image_count],
        }
    }

    /// Returns the fence of the frame still using the image, if any.
    fn in_use(&self, image_index: u32) -> Option<vk::Fence> {
        let fence = self.fences[image_index as usize];
        if fence == vk::Fence::null() {
            None
        } else {
            Some(fence)
        }
    }

    /// Marks the image as owned by the given frame fence.
    fn claim(&mut self, image_index: u32, fence: vk::Fence) {
        self.fences[image_index as usize] = fence;
    }

    /// Clears all claims, resizing for a new swapchain image count.
    fn reset(&mut self, image_count: usize) {
        self.fences.clear();
        self.fences.resize(image_count, vk::Fence::null());
    }
}

/// Returns the slot index that follows `frame` in the round-robin cycle.
fn next_frame_index(frame: usize) -> usize {
    (frame + 1) % MAX_FRAMES_IN_FLIGHT
}

/// Owns the per-slot synchronization objects and the image hazard table,
/// and drives the per-frame wait/claim/submit cycle.
pub struct FrameSynchronizer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One slot per frame that may be in flight.
    slots: Vec<FrameSlot>,
    /// Index of the slot used for the current frame.
    current_frame: usize,
    /// Which slot fence last targeted each swapchain image.
    images_in_flight: ImageFenceTable,
}

impl FrameSynchronizer {
    /// Creates the frame slots and an empty image table sized for
    /// `image_count` swapchain images.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore or fence creation fails.
    pub fn new(device: Arc<Device>, image_count: usize) -> RhiResult<Self> {
        let slots = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSlot::new(&device))
            .collect::<RhiResult<Vec<_>>>()?;

        debug!(
            "Created {} frame slots for {} swapchain images",
            MAX_FRAMES_IN_FLIGHT, image_count
        );

        Ok(Self {
            device,
            slots,
            current_frame: 0,
            images_in_flight: ImageFenceTable::new(image_count),
        })
    }

    /// Returns the index of the current frame slot.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Returns the semaphore to signal when the acquired image is ready.
    #[inline]
    pub fn image_available(&self) -> vk::Semaphore {
        self.slots[self.current_frame].image_available.handle()
    }

    /// Returns the semaphore presentation waits on.
    #[inline]
    pub fn render_finished(&self) -> vk::Semaphore {
        self.slots[self.current_frame].render_finished.handle()
    }

    /// Blocks until the current slot's previous submission has completed.
    ///
    /// Resources tied to the slot (its semaphores, the uniform write for the
    /// image it will acquire) must not be touched before this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_current(&self) -> RhiResult<()> {
        self.slots[self.current_frame].in_flight.wait(u64::MAX)
    }

    /// Waits until `image_index` is no longer used by an earlier in-flight
    /// frame, then claims it for the current slot.
    ///
    /// Must be called after acquiring the image and before writing any
    /// per-image resource (uniform buffers, command resubmission).
    ///
    /// # Errors
    ///
    /// Returns an error if waiting on the earlier frame's fence fails.
    pub fn claim_image(&mut self, image_index: u32) -> RhiResult<()> {
        if let Some(fence) = self.images_in_flight.in_use(image_index) {
            let fences = [fence];
            unsafe {
                self.device
                    .handle()
                    .wait_for_fences(&fences, true, u64::MAX)?;
            }
        }
        self.images_in_flight
            .claim(image_index, self.slots[self.current_frame].in_flight.handle());
        Ok(())
    }

    /// Resets the current slot's fence ahead of resubmission.
    ///
    /// Deferred until the frame is certain to submit: resetting and then
    /// bailing out (swapchain out of date at acquire) would deadlock the next
    /// wait on this slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence reset fails.
    pub fn reset_current(&self) -> RhiResult<()> {
        self.slots[self.current_frame].in_flight.reset()
    }

    /// Submits a command buffer for the current frame.
    ///
    /// The submission waits for the slot's image-available semaphore at the
    /// color attachment output stage, and signals the render-finished
    /// semaphore plus the slot fence on completion.
    ///
    /// # Errors
    ///
    /// Returns an error if queue submission fails.
    pub fn submit(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        let slot = &self.slots[self.current_frame];

        let wait_semaphores = [slot.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished.handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .submit_graphics(&[submit_info], slot.in_flight.handle())?;
        }

        Ok(())
    }

    /// Advances to the next frame slot.
    pub fn advance(&mut self) {
        self.current_frame = next_frame_index(self.current_frame);
    }

    /// Drops all image claims after swapchain recreation.
    ///
    /// The old images are gone once the device has been idled, so their
    /// fences no longer guard anything.
    pub fn reset_image_table(&mut self, image_count: usize) {
        self.images_in_flight.reset(image_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn frame_index_cycles_round_robin() {
        let mut frame = 0;
        let mut seen = Vec::new();
        for _ in 0..(MAX_FRAMES_IN_FLIGHT * 2) {
            seen.push(frame);
            frame = next_frame_index(frame);
        }
        // Two full cycles through every slot, in order.
        let expected: Vec<usize> = (0..MAX_FRAMES_IN_FLIGHT)
            .chain(0..MAX_FRAMES_IN_FLIGHT)
            .collect();
        assert_eq!(seen, expected);
        assert_eq!(frame, 0);
    }

    #[test]
    fn image_table_starts_unclaimed() {
        let table = ImageFenceTable::new(3);
        for image_index in 0..3 {
            assert!(table.in_use(image_index).is_none());
        }
    }

    #[test]
    fn image_table_tracks_claims() {
        let mut table = ImageFenceTable::new(3);
        let fence_a = vk::Fence::from_raw(0x1);
        let fence_b = vk::Fence::from_raw(0x2);

        table.claim(1, fence_a);
        assert!(table.in_use(0).is_none());
        assert_eq!(table.in_use(1), Some(fence_a));

        // A later frame claims the same image; the old fence is replaced.
        table.claim(1, fence_b);
        assert_eq!(table.in_use(1), Some(fence_b));
    }

    #[test]
    fn image_table_reset_clears_claims_and_resizes() {
        let mut table = ImageFenceTable::new(2);
        table.claim(0, vk::Fence::from_raw(0x1));
        table.claim(1, vk::Fence::from_raw(0x2));

        table.reset(4);

        assert_eq!(table.fences.len(), 4);
        for image_index in 0..4 {
            assert!(table.in_use(image_index).is_none());
        }
    }
}
