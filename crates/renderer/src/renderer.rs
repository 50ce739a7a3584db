//! Main renderer orchestration.
//!
//! This module provides the main [`Renderer`] struct that coordinates
//! all Vulkan resources and drives the per-frame acquire/submit/present
//! cycle for the textured spinning quad.

use std::mem::ManuallyDrop;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use spinel_platform::{Surface, Window};
use spinel_rhi::{RhiError, RhiResult};
use spinel_rhi::buffer::{Buffer, BufferUsage};
use spinel_rhi::command::{CommandBuffer, CommandPool, submit_one_time};
use spinel_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, buffer_info,
    update_descriptor_sets,
};
use spinel_rhi::device::Device;
use spinel_rhi::instance::Instance;
use spinel_rhi::physical_device::select_physical_device;
use spinel_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use spinel_rhi::render_pass::{Framebuffer, RenderPass};
use spinel_rhi::shader::{Shader, ShaderStage};
use spinel_rhi::swapchain::{AcquireResult, Swapchain};
use spinel_rhi::texture::Texture;
use spinel_rhi::vertex::QuadVertex;

use crate::frame::FrameSynchronizer;
use crate::quad::{QUAD_INDICES, QUAD_VERTICES};
use crate::ubo::TransformUBO;

/// Clear color for the color attachment (opaque black).
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Main renderer that manages all Vulkan resources.
///
/// # Resource Destruction Order
///
/// Vulkan resources must be destroyed in the correct order:
/// 1. Wait for all GPU work to complete
/// 2. Destroy frame synchronization objects and per-image resources
/// 3. Destroy the command pool (freeing its command buffers)
/// 4. Destroy pipeline, shader, and descriptor resources
/// 5. Destroy geometry buffers and the texture
/// 6. Destroy the render pass
/// 7. Destroy the swapchain
/// 8. Destroy the surface
/// 9. Destroy the device
/// 10. Destroy the instance
///
/// ManuallyDrop is used throughout (including on the device Arc, whose last
/// reference must be released before the instance) to enforce this order.
pub struct Renderer {
    // Core Vulkan resources (in reverse destruction order)
    /// Vulkan instance (destroyed last).
    instance: ManuallyDrop<Instance>,
    /// Logical device (destroyed after all device-child resources).
    device: ManuallyDrop<Arc<Device>>,
    /// Window surface (destroyed after swapchain, before instance).
    surface: ManuallyDrop<Surface>,
    /// Swapchain (destroyed after its dependents).
    swapchain: ManuallyDrop<Swapchain>,

    // Render target resources, rebuilt with the swapchain
    /// Render pass matching the swapchain color format.
    render_pass: ManuallyDrop<RenderPass>,
    /// One framebuffer per swapchain image view.
    framebuffers: Vec<Framebuffer>,

    // Descriptor resources
    /// Descriptor set layout for the transform UBO and the quad texture.
    descriptor_set_layout: ManuallyDrop<DescriptorSetLayout>,
    /// Descriptor pool, rebuilt when the image count changes.
    descriptor_pool: ManuallyDrop<DescriptorPool>,

    // Pipeline resources
    /// Quad graphics pipeline with the extent baked in.
    pipeline: ManuallyDrop<Pipeline>,
    /// Quad pipeline layout.
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    /// Vertex shader module, kept alive for pipeline rebuilds.
    vertex_shader: ManuallyDrop<Shader>,
    /// Fragment shader module, kept alive for pipeline rebuilds.
    fragment_shader: ManuallyDrop<Shader>,

    // Static quad resources
    /// Device-local vertex buffer, filled once at startup.
    vertex_buffer: ManuallyDrop<Buffer>,
    /// Device-local index buffer, filled once at startup.
    index_buffer: ManuallyDrop<Buffer>,
    /// The quad texture with its sampler.
    texture: ManuallyDrop<Texture>,

    // Per-swapchain-image resources
    /// One transform uniform buffer per swapchain image.
    uniform_buffers: Vec<Buffer>,
    /// One descriptor set per swapchain image.
    descriptor_sets: Vec<vk::DescriptorSet>,
    /// Pre-recorded draw commands, one buffer per swapchain image.
    command_buffers: Vec<vk::CommandBuffer>,
    /// Pool the per-image command buffers are allocated from.
    command_pool: ManuallyDrop<CommandPool>,

    // Frame synchronization
    /// Frame slots and the image hazard table.
    frames: ManuallyDrop<FrameSynchronizer>,

    // State
    /// Drawable size as of the last resize event (zero while minimized).
    framebuffer_size: (u32, u32),
    /// Flag indicating the swapchain needs recreation.
    framebuffer_resized: bool,
}

impl Renderer {
    /// Creates a new renderer for the given window.
    ///
    /// Initializes the full Vulkan stack, uploads the quad geometry and
    /// texture, and pre-records the per-image draw commands.
    ///
    /// # Arguments
    ///
    /// * `window` - The window to render to
    /// * `asset_root` - Directory containing `shaders/` and `textures/`
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan resource creation or asset load fails.
    pub fn new(window: &Window, asset_root: &Path) -> RhiResult<Self> {
        let (width, height) = window.framebuffer_size();

        info!("Initializing Vulkan renderer ({}x{})", width, height);

        // Create Vulkan instance with validation in debug builds
        let enable_validation = cfg!(debug_assertions);
        let surface_extensions = window
            .required_surface_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(enable_validation, &surface_extensions)?;

        // Create surface
        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        // Select physical device
        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        // Create logical device
        let device = Device::new(&instance, &physical_device_info)?;

        // Create swapchain
        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;

        // Create render pass and framebuffers for the swapchain images
        let render_pass = RenderPass::new(device.clone(), swapchain.format())?;
        let framebuffers = Self::create_framebuffers(&device, &render_pass, &swapchain)?;

        // Descriptor set layout: binding 0 transform UBO, binding 1 texture
        let transform_binding =
            DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        let texture_binding =
            DescriptorBindingBuilder::combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT);
        let descriptor_set_layout =
            DescriptorSetLayout::new(device.clone(), &[transform_binding, texture_binding])?;

        // Command pools: a long-lived one for the per-image draw buffers and
        // a transient one for the startup uploads
        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RhiError::SwapchainError("Device has no graphics queue".to_string()))?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;
        let upload_pool = CommandPool::new_transient(device.clone(), graphics_family)?;

        // Upload the quad geometry through staging copies
        let vertex_buffer = Self::upload_geometry(
            &device,
            &upload_pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&QUAD_VERTICES),
        )?;
        let index_buffer = Self::upload_geometry(
            &device,
            &upload_pool,
            BufferUsage::Index,
            bytemuck::cast_slice(&QUAD_INDICES),
        )?;

        // Load the quad texture
        let texture_path = asset_root.join("textures").join("quad.png");
        let texture = Texture::from_file(device.clone(), &upload_pool, &texture_path)?;

        // The upload pool has served its purpose
        drop(upload_pool);

        // Load shaders, kept alive for pipeline rebuilds on recreation
        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &asset_root.join("shaders").join("quad.vert.spv"),
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &asset_root.join("shaders").join("quad.frag.spv"),
            ShaderStage::Fragment,
            "main",
        )?;

        // Create the quad pipeline against the render pass and extent
        let (pipeline, pipeline_layout) = Self::create_quad_pipeline(
            device.clone(),
            &descriptor_set_layout,
            &vertex_shader,
            &fragment_shader,
            &render_pass,
            swapchain.extent(),
        )?;

        // Per-image uniform buffers and descriptor sets
        let image_count = swapchain.image_count();
        let (uniform_buffers, descriptor_pool, descriptor_sets) =
            Self::create_image_resources(&device, &descriptor_set_layout, &texture, image_count)?;

        // Frame synchronization slots and the image hazard table
        let frames = FrameSynchronizer::new(device.clone(), image_count)?;

        let mut renderer = Self {
            instance: ManuallyDrop::new(instance),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            framebuffers,
            descriptor_set_layout: ManuallyDrop::new(descriptor_set_layout),
            descriptor_pool: ManuallyDrop::new(descriptor_pool),
            pipeline: ManuallyDrop::new(pipeline),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            vertex_shader: ManuallyDrop::new(vertex_shader),
            fragment_shader: ManuallyDrop::new(fragment_shader),
            vertex_buffer: ManuallyDrop::new(vertex_buffer),
            index_buffer: ManuallyDrop::new(index_buffer),
            texture: ManuallyDrop::new(texture),
            uniform_buffers,
            descriptor_sets,
            command_buffers: Vec::new(),
            command_pool: ManuallyDrop::new(command_pool),
            frames: ManuallyDrop::new(frames),
            framebuffer_size: (width, height),
            framebuffer_resized: false,
        };

        renderer.allocate_and_record_commands()?;

        info!(
            "Renderer initialized: {} swapchain images, {} frames in flight",
            renderer.swapchain.image_count(),
            spinel_rhi::sync::MAX_FRAMES_IN_FLIGHT
        );

        Ok(renderer)
    }

    /// Creates one framebuffer per swapchain image view.
    fn create_framebuffers(
        device: &Arc<Device>,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
    ) -> RhiResult<Vec<Framebuffer>> {
        swapchain
            .image_views()
            .iter()
            .map(|&view| Framebuffer::new(device.clone(), render_pass, view, swapchain.extent()))
            .collect()
    }

    /// Creates a device-local buffer and fills it through a staging copy.
    fn upload_geometry(
        device: &Arc<Device>,
        pool: &CommandPool,
        usage: BufferUsage,
        data: &[u8],
    ) -> RhiResult<Buffer> {
        let buffer = Buffer::new(device.clone(), usage, data.len() as vk::DeviceSize)?;
        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, data)?;

        submit_one_time(pool, |cmd| {
            let region = vk::BufferCopy::default().size(data.len() as vk::DeviceSize);
            cmd.copy_buffer(staging.handle(), buffer.handle(), &[region]);
        })?;

        debug!("Uploaded {} bytes to {} buffer", data.len(), usage.name());

        Ok(buffer)
    }

    /// Creates the quad rendering pipeline and its layout.
    fn create_quad_pipeline(
        device: Arc<Device>,
        descriptor_set_layout: &DescriptorSetLayout,
        vertex_shader: &Shader,
        fragment_shader: &Shader,
        render_pass: &RenderPass,
        extent: vk::Extent2D,
    ) -> RhiResult<(Pipeline, PipelineLayout)> {
        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptor_set_layout.handle()], &[])?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(vertex_shader)
            .fragment_shader(fragment_shader)
            .vertex_binding(QuadVertex::binding_description())
            .vertex_attributes(&QuadVertex::attribute_descriptions())
            .render_pass(render_pass.handle(), 0)
            .extent(extent)
            .build(device, &pipeline_layout)?;

        info!(
            "Quad pipeline created for {}x{}",
            extent.width, extent.height
        );

        Ok((pipeline, pipeline_layout))
    }

    /// Creates the per-image uniform buffers, descriptor pool, and descriptor
    /// sets, and points each set at its buffer and the quad texture.
    fn create_image_resources(
        device: &Arc<Device>,
        descriptor_set_layout: &DescriptorSetLayout,
        texture: &Texture,
        image_count: usize,
    ) -> RhiResult<(Vec<Buffer>, DescriptorPool, Vec<vk::DescriptorSet>)> {
        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(image_count as u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(image_count as u32),
        ];
        let descriptor_pool =
            DescriptorPool::new(device.clone(), image_count as u32, &pool_sizes)?;

        // Allocate all descriptor sets at once
        let layouts: Vec<_> = (0..image_count)
            .map(|_| descriptor_set_layout.handle())
            .collect();
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        let mut uniform_buffers = Vec::with_capacity(image_count);

        for (i, &descriptor_set) in descriptor_sets.iter().enumerate() {
            let uniform =
                Buffer::new(device.clone(), BufferUsage::Uniform, TransformUBO::SIZE as u64)?;

            let transform_infos = [buffer_info(uniform.handle(), 0, TransformUBO::SIZE as u64)];
            let texture_infos = [texture.descriptor_info()];

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(0)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&transform_infos),
                vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(1)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&texture_infos),
            ];
            update_descriptor_sets(device, &writes);

            debug!("Prepared uniform buffer and descriptor set for image {}", i);

            uniform_buffers.push(uniform);
        }

        Ok((uniform_buffers, descriptor_pool, descriptor_sets))
    }

    /// Allocates fresh per-image command buffers and records the draw
    /// commands into them.
    fn allocate_and_record_commands(&mut self) -> RhiResult<()> {
        let image_count = self.swapchain.image_count();
        self.command_buffers = self
            .command_pool
            .allocate_command_buffers(image_count as u32)?;
        self.record_commands()
    }

    /// Records the quad draw into every per-image command buffer.
    ///
    /// The buffers are recorded once and resubmitted every frame until the
    /// swapchain is recreated.
    fn record_commands(&self) -> RhiResult<()> {
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.swapchain.extent(),
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        }];

        for (i, &handle) in self.command_buffers.iter().enumerate() {
            let cmd = CommandBuffer::from_handle(Arc::clone(&self.device), handle);

            cmd.begin_reusable()?;
            cmd.begin_render_pass(
                self.render_pass.handle(),
                self.framebuffers[i].handle(),
                render_area,
                &clear_values,
            );
            cmd.bind_pipeline(self.pipeline.bind_point(), self.pipeline.handle());
            cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
            cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT16);
            cmd.bind_descriptor_sets(
                self.pipeline.bind_point(),
                self.pipeline_layout.handle(),
                0,
                &[self.descriptor_sets[i]],
                &[],
            );
            cmd.draw_indexed(QUAD_INDICES.len() as u32, 1, 0, 0, 0);
            cmd.end_render_pass();
            cmd.end()?;
        }

        debug!(
            "Recorded {} per-image draw command buffers",
            self.command_buffers.len()
        );

        Ok(())
    }

    /// Notifies the renderer that the window has been resized.
    ///
    /// Zero dimensions are recorded too: they park rendering until the
    /// window is restored. The actual swapchain recreation happens on the
    /// next rendered frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != self.framebuffer_size {
            debug!(
                "Resize noted: {}x{} -> {}x{}",
                self.framebuffer_size.0, self.framebuffer_size.1, width, height
            );
            self.framebuffer_size = (width, height);
            self.framebuffer_resized = true;
        }
    }

    /// Recreates the swapchain and everything built against it.
    ///
    /// Defers silently while the framebuffer has no area; the render loop
    /// keeps polling until the window is restored.
    fn recreate_swapchain(&mut self) -> RhiResult<()> {
        let (width, height) = self.framebuffer_size;
        if width == 0 || height == 0 {
            debug!("Deferring swapchain recreation while framebuffer is 0x0");
            return Ok(());
        }

        debug!("Recreating swapchain at {}x{}", width, height);

        // recreate() waits for the device to idle before swapping the chain
        self.swapchain
            .recreate(&self.instance, self.surface.handle(), width, height)?;

        self.rebuild_swapchain_dependents()?;

        self.framebuffer_resized = false;
        Ok(())
    }

    /// Rebuilds the render pass, pipeline, framebuffers, per-image
    /// resources, and command buffers after the swapchain changed.
    fn rebuild_swapchain_dependents(&mut self) -> RhiResult<()> {
        // The old framebuffers and command buffers reference the old images;
        // tear them down before replacing the render pass they were built on.
        self.framebuffers.clear();
        unsafe {
            self.command_pool.free_command_buffers(&self.command_buffers);
        }
        self.command_buffers.clear();

        // The surface format can change across recreation, so the render
        // pass and the pipeline built against it are replaced wholesale.
        let render_pass = RenderPass::new(Arc::clone(&self.device), self.swapchain.format())?;
        let (pipeline, pipeline_layout) = Self::create_quad_pipeline(
            Arc::clone(&self.device),
            &self.descriptor_set_layout,
            &self.vertex_shader,
            &self.fragment_shader,
            &render_pass,
            self.swapchain.extent(),
        )?;

        unsafe {
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.render_pass);
        }
        self.render_pass = ManuallyDrop::new(render_pass);
        self.pipeline = ManuallyDrop::new(pipeline);
        self.pipeline_layout = ManuallyDrop::new(pipeline_layout);

        self.framebuffers =
            Self::create_framebuffers(&self.device, &self.render_pass, &self.swapchain)?;

        // The image count can change; rebuild the per-image resources
        let image_count = self.swapchain.image_count();
        let (uniform_buffers, descriptor_pool, descriptor_sets) = Self::create_image_resources(
            &self.device,
            &self.descriptor_set_layout,
            &self.texture,
            image_count,
        )?;
        self.uniform_buffers = uniform_buffers;
        unsafe {
            ManuallyDrop::drop(&mut self.descriptor_pool);
        }
        self.descriptor_pool = ManuallyDrop::new(descriptor_pool);
        self.descriptor_sets = descriptor_sets;

        self.allocate_and_record_commands()?;

        // Old image claims are void once the device has idled
        self.frames.reset_image_table(image_count);

        info!(
            "Swapchain dependents rebuilt: {} images at {}x{}",
            image_count,
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );

        Ok(())
    }

    /// Writes this tick's transform into the acquired image's uniform buffer.
    fn update_uniform_buffer(&self, image_index: u32, elapsed_secs: f32) -> RhiResult<()> {
        let extent = self.swapchain.extent();
        let aspect_ratio = extent.width as f32 / extent.height as f32;

        let transform = TransformUBO::spinning(elapsed_secs, aspect_ratio);
        self.uniform_buffers[image_index as usize].write_data(0, bytemuck::bytes_of(&transform))
    }

    /// Renders a frame.
    ///
    /// `elapsed_secs` is the wall-clock time since startup, which drives the
    /// quad rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan operation fails. A stale swapchain is
    /// not an error: it triggers recreation and the tick completes normally.
    pub fn render_frame(&mut self, elapsed_secs: f32) -> RhiResult<()> {
        // A minimized window has no drawable area; poll tick over tick until
        // the size comes back rather than touching the swapchain.
        let (width, height) = self.framebuffer_size;
        if width == 0 || height == 0 {
            return Ok(());
        }

        if self.framebuffer_resized {
            debug!("Resize requested, recreating swapchain before acquire");
            self.recreate_swapchain()?;
        }

        // Throttle: wait until this slot's previous submission completes
        self.frames.wait_current()?;

        // Acquire the next swapchain image
        let (image_index, suboptimal_acquire) =
            match self.swapchain.acquire_next_image(self.frames.image_available())? {
                AcquireResult::Acquired {
                    image_index,
                    suboptimal,
                } => (image_index, suboptimal),
                AcquireResult::OutOfDate => {
                    debug!("Swapchain out of date at acquire, recreating");
                    self.recreate_swapchain()?;
                    // The fence was not reset, so this slot can retry on the
                    // next tick without deadlocking.
                    return Ok(());
                }
            };

        // Wait out any earlier frame still rendering into this image
        self.frames.claim_image(image_index)?;

        // The image is ours; write this tick's transform
        self.update_uniform_buffer(image_index, elapsed_secs)?;

        // Reset the fence only now that the frame is certain to submit
        self.frames.reset_current()?;
        self.frames
            .submit(self.command_buffers[image_index as usize])?;

        // Present, waiting on the render-finished semaphore
        let present_result = self.swapchain.present(
            self.device.present_queue(),
            image_index,
            self.frames.render_finished(),
        )?;

        if present_result.needs_recreate() || suboptimal_acquire || self.framebuffer_resized {
            debug!("Swapchain stale after present, recreating");
            self.recreate_swapchain()?;
        }

        self.frames.advance();

        Ok(())
    }

    /// Returns the current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain format.
    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Wait for all GPU work to complete before destroying resources
        if let Err(e) = self.device.wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }

        // Per-frame and per-image resources first
        self.uniform_buffers.clear();
        self.framebuffers.clear();

        // Manually drop resources in correct order
        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.fragment_shader);
            ManuallyDrop::drop(&mut self.vertex_shader);
            ManuallyDrop::drop(&mut self.descriptor_pool);
            ManuallyDrop::drop(&mut self.descriptor_set_layout);
            ManuallyDrop::drop(&mut self.texture);
            ManuallyDrop::drop(&mut self.index_buffer);
            ManuallyDrop::drop(&mut self.vertex_buffer);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
