use std::ffi::CString;

use ash::extensions::ext::DebugUtils;
use ash::vk;
use smallvec::SmallVec;

use crate::command_buffer::traits::CommandStream;
use crate::sync::batcher::BarrierBatch;
use crate::util::to_vk::{collect_vulkan, IntoVulkanType};

/// A Vulkan command buffer in the recording state.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct IncompleteCommandBuffer {
    #[derivative(Debug = "ignore")]
    device: ash::Device,
    #[derivative(Debug = "ignore")]
    debug_utils: Option<DebugUtils>,
    handle: vk::CommandBuffer,
}

impl IncompleteCommandBuffer {
    /// Wrap a command buffer that is currently recording.
    /// # Safety
    /// `handle` must be a valid command buffer allocated from `device`, and must stay in the recording state
    /// for as long as this object is used.
    pub unsafe fn new(device: ash::Device, handle: vk::CommandBuffer) -> Self {
        Self {
            device,
            debug_utils: None,
            handle,
        }
    }

    /// Record debug labels through `VK_EXT_debug_utils`.
    pub fn with_debug_utils(mut self, debug_utils: DebugUtils) -> Self {
        self.debug_utils = Some(debug_utils);
        self
    }

    /// Get unsafe access to the underlying `VkCommandBuffer`.
    /// # Safety
    /// The caller must not end or free the command buffer while this object is alive.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }
}

impl CommandStream for IncompleteCommandBuffer {
    fn pipeline_barrier(&mut self, batch: &BarrierBatch<'_>) {
        let images: SmallVec<[vk::ImageMemoryBarrier2; 32]> = collect_vulkan(batch.images);
        let buffers: SmallVec<[vk::BufferMemoryBarrier2; 32]> = collect_vulkan(batch.buffers);
        let memory = batch.memory.map(|barrier| barrier.into_vulkan());

        let dependency = vk::DependencyInfo::builder()
            .dependency_flags(vk::DependencyFlags::BY_REGION)
            .memory_barriers(memory.as_ref().map(std::slice::from_ref).unwrap_or(&[]))
            .buffer_memory_barriers(&buffers)
            .image_memory_barriers(&images);

        unsafe {
            self.device.cmd_pipeline_barrier2(self.handle, &dependency);
        }
    }

    fn begin_label(&mut self, name: &str, color: [f32; 4]) {
        let Some(debug_utils) = &self.debug_utils else {
            return;
        };
        // Labels are always opened so every end_label() has a matching begin.
        let name = CString::new(name.replace('\0', "")).unwrap_or_default();
        let label = vk::DebugUtilsLabelEXT::builder().label_name(&name).color(color);
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(self.handle, &label);
        }
    }

    fn end_label(&mut self) {
        if let Some(debug_utils) = &self.debug_utils {
            unsafe {
                debug_utils.cmd_end_debug_utils_label(self.handle);
            }
        }
    }
}
