//! Barrier descriptions and their synthesis from a prior and a requested state.
//!
//! Synthesis is a pure function of the two states. Every requested use produces a barrier, even if the prior state
//! equals the requested one. Use [`Barrier::is_redundant()`] to find barriers that could be dropped.

use std::ops::{BitOr, BitOrAssign};

use ash::vk;

use crate::graph::resource::{BufferUse, ImageUse, ResourceId, ResourceUse};
use crate::sync::access::TaskAccess;
use crate::sync::state::{TaskBufferInfo, TaskImageInfo, TrackedState};
use crate::util::to_vk::IntoVulkanType;

/// Image memory barrier with a layout transition.
#[derive(Debug, Copy, Clone)]
pub struct ImageBarrier {
    pub image: vk::Image,
    pub range: vk::ImageSubresourceRange,
    pub src: TaskAccess,
    pub dst: TaskAccess,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
}

impl ImageBarrier {
    /// Barrier from the prior state of an image to a requested use.
    pub fn between(prior: &TaskImageInfo, requested: &ImageUse) -> Self {
        Self {
            image: requested.image.image,
            range: requested.image.range,
            src: prior.access,
            dst: requested.access,
            old_layout: prior.layout,
            new_layout: requested.layout,
        }
    }

    /// A barrier is redundant if the layout does not change and neither side writes.
    pub fn is_redundant(&self) -> bool {
        self.old_layout == self.new_layout && !self.src.is_write() && !self.dst.is_write()
    }
}

impl PartialEq for ImageBarrier {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image
            && self.range.aspect_mask == other.range.aspect_mask
            && self.range.base_mip_level == other.range.base_mip_level
            && self.range.level_count == other.range.level_count
            && self.range.base_array_layer == other.range.base_array_layer
            && self.range.layer_count == other.range.layer_count
            && self.src == other.src
            && self.dst == other.dst
            && self.old_layout == other.old_layout
            && self.new_layout == other.new_layout
    }
}

impl Eq for ImageBarrier {}

/// Buffer memory barrier. Always covers the whole buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferBarrier {
    pub buffer: vk::Buffer,
    pub offset: vk::DeviceSize,
    pub size: vk::DeviceSize,
    pub src: TaskAccess,
    pub dst: TaskAccess,
}

impl BufferBarrier {
    /// Barrier from the prior state of a buffer to a requested use.
    pub fn between(prior: &TaskBufferInfo, requested: &BufferUse) -> Self {
        Self {
            buffer: requested.buffer.buffer,
            offset: 0,
            size: vk::WHOLE_SIZE,
            src: prior.access,
            dst: requested.access,
        }
    }

    /// A buffer barrier is redundant if neither side writes.
    pub fn is_redundant(&self) -> bool {
        !self.src.is_write() && !self.dst.is_write()
    }
}

/// Global memory barrier. Multiple memory barriers can be merged into one by or-ing them together.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MemoryBarrier {
    pub src: TaskAccess,
    pub dst: TaskAccess,
}

impl BitOr for MemoryBarrier {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            src: TaskAccess::new(self.src.access | rhs.src.access, self.src.stage | rhs.src.stage),
            dst: TaskAccess::new(self.dst.access | rhs.dst.access, self.dst.stage | rhs.dst.stage),
        }
    }
}

impl BitOrAssign for MemoryBarrier {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// Any barrier the batcher accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Barrier {
    Image(ImageBarrier),
    Buffer(BufferBarrier),
    Memory(MemoryBarrier),
}

impl Barrier {
    /// Synthesize the barrier needed to go from `prior` to the state requested by `requested`.
    /// A prior state of the wrong resource kind is treated as the conservative default.
    pub fn between(prior: &TrackedState, requested: &ResourceUse) -> Self {
        match (prior, requested) {
            (TrackedState::Image(info), ResourceUse::Image(image)) => Barrier::Image(ImageBarrier::between(info, image)),
            (_, ResourceUse::Image(image)) => Barrier::Image(ImageBarrier::between(&TaskImageInfo::default(), image)),
            (TrackedState::Buffer(info), ResourceUse::Buffer(buffer)) => {
                Barrier::Buffer(BufferBarrier::between(info, buffer))
            }
            (_, ResourceUse::Buffer(buffer)) => {
                Barrier::Buffer(BufferBarrier::between(&TaskBufferInfo::default(), buffer))
            }
        }
    }

    /// Resource this barrier applies to. Memory barriers apply to all resources.
    pub fn resource(&self) -> Option<ResourceId> {
        match self {
            Barrier::Image(barrier) => Some(ResourceId::Image(barrier.image)),
            Barrier::Buffer(barrier) => Some(ResourceId::Buffer(barrier.buffer)),
            Barrier::Memory(_) => None,
        }
    }

    pub fn src(&self) -> TaskAccess {
        match self {
            Barrier::Image(barrier) => barrier.src,
            Barrier::Buffer(barrier) => barrier.src,
            Barrier::Memory(barrier) => barrier.src,
        }
    }

    pub fn dst(&self) -> TaskAccess {
        match self {
            Barrier::Image(barrier) => barrier.dst,
            Barrier::Buffer(barrier) => barrier.dst,
            Barrier::Memory(barrier) => barrier.dst,
        }
    }

    /// Whether this barrier orders nothing and transitions nothing.
    pub fn is_redundant(&self) -> bool {
        match self {
            Barrier::Image(barrier) => barrier.is_redundant(),
            Barrier::Buffer(barrier) => barrier.is_redundant(),
            Barrier::Memory(barrier) => !barrier.src.is_write() && !barrier.dst.is_write(),
        }
    }
}

impl IntoVulkanType for ImageBarrier {
    type Output = vk::ImageMemoryBarrier2;

    fn into_vulkan(self) -> Self::Output {
        vk::ImageMemoryBarrier2 {
            src_stage_mask: self.src.stage,
            src_access_mask: self.src.access_flags(),
            dst_stage_mask: self.dst.stage,
            dst_access_mask: self.dst.access_flags(),
            old_layout: self.old_layout,
            new_layout: self.new_layout,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: self.image,
            subresource_range: self.range,
            ..Default::default()
        }
    }
}

impl IntoVulkanType for BufferBarrier {
    type Output = vk::BufferMemoryBarrier2;

    fn into_vulkan(self) -> Self::Output {
        vk::BufferMemoryBarrier2 {
            src_stage_mask: self.src.stage,
            src_access_mask: self.src.access_flags(),
            dst_stage_mask: self.dst.stage,
            dst_access_mask: self.dst.access_flags(),
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            buffer: self.buffer,
            offset: self.offset,
            size: self.size,
            ..Default::default()
        }
    }
}

impl IntoVulkanType for MemoryBarrier {
    type Output = vk::MemoryBarrier2;

    fn into_vulkan(self) -> Self::Output {
        vk::MemoryBarrier2 {
            src_stage_mask: self.src.stage,
            src_access_mask: self.src.access_flags(),
            dst_stage_mask: self.dst.stage,
            dst_access_mask: self.dst.access_flags(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::resource::{TaskBuffer, TaskImage};
    use ash::vk::Handle;

    fn image() -> TaskImage {
        TaskImage::new(vk::Image::from_raw(1), vk::ImageAspectFlags::COLOR)
    }

    #[test]
    fn first_use_starts_from_default() {
        let requested = ResourceUse::image(&image(), TaskAccess::COLOR_ATTACHMENT_WRITE, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
        let Barrier::Image(barrier) = Barrier::between(&requested.initial_state(), &requested) else {
            panic!("expected image barrier");
        };
        assert_eq!(barrier.src, TaskAccess::NONE);
        assert_eq!(barrier.old_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(barrier.new_layout, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn same_state_still_produces_barrier() {
        let requested = ResourceUse::image(&image(), TaskAccess::FRAGMENT_SHADER_READ, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
        let prior = requested.tracked_state(None);
        let barrier = Barrier::between(&prior, &requested);
        assert_eq!(barrier.src(), barrier.dst());
        assert!(barrier.is_redundant());
        assert_eq!(barrier, Barrier::between(&prior, &requested));
    }

    #[test]
    fn write_after_write_is_not_redundant() {
        let buffer = TaskBuffer::new(vk::Buffer::from_raw(2));
        let requested = ResourceUse::buffer(&buffer, TaskAccess::COMPUTE_SHADER_WRITE);
        let barrier = Barrier::between(&requested.tracked_state(None), &requested);
        assert!(!barrier.is_redundant());
        let Barrier::Buffer(barrier) = barrier else {
            panic!("expected buffer barrier");
        };
        assert_eq!(barrier.size, vk::WHOLE_SIZE);
    }

    #[test]
    fn memory_barriers_merge() {
        let a = MemoryBarrier {
            src: TaskAccess::TRANSFER_WRITE,
            dst: TaskAccess::VERTEX_INPUT_READ,
        };
        let b = MemoryBarrier {
            src: TaskAccess::COMPUTE_SHADER_WRITE,
            dst: TaskAccess::INDIRECT_READ,
        };
        let merged = a | b;
        assert!(merged.src.stage.contains(vk::PipelineStageFlags2::TRANSFER | vk::PipelineStageFlags2::COMPUTE_SHADER));
        assert!(merged.dst.access_flags().contains(vk::AccessFlags2::INDIRECT_COMMAND_READ));
    }
}
