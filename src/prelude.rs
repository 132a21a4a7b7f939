pub use ash::vk;

pub use crate::core::device::DescriptorDevice;
pub use crate::core::error::Error;
pub use crate::core::settings::{Settings, SettingsBuilder};

pub use crate::allocator::traits::*;
pub use crate::allocator::default_allocator;
pub use crate::allocator::default_allocator::DefaultAllocator;
pub use crate::allocator::memory_type::MemoryType;
pub use crate::allocator::bump_pool::{GrowableBumpPool, MemoryRange, PoolAllocation};

pub use crate::frame::FramePools;

pub use crate::command_buffer::traits::*;
pub use crate::command_buffer::IncompleteCommandBuffer;

pub use crate::sync::access::{AccessType, PipelineStage, TaskAccess};
pub use crate::sync::barrier::{Barrier, BufferBarrier, ImageBarrier, MemoryBarrier};
pub use crate::sync::batcher::{BarrierBatch, CommandBatcher};
pub use crate::sync::state::{ResourceStateTracker, TaskBufferInfo, TaskImageInfo, TrackedState};

pub use crate::graph::pass::{EmptyPassExecutor, Pass, PassBuilder, PassContext, PassExecutor};
pub use crate::graph::resource::{BufferUse, ImageUse, ResourceId, ResourceUse, TaskBuffer, TaskImage};
pub use crate::graph::task_graph::{GroupId, TaskGraph, TaskGroup, TaskId};
pub use crate::graph::viz::GraphViz;

pub use crate::descriptor::builder::{DescriptorBuffer, DescriptorBufferBuilder};
pub use crate::descriptor::layout::{DescriptorKind, DescriptorLayout, DescriptorPool, DescriptorResource};

pub mod traits {
    pub use crate::allocator::traits::*;
    pub use crate::command_buffer::traits::*;
    pub use crate::core::device::DescriptorDevice;
    pub use crate::graph::pass::PassExecutor;
    pub use crate::graph::viz::GraphViz;
    pub use crate::util::to_vk::IntoVulkanType;
}
