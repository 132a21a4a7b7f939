//! Per-resource state tracking.
//!
//! The [`ResourceStateTracker`] remembers the last access, stage and (for images) layout of every resource it has seen.
//! Resources are added lazily on their first use and start out in the conservative default state: no prior access,
//! at the top of the pipe, and with an undefined layout.
//!
//! The tracker is not synchronized. A task graph owns its tracker and is the only one mutating it.

use std::collections::HashMap;

use ash::vk;

use crate::graph::resource::{ResourceId, ResourceUse};
use crate::graph::task_graph::GroupId;
use crate::sync::access::TaskAccess;

/// Tracked state of an image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskImageInfo {
    /// Last access to the image.
    pub access: TaskAccess,
    /// Layout the image was left in.
    pub layout: vk::ImageLayout,
    /// Group of the last use, if the use happened inside a task graph.
    pub last_group: Option<GroupId>,
}

impl Default for TaskImageInfo {
    fn default() -> Self {
        Self {
            access: TaskAccess::NONE,
            layout: vk::ImageLayout::UNDEFINED,
            last_group: None,
        }
    }
}

/// Tracked state of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskBufferInfo {
    /// Last access to the buffer.
    pub access: TaskAccess,
    /// Group of the last use, if the use happened inside a task graph.
    pub last_group: Option<GroupId>,
}

impl Default for TaskBufferInfo {
    fn default() -> Self {
        Self {
            access: TaskAccess::NONE,
            last_group: None,
        }
    }
}

/// Tracked state of any resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TrackedState {
    Image(TaskImageInfo),
    Buffer(TaskBufferInfo),
}

impl TrackedState {
    pub fn access(&self) -> TaskAccess {
        match self {
            TrackedState::Image(info) => info.access,
            TrackedState::Buffer(info) => info.access,
        }
    }

    /// Layout of the image, or `None` for buffers.
    pub fn layout(&self) -> Option<vk::ImageLayout> {
        match self {
            TrackedState::Image(info) => Some(info.layout),
            TrackedState::Buffer(_) => None,
        }
    }

    pub fn last_group(&self) -> Option<GroupId> {
        match self {
            TrackedState::Image(info) => info.last_group,
            TrackedState::Buffer(info) => info.last_group,
        }
    }
}

/// Record of the last known state of every used resource.
#[derive(Debug, Default, Clone)]
pub struct ResourceStateTracker {
    images: HashMap<vk::Image, TaskImageInfo>,
    buffers: HashMap<vk::Buffer, TaskBufferInfo>,
}

impl ResourceStateTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new use of an image and return the state it was in before. The first use of an image returns the
    /// conservative default state.
    pub fn record_image_use(
        &mut self,
        image: vk::Image,
        access: TaskAccess,
        layout: vk::ImageLayout,
        group: Option<GroupId>,
    ) -> TaskImageInfo {
        let state = TaskImageInfo {
            access,
            layout,
            last_group: group,
        };
        self.images.insert(image, state).unwrap_or_default()
    }

    /// Record a new use of a buffer and return the state it was in before. The first use of a buffer returns the
    /// conservative default state.
    pub fn record_buffer_use(&mut self, buffer: vk::Buffer, access: TaskAccess, group: Option<GroupId>) -> TaskBufferInfo {
        let state = TaskBufferInfo {
            access,
            last_group: group,
        };
        self.buffers.insert(buffer, state).unwrap_or_default()
    }

    /// Record a resource use and return the prior state of the resource.
    pub fn record_use(&mut self, resource: &ResourceUse, group: Option<GroupId>) -> TrackedState {
        match resource {
            ResourceUse::Image(image) => {
                TrackedState::Image(self.record_image_use(image.image.image, image.access, image.layout, group))
            }
            ResourceUse::Buffer(buffer) => {
                TrackedState::Buffer(self.record_buffer_use(buffer.buffer.buffer, buffer.access, group))
            }
        }
    }

    /// Current state of an image, if it was used before.
    pub fn image_state(&self, image: vk::Image) -> Option<TaskImageInfo> {
        self.images.get(&image).copied()
    }

    /// Current state of a buffer, if it was used before.
    pub fn buffer_state(&self, buffer: vk::Buffer) -> Option<TaskBufferInfo> {
        self.buffers.get(&buffer).copied()
    }

    /// Current state of any resource, if it was used before.
    pub fn state(&self, id: ResourceId) -> Option<TrackedState> {
        match id {
            ResourceId::Image(image) => self.image_state(image).map(TrackedState::Image),
            ResourceId::Buffer(buffer) => self.buffer_state(buffer).map(TrackedState::Buffer),
        }
    }

    /// Number of tracked resources.
    pub fn len(&self) -> usize {
        self.images.len() + self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all tracked state.
    pub fn reset(&mut self) {
        self.images.clear();
        self.buffers.clear();
    }
}
