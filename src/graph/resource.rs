//! Resource handles and resource uses declared by tasks.

use ash::vk;

use crate::graph::task_graph::GroupId;
use crate::sync::access::TaskAccess;
use crate::sync::state::{TaskBufferInfo, TaskImageInfo, TrackedState};

fn same_range(a: &vk::ImageSubresourceRange, b: &vk::ImageSubresourceRange) -> bool {
    a.aspect_mask == b.aspect_mask
        && a.base_mip_level == b.base_mip_level
        && a.level_count == b.level_count
        && a.base_array_layer == b.base_array_layer
        && a.layer_count == b.layer_count
}

/// An image owned by the device layer that can be used in a task graph. The graph only tracks its state,
/// it never creates or destroys the image.
#[derive(Debug, Copy, Clone)]
pub struct TaskImage {
    /// Image handle.
    pub image: vk::Image,
    /// Subresource range covered by barriers on this image.
    pub range: vk::ImageSubresourceRange,
}

impl TaskImage {
    /// Wrap an image, covering all mip levels and array layers of the given aspect.
    pub fn new(image: vk::Image, aspect: vk::ImageAspectFlags) -> Self {
        Self {
            image,
            range: vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: vk::REMAINING_MIP_LEVELS,
                base_array_layer: 0,
                layer_count: vk::REMAINING_ARRAY_LAYERS,
            },
        }
    }

    /// Wrap an image, covering only the given subresource range.
    pub fn with_range(image: vk::Image, range: vk::ImageSubresourceRange) -> Self {
        Self {
            image,
            range,
        }
    }
}

impl PartialEq for TaskImage {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image && same_range(&self.range, &other.range)
    }
}

impl Eq for TaskImage {}

/// A buffer owned by the device layer that can be used in a task graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskBuffer {
    /// Buffer handle.
    pub buffer: vk::Buffer,
}

impl TaskBuffer {
    pub fn new(buffer: vk::Buffer) -> Self {
        Self {
            buffer,
        }
    }
}

/// Key resources are tracked under.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Image(vk::Image),
    Buffer(vk::Buffer),
}

/// An image use: the requested access and the layout the image must be in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageUse {
    pub image: TaskImage,
    pub access: TaskAccess,
    pub layout: vk::ImageLayout,
}

/// A buffer use: the requested access. Buffer uses always cover the whole buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferUse {
    pub buffer: TaskBuffer,
    pub access: TaskAccess,
}

/// One declared use of a resource inside a task.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceUse {
    Image(ImageUse),
    Buffer(BufferUse),
}

impl ResourceUse {
    /// Declare an image use.
    pub fn image(image: &TaskImage, access: TaskAccess, layout: vk::ImageLayout) -> Self {
        ResourceUse::Image(ImageUse {
            image: *image,
            access,
            layout,
        })
    }

    /// Declare a buffer use.
    pub fn buffer(buffer: &TaskBuffer, access: TaskAccess) -> Self {
        ResourceUse::Buffer(BufferUse {
            buffer: *buffer,
            access,
        })
    }

    /// Identifier of the used resource.
    pub fn id(&self) -> ResourceId {
        match self {
            ResourceUse::Image(image) => ResourceId::Image(image.image.image),
            ResourceUse::Buffer(buffer) => ResourceId::Buffer(buffer.buffer.buffer),
        }
    }

    /// Requested access of this use.
    pub fn access(&self) -> TaskAccess {
        match self {
            ResourceUse::Image(image) => image.access,
            ResourceUse::Buffer(buffer) => buffer.access,
        }
    }

    /// Requested layout, for image uses.
    pub fn layout(&self) -> Option<vk::ImageLayout> {
        match self {
            ResourceUse::Image(image) => Some(image.layout),
            ResourceUse::Buffer(_) => None,
        }
    }

    /// The state a resource is in after this use, made in `group`.
    pub fn tracked_state(&self, group: Option<GroupId>) -> TrackedState {
        match self {
            ResourceUse::Image(image) => TrackedState::Image(TaskImageInfo {
                access: image.access,
                layout: image.layout,
                last_group: group,
            }),
            ResourceUse::Buffer(buffer) => TrackedState::Buffer(TaskBufferInfo {
                access: buffer.access,
                last_group: group,
            }),
        }
    }

    /// The conservative state of a resource of the same kind that was never used before.
    pub fn initial_state(&self) -> TrackedState {
        match self {
            ResourceUse::Image(_) => TrackedState::Image(TaskImageInfo::default()),
            ResourceUse::Buffer(_) => TrackedState::Buffer(TaskBufferInfo::default()),
        }
    }
}
