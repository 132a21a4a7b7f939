//! Access patterns of resource uses.
//!
//! A [`TaskAccess`] describes **when** a resource is used (the pipeline stage) and **how** (read, write or both).
//! The Vulkan access mask of a use is derived from this pair by [`access_flags()`], so a use never has to spell
//! out its access mask by hand.

use ash::vk;

/// Pipeline stage a resource use happens in.
pub type PipelineStage = vk::PipelineStageFlags2;

bitflags::bitflags! {
    /// Whether a resource use reads, writes or does both. An empty set means the resource is not accessed.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct AccessType: u8 {
        /// The use reads from the resource.
        const READ = 0b01;
        /// The use writes to the resource.
        const WRITE = 0b10;
        /// The use both reads and writes the resource.
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

impl Default for AccessType {
    fn default() -> Self {
        Self::empty()
    }
}

const fn stages(a: PipelineStage, b: PipelineStage) -> PipelineStage {
    PipelineStage::from_raw(a.as_raw() | b.as_raw())
}

/// One access to a resource: an access pattern at a pipeline stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TaskAccess {
    /// How the resource is accessed.
    pub access: AccessType,
    /// Stage the access happens in.
    pub stage: PipelineStage,
}

impl TaskAccess {
    /// No prior access. This is the state of every resource before its first use.
    pub const NONE: Self = Self::new(AccessType::empty(), PipelineStage::TOP_OF_PIPE);
    pub const VERTEX_INPUT_READ: Self = Self::new(AccessType::READ, PipelineStage::VERTEX_ATTRIBUTE_INPUT);
    pub const INDEX_INPUT_READ: Self = Self::new(AccessType::READ, PipelineStage::INDEX_INPUT);
    pub const INDIRECT_READ: Self = Self::new(AccessType::READ, PipelineStage::DRAW_INDIRECT);
    pub const VERTEX_SHADER_READ: Self = Self::new(AccessType::READ, PipelineStage::VERTEX_SHADER);
    pub const FRAGMENT_SHADER_READ: Self = Self::new(AccessType::READ, PipelineStage::FRAGMENT_SHADER);
    pub const FRAGMENT_SHADER_WRITE: Self = Self::new(AccessType::WRITE, PipelineStage::FRAGMENT_SHADER);
    pub const COLOR_ATTACHMENT_WRITE: Self = Self::new(AccessType::WRITE, PipelineStage::COLOR_ATTACHMENT_OUTPUT);
    pub const COLOR_ATTACHMENT_READ_WRITE: Self =
        Self::new(AccessType::READ_WRITE, PipelineStage::COLOR_ATTACHMENT_OUTPUT);
    pub const DEPTH_ATTACHMENT_READ: Self = Self::new(
        AccessType::READ,
        stages(PipelineStage::EARLY_FRAGMENT_TESTS, PipelineStage::LATE_FRAGMENT_TESTS),
    );
    pub const DEPTH_ATTACHMENT_WRITE: Self = Self::new(
        AccessType::READ_WRITE,
        stages(PipelineStage::EARLY_FRAGMENT_TESTS, PipelineStage::LATE_FRAGMENT_TESTS),
    );
    pub const COMPUTE_SHADER_READ: Self = Self::new(AccessType::READ, PipelineStage::COMPUTE_SHADER);
    pub const COMPUTE_SHADER_WRITE: Self = Self::new(AccessType::WRITE, PipelineStage::COMPUTE_SHADER);
    pub const COMPUTE_SHADER_READ_WRITE: Self = Self::new(AccessType::READ_WRITE, PipelineStage::COMPUTE_SHADER);
    pub const TRANSFER_READ: Self = Self::new(AccessType::READ, PipelineStage::TRANSFER);
    pub const TRANSFER_WRITE: Self = Self::new(AccessType::WRITE, PipelineStage::TRANSFER);
    pub const HOST_READ: Self = Self::new(AccessType::READ, PipelineStage::HOST);
    pub const HOST_WRITE: Self = Self::new(AccessType::WRITE, PipelineStage::HOST);
    /// Handing the resource to the presentation engine. Presentation does not access memory through the pipeline,
    /// so the destination scope is empty.
    pub const PRESENT: Self = Self::new(AccessType::empty(), PipelineStage::BOTTOM_OF_PIPE);

    /// Create a new access from an access pattern and a stage.
    pub const fn new(access: AccessType, stage: PipelineStage) -> Self {
        Self {
            access,
            stage,
        }
    }

    /// Vulkan access mask for this access.
    pub fn access_flags(&self) -> vk::AccessFlags2 {
        access_flags(self.access, self.stage)
    }

    /// Whether this access writes to the resource.
    pub fn is_write(&self) -> bool {
        self.access.contains(AccessType::WRITE)
    }

    /// Whether this access only reads from the resource.
    pub fn is_read_only(&self) -> bool {
        self.access == AccessType::READ
    }
}

impl Default for TaskAccess {
    fn default() -> Self {
        Self::NONE
    }
}

/// Derive the Vulkan access mask for an access pattern in a set of pipeline stages.
/// Stages that never access memory (top and bottom of pipe) contribute nothing.
pub fn access_flags(access: AccessType, stage: PipelineStage) -> vk::AccessFlags2 {
    // (stages, read flags, write flags)
    let table = [
        (PipelineStage::VERTEX_ATTRIBUTE_INPUT, vk::AccessFlags2::VERTEX_ATTRIBUTE_READ, vk::AccessFlags2::NONE),
        (PipelineStage::INDEX_INPUT, vk::AccessFlags2::INDEX_READ, vk::AccessFlags2::NONE),
        (PipelineStage::DRAW_INDIRECT, vk::AccessFlags2::INDIRECT_COMMAND_READ, vk::AccessFlags2::NONE),
        (
            PipelineStage::VERTEX_SHADER
                | PipelineStage::TESSELLATION_CONTROL_SHADER
                | PipelineStage::TESSELLATION_EVALUATION_SHADER
                | PipelineStage::GEOMETRY_SHADER
                | PipelineStage::FRAGMENT_SHADER
                | PipelineStage::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_READ,
            vk::AccessFlags2::SHADER_WRITE,
        ),
        (
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags2::COLOR_ATTACHMENT_READ,
            vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        ),
        (
            PipelineStage::EARLY_FRAGMENT_TESTS | PipelineStage::LATE_FRAGMENT_TESTS,
            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ,
            vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        ),
        (
            PipelineStage::TRANSFER | PipelineStage::COPY | PipelineStage::BLIT | PipelineStage::CLEAR,
            vk::AccessFlags2::TRANSFER_READ,
            vk::AccessFlags2::TRANSFER_WRITE,
        ),
        (PipelineStage::HOST, vk::AccessFlags2::HOST_READ, vk::AccessFlags2::HOST_WRITE),
        (PipelineStage::ALL_COMMANDS, vk::AccessFlags2::MEMORY_READ, vk::AccessFlags2::MEMORY_WRITE),
    ];

    table
        .iter()
        .filter(|(stages, _, _)| stage.intersects(*stages))
        .fold(vk::AccessFlags2::NONE, |flags, (_, read, write)| {
            let mut flags = flags;
            if access.contains(AccessType::READ) {
                flags |= *read;
            }
            if access.contains(AccessType::WRITE) {
                flags |= *write;
            }
            flags
        })
}
