//! Exposes different memory types that determine where pool blocks should live.

/// The memory type of a block indicates where it should live.
/// Give this to an [`Allocator`](crate::Allocator) to let it decide
/// where the block should be placed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryType {
    /// GPU only accessible memory. Bump pools in this memory cannot be written from the host.
    GpuOnly,
    /// Memory for uploading data to the GPU. Scratch data and descriptor buffers live here.
    CpuToGpu,
    /// Memory useful for CPU readback of data.
    GpuToCpu,
}

impl MemoryType {
    /// Whether memory of this type is always host visible.
    pub fn is_mappable(&self) -> bool {
        !matches!(self, MemoryType::GpuOnly)
    }
}

impl From<MemoryType> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryType) -> Self {
        match value {
            MemoryType::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryType::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryType::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
        }
    }
}
