//! Exposes the deimos error type

use std::sync::PoisonError;

use ash;
use gpu_allocator::AllocationError;
use thiserror::Error;

use crate::descriptor::DescriptorKind;

/// Error type that deimos can return.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic Vulkan error type.
    #[error("Vulkan error: `{0}`")]
    VkError(ash::vk::Result),
    /// Vulkan allocation error.
    #[error("Vulkan allocation error: `{0}`")]
    AllocationError(AllocationError),
    /// A bump pool ran out of space and could not grow, either because growth was disabled or because the
    /// remaining memory budget cannot hold the request.
    #[error("Bump pool exhausted: requested {requested} bytes, {available} bytes available.")]
    PoolExhausted {
        /// Number of bytes that were requested.
        requested: u64,
        /// Number of bytes that could still be served.
        available: u64,
    },
    /// Tried to allocate zero bytes.
    #[error("Cannot allocate zero bytes.")]
    InvalidAllocationSize,
    /// Alignment values must be a power of two.
    #[error("Alignment `{0}` is not a power of two.")]
    InvalidAlignment(u64),
    /// Mappable memory expected
    #[error("Requested mappable memory, but the allocation does not have a memory map")]
    UnmappableBuffer,
    /// Write or read outside of an allocation.
    #[error("Access is not a valid range in the parent allocation.")]
    BufferViewOutOfRange,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
    /// Referenced a task group that does not exist in this graph.
    #[error("Task group `{0}` does not exist.")]
    GroupNotFound(usize),
    /// Tried to execute a task graph before compiling it.
    #[error("Task graph must be compiled before it can be executed.")]
    GraphNotCompiled,
    /// Requested a descriptor kind that has no region in the descriptor buffer layout.
    #[error("No descriptor region initialized for descriptor kind `{0:?}`.")]
    NoDescriptorRegion(DescriptorKind),
    /// The resource given to a descriptor write does not match the descriptor kind.
    #[error("Resource does not match descriptor kind `{0:?}`.")]
    DescriptorKindMismatch(DescriptorKind),
    /// The device layer reported a descriptor size of zero bytes.
    #[error("Device reports a descriptor size of zero bytes for descriptor kind `{0:?}`.")]
    InvalidDescriptorSize(DescriptorKind),
    /// All slots of a descriptor region have been written in this cycle.
    #[error("Descriptor region for `{0:?}` is full.")]
    DescriptorPoolFull(DescriptorKind),
    /// The reserved descriptor region does not fit in the backing memory.
    #[error("Descriptor region for `{kind:?}` needs {requested} bytes, but only {capacity} bytes are available.")]
    DescriptorCapacityExceeded {
        /// Descriptor kind of the region that did not fit.
        kind: DescriptorKind,
        /// Bytes needed for the region.
        requested: u64,
        /// Bytes left in the backing memory.
        capacity: u64,
    },
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}

impl From<ash::vk::Result> for Error {
    fn from(value: ash::vk::Result) -> Self {
        Error::VkError(value)
    }
}

impl From<AllocationError> for Error {
    fn from(value: AllocationError) -> Self {
        Error::AllocationError(value)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
