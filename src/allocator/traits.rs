use std::ffi::c_void;
use std::ptr::NonNull;

use anyhow::Result;
use ash::vk;

use crate::allocator::memory_type::MemoryType;

/// Sub-allocator that hands out device memory blocks with a buffer bound to them. The bump pool only talks to
/// device memory through this trait, so any allocation strategy (segregated free lists, dedicated allocations, ...)
/// can be plugged in.
pub trait Allocator: Clone + Send + Sync {
    type Allocation: Allocation;

    /// Allocate a block of at least `size` bytes, aligned to `alignment`, and bind a buffer with the given usage to it.
    fn allocate(
        &mut self,
        name: &str,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        ty: MemoryType,
    ) -> Result<Self::Allocation>;

    /// Free a block previously returned from [`Allocator::allocate()`].
    fn free(&mut self, allocation: Self::Allocation) -> Result<()>;

    /// Remaining memory budget for a memory type in bytes, if the allocator can query it.
    fn memory_budget(&self, _ty: MemoryType) -> Option<vk::DeviceSize> {
        None
    }
}

/// A block of device memory with a buffer bound to the whole range.
pub trait Allocation {
    /// Buffer bound to this allocation.
    fn buffer(&self) -> vk::Buffer;
    /// Size of the block in bytes.
    fn size(&self) -> vk::DeviceSize;
    /// Device address of the first byte of the block.
    fn device_address(&self) -> vk::DeviceAddress;
    /// Host pointer to the first byte of the block, if the memory is host visible.
    fn mapped_ptr(&self) -> Option<NonNull<c_void>>;
}
