//! A growable linear allocator over one or more device memory blocks.
//!
//! The pool works by linearly incrementing an offset into its active block on every allocation. When the active block
//! cannot hold a request, a new block is appended and becomes the active one. Deallocation is only possible by calling
//! [`GrowableBumpPool::reset()`], which rewinds the pool once the GPU is done with everything allocated from it.
//!
//! If a pool had to grow during a cycle, resetting it replaces all of its blocks with a single block large enough
//! to hold everything that was allocated. This is logged as a reconstruction. A pool that reconstructs every frame
//! has a block size that is too small for its workload.
//!
//! # Example
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn upload_transforms<A: Allocator>(pool: &GrowableBumpPool<A>, data: &[u8]) -> Result<vk::DeviceAddress> {
//!     let allocation = pool.allocate(data.len() as u64, 16)?;
//!     allocation.write(0, data)?;
//!     Ok(allocation.address())
//! }
//! ```
//!
//! Allocations borrow the pool, so it cannot be reset or dropped while one of them is still around:
//! ```compile_fail
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn stale_write<A: Allocator>(pool: GrowableBumpPool<A>) -> Result<()> {
//!     let allocation = pool.allocate(64, 16)?;
//!     drop(pool);
//!     allocation.write(0, &[1, 2, 3, 4])
//! }
//! ```

use std::cell::RefCell;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr::NonNull;

use anyhow::Result;
use ash::vk;

use crate::{Allocation, Allocator, Error, MemoryType, Settings};
use crate::util::align::{align, is_power_of_two};

/// Cursor into one block of a bump pool.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MemoryRange {
    /// First free byte in the block. Never exceeds `capacity`.
    pub offset: vk::DeviceSize,
    /// Size of the block in bytes.
    pub capacity: vk::DeviceSize,
}

impl MemoryRange {
    /// Amount of bytes left in this block.
    pub fn remaining(&self) -> vk::DeviceSize {
        self.capacity - self.offset
    }
}

struct PoolBlock<A: Allocator> {
    allocation: A::Allocation,
    range: MemoryRange,
}

/// A range of memory handed out by a [`GrowableBumpPool`]. It borrows the pool it came from, which cannot be
/// reset or dropped until the allocation is gone.
#[derive(Debug, Copy, Clone)]
pub struct PoolAllocation<'p> {
    block: usize,
    buffer: vk::Buffer,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
    address: vk::DeviceAddress,
    pointer: Option<NonNull<c_void>>,
    _pool: PhantomData<&'p ()>,
}

impl<'p> PoolAllocation<'p> {
    /// Index of the pool block this allocation was drawn from.
    pub fn block(&self) -> usize {
        self.block
    }

    /// Buffer of the block this allocation lives in.
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    /// Byte offset of this allocation inside its block.
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    /// Size of this allocation in bytes.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Device address of the first byte of this allocation.
    pub fn address(&self) -> vk::DeviceAddress {
        self.address
    }

    /// Whether this allocation can be written from the host.
    pub fn is_mapped(&self) -> bool {
        self.pointer.is_some()
    }

    /// Copy `data` into this allocation, starting `at` bytes in.
    /// # Errors
    /// * Fails if the allocation is not host visible.
    /// * Fails if the write does not fit in the allocation.
    pub fn write(&self, at: vk::DeviceSize, data: &[u8]) -> Result<()> {
        let pointer = self.range_ptr(at, data.len())?;
        // SAFETY: The range was checked to lie inside this allocation, and the borrowed pool keeps the block mapped.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), pointer, data.len());
        }
        Ok(())
    }

    /// Copy bytes from this allocation into `out`, starting `at` bytes in.
    /// # Errors
    /// * Fails if the allocation is not host visible.
    /// * Fails if the read does not fit in the allocation.
    pub fn read(&self, at: vk::DeviceSize, out: &mut [u8]) -> Result<()> {
        let pointer = self.range_ptr(at, out.len())?;
        // SAFETY: See `write`.
        unsafe {
            std::ptr::copy_nonoverlapping(pointer as *const u8, out.as_mut_ptr(), out.len());
        }
        Ok(())
    }

    fn range_ptr(&self, at: vk::DeviceSize, len: usize) -> Result<*mut u8> {
        let Some(pointer) = self.pointer else {
            anyhow::bail!(Error::UnmappableBuffer);
        };
        match at.checked_add(len as vk::DeviceSize) {
            Some(end) if end <= self.size => {}
            _ => anyhow::bail!(Error::BufferViewOutOfRange),
        }
        Ok(unsafe { pointer.as_ptr().cast::<u8>().add(at as usize) })
    }
}

/// A linear allocator used for short-lived per-frame data, and the backing memory of descriptor buffers.
///
/// Every returned offset `o` satisfies `o + size <= capacity` of the block it was drawn from.
/// Allocating only needs a shared borrow, so several allocations can be alive at once. Resetting needs the pool
/// back exclusively.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct GrowableBumpPool<A: Allocator> {
    #[derivative(Debug = "ignore")]
    allocator: RefCell<A>,
    #[derivative(Debug = "ignore")]
    blocks: RefCell<Vec<PoolBlock<A>>>,
    chunk_size: vk::DeviceSize,
    alignment: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    memory_type: MemoryType,
    allow_growth: bool,
}

impl<A: Allocator> GrowableBumpPool<A> {
    /// Create a new bump pool and allocate its first block of [`Settings::scratch_size`] bytes.
    /// # Errors
    /// * Fails if the block size is zero or the alignment is not a power of two.
    /// * Fails if the internal allocation fails. This is possible when VRAM runs out.
    /// * Fails if the memory type should be host visible, but the block is not mapped.
    pub fn new(allocator: A, settings: &Settings, usage: vk::BufferUsageFlags) -> Result<Self> {
        if settings.scratch_size == 0 {
            anyhow::bail!(Error::InvalidAllocationSize);
        }
        if !is_power_of_two(settings.scratch_alignment) {
            anyhow::bail!(Error::InvalidAlignment(settings.scratch_alignment));
        }

        let pool = Self {
            allocator: RefCell::new(allocator),
            blocks: RefCell::new(Vec::new()),
            chunk_size: settings.scratch_size,
            alignment: settings.scratch_alignment,
            usage,
            memory_type: settings.memory_type,
            allow_growth: settings.allow_pool_growth,
        };
        let block = pool.allocate_block(pool.chunk_size, pool.alignment)?;
        pool.blocks.borrow_mut().push(block);
        Ok(pool)
    }

    /// Allocate `size` bytes aligned to at least `alignment` bytes. The pool's minimum alignment always applies.
    /// # Errors
    /// * Fails with [`Error::InvalidAllocationSize`] if `size` is zero.
    /// * Fails with [`Error::InvalidAlignment`] if `alignment` is not a power of two.
    /// * Fails with [`Error::PoolExhausted`] if the active block is full and the pool cannot grow, or if no block
    ///   can ever hold `size` bytes.
    /// * Fails if allocating a new block fails.
    pub fn allocate(&self, size: vk::DeviceSize, alignment: vk::DeviceSize) -> Result<PoolAllocation<'_>> {
        if size == 0 {
            anyhow::bail!(Error::InvalidAllocationSize);
        }
        if !is_power_of_two(alignment) {
            anyhow::bail!(Error::InvalidAlignment(alignment));
        }
        let alignment = alignment.max(self.alignment);

        let mut blocks = self.blocks.borrow_mut();
        if let Some((index, block)) = blocks.iter_mut().enumerate().last() {
            let bump = align(block.range.offset, alignment)
                .and_then(|offset| offset.checked_add(size).map(|end| (offset, end)));
            if let Some((offset, end)) = bump.filter(|(_, end)| *end <= block.range.capacity) {
                block.range.offset = end;
                return Ok(Self::view(index, &block.allocation, offset, size));
            }
        }

        let mut block = self.grow(&blocks, size, alignment)?;
        block.range.offset = size;
        let allocation = Self::view(blocks.len(), &block.allocation, 0, size);
        blocks.push(block);
        Ok(allocation)
    }

    /// Rewind the pool. If the pool grew since the last reset, its blocks are freed and replaced by a single block
    /// with the combined capacity of all of them.
    /// # Safety
    /// The device may no longer use any allocation made from this pool since the last reset.
    /// # Errors
    /// * Fails if freeing the old blocks or allocating the merged block fails.
    pub unsafe fn reset(&mut self) -> Result<()> {
        let blocks = self.blocks.get_mut();
        match blocks.len() {
            0 => {}
            1 => blocks[0].range.offset = 0,
            count => {
                let capacity: vk::DeviceSize = blocks.iter().map(|block| block.range.capacity).sum();
                let allocator = self.allocator.get_mut();
                for block in std::mem::take(blocks) {
                    allocator.free(block.allocation)?;
                }
                info!("Bump pool reconstruction: merged {count} blocks into one block of {capacity} bytes");
                let block = self.allocate_block(capacity, self.alignment)?;
                self.blocks.get_mut().push(block);
            }
        }
        Ok(())
    }

    /// Number of blocks currently owned by the pool.
    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Cursor of every block, in allocation order. The last one is the active block.
    pub fn ranges(&self) -> impl Iterator<Item = MemoryRange> {
        let ranges: Vec<MemoryRange> = self.blocks.borrow().iter().map(|block| block.range).collect();
        ranges.into_iter()
    }

    /// Total capacity of all blocks in bytes.
    pub fn capacity(&self) -> vk::DeviceSize {
        self.ranges().map(|range| range.capacity).sum()
    }

    /// Total amount of bytes handed out since the last reset, including alignment padding.
    pub fn used(&self) -> vk::DeviceSize {
        self.ranges().map(|range| range.offset).sum()
    }

    fn grow(&self, blocks: &[PoolBlock<A>], size: vk::DeviceSize, alignment: vk::DeviceSize) -> Result<PoolBlock<A>> {
        let available = blocks.last().map(|block| block.range.remaining()).unwrap_or_default();
        let exhausted = Error::PoolExhausted {
            requested: size,
            available,
        };
        if !self.allow_growth && !blocks.is_empty() {
            anyhow::bail!(exhausted);
        }

        let Some(mut capacity) = align(size.max(self.chunk_size), self.alignment) else {
            anyhow::bail!(exhausted);
        };
        if let Some(budget) = self.allocator.borrow().memory_budget(self.memory_type) {
            if budget < size {
                anyhow::bail!(Error::PoolExhausted {
                    requested: size,
                    available: budget,
                });
            }
            if capacity > budget {
                warn!("Clamping bump pool block of {capacity} bytes to remaining memory budget of {budget} bytes");
                capacity = budget;
            }
        }

        self.allocate_block(capacity, alignment)
    }

    fn allocate_block(&self, capacity: vk::DeviceSize, alignment: vk::DeviceSize) -> Result<PoolBlock<A>> {
        let mut allocator = self.allocator.borrow_mut();
        let allocation = allocator.allocate("bump_pool_block", capacity, alignment, self.usage, self.memory_type)?;
        if self.memory_type.is_mappable() && allocation.mapped_ptr().is_none() {
            allocator.free(allocation)?;
            anyhow::bail!(Error::UnmappableBuffer);
        }
        #[cfg(feature = "log-objects")]
        trace!("Allocated bump pool block {:p} (size = {capacity} bytes)", allocation.buffer());
        Ok(PoolBlock {
            allocation,
            range: MemoryRange {
                offset: 0,
                capacity,
            },
        })
    }

    fn view<'p>(block: usize, allocation: &A::Allocation, offset: vk::DeviceSize, size: vk::DeviceSize) -> PoolAllocation<'p> {
        PoolAllocation {
            block,
            buffer: allocation.buffer(),
            offset,
            size,
            address: allocation.device_address() + offset,
            // SAFETY: offset + size lies inside the mapped block.
            pointer: allocation
                .mapped_ptr()
                .and_then(|base| NonNull::new(unsafe { base.as_ptr().cast::<u8>().add(offset as usize) }.cast::<c_void>())),
            _pool: PhantomData,
        }
    }
}

impl<A: Allocator> Drop for GrowableBumpPool<A> {
    fn drop(&mut self) {
        let allocator = self.allocator.get_mut();
        for block in std::mem::take(self.blocks.get_mut()) {
            if let Err(err) = allocator.free(block.allocation) {
                error!("Failed to free bump pool block: {err}");
            }
        }
    }
}
