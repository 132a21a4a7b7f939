//! Exposes the settings used to configure pools, frame slots and task graph compilation.

use ash::vk;

use crate::allocator::memory_type::MemoryType;

/// Settings shared by the bump pools, per-frame pool sets and task graphs created from them.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Capacity of each block a [`GrowableBumpPool`](crate::GrowableBumpPool) allocates when it grows.
    /// Requests larger than this get a block of their own size.
    pub scratch_size: vk::DeviceSize,
    /// Minimum alignment of every allocation from a bump pool. Must be a power of two.
    pub scratch_alignment: vk::DeviceSize,
    /// Memory type bump pool blocks are allocated with. Descriptor buffers need this to be host visible.
    pub memory_type: MemoryType,
    /// Number of frames that can be recorded before the oldest one must have finished executing.
    /// One set of pools is kept per frame.
    pub frames_in_flight: usize,
    /// Whether an exhausted bump pool may append new blocks. If this is false, allocations that do not fit in the
    /// current block fail with [`Error::PoolExhausted`](crate::Error::PoolExhausted).
    pub allow_pool_growth: bool,
    /// Drop barriers whose source and destination state are identical while compiling a task graph.
    /// This is off by default, every resource use produces exactly one barrier.
    pub elide_redundant_barriers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scratch_size: 64 * 1024,
            scratch_alignment: 256,
            memory_type: MemoryType::CpuToGpu,
            frames_in_flight: 2,
            allow_pool_growth: true,
            elide_redundant_barriers: false,
        }
    }
}

/// The settings builder is a convenience struct to easily create [`Settings`].
///
/// For information about each of the fields, see [`Settings`]
/// # Example
/// ```
/// # use deimos::*;
/// let settings: Settings = SettingsBuilder::new()
///     .scratch_size(1024u64)
///     .frames_in_flight(3)
///     .build();
/// assert_eq!(settings.scratch_size, 1024);
/// ```
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    inner: Settings,
}

impl SettingsBuilder {
    /// Create a new settings builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block capacity of bump pools.
    pub fn scratch_size(mut self, size: impl Into<vk::DeviceSize>) -> Self {
        self.inner.scratch_size = size.into();
        self
    }

    /// Set the minimum alignment of bump pool allocations.
    pub fn scratch_alignment(mut self, alignment: impl Into<vk::DeviceSize>) -> Self {
        self.inner.scratch_alignment = alignment.into();
        self
    }

    /// Set the memory type of bump pool blocks.
    pub fn memory_type(mut self, ty: MemoryType) -> Self {
        self.inner.memory_type = ty;
        self
    }

    /// Set the amount of frames in flight.
    pub fn frames_in_flight(mut self, frames: usize) -> Self {
        self.inner.frames_in_flight = frames;
        self
    }

    /// Allow or disallow bump pools to grow.
    pub fn pool_growth(mut self, allow: bool) -> Self {
        self.inner.allow_pool_growth = allow;
        self
    }

    /// Enable eliding barriers between identical states.
    pub fn elide_redundant_barriers(mut self, elide: bool) -> Self {
        self.inner.elide_redundant_barriers = elide;
        self
    }

    /// Build the resulting settings.
    pub fn build(self) -> Settings {
        self.inner
    }
}
