//! Descriptor kinds, layouts and the per-kind region records of a descriptor buffer.

use ash::vk;

use crate::allocator::bump_pool::PoolAllocation;

/// Size of one entry in the address table.
pub const ADDRESS_ENTRY_SIZE: usize = std::mem::size_of::<vk::DeviceAddress>();

static_assertions::const_assert_eq!(ADDRESS_ENTRY_SIZE, 8);

/// Kind of descriptor stored in a descriptor buffer region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DescriptorKind {
    /// Table of buffer device addresses, indexed by shaders to access buffers bindlessly.
    AddressTable,
    /// Sampled image descriptors.
    SampledImage,
    /// Storage image descriptors.
    StorageImage,
    /// Sampler descriptors.
    Sampler,
}

impl DescriptorKind {
    /// Descriptor type shaders see for this kind.
    pub fn descriptor_type(&self) -> vk::DescriptorType {
        match self {
            DescriptorKind::AddressTable => vk::DescriptorType::STORAGE_BUFFER,
            DescriptorKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
            DescriptorKind::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
            DescriptorKind::Sampler => vk::DescriptorType::SAMPLER,
        }
    }
}

/// A resource to write into a descriptor buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DescriptorResource {
    /// A buffer, referenced by its device address.
    Buffer {
        address: vk::DeviceAddress,
    },
    /// An image view sampled in the given layout.
    SampledImage {
        view: vk::ImageView,
        layout: vk::ImageLayout,
    },
    /// An image view used as storage image. Storage images are always in the general layout.
    StorageImage {
        view: vk::ImageView,
    },
    Sampler(vk::Sampler),
}

impl DescriptorResource {
    /// Descriptor kind this resource can be written as.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            DescriptorResource::Buffer {
                ..
            } => DescriptorKind::AddressTable,
            DescriptorResource::SampledImage {
                ..
            } => DescriptorKind::SampledImage,
            DescriptorResource::StorageImage {
                ..
            } => DescriptorKind::StorageImage,
            DescriptorResource::Sampler(_) => DescriptorKind::Sampler,
        }
    }
}

/// Maximum number of descriptors of each kind in a descriptor buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DescriptorLayout {
    counts: Vec<(DescriptorKind, u32)>,
}

impl DescriptorLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve room for `count` descriptors of a kind. Calling this again for the same kind replaces the count.
    pub fn with(mut self, kind: DescriptorKind, count: u32) -> Self {
        match self.counts.iter_mut().find(|(existing, _)| *existing == kind) {
            Some((_, existing)) => *existing = count,
            None => self.counts.push((kind, count)),
        }
        self
    }

    /// Maximum count of a kind, if the layout has it.
    pub fn count(&self, kind: DescriptorKind) -> Option<u32> {
        self.counts.iter().find(|(existing, _)| *existing == kind).map(|(_, count)| *count)
    }

    /// All kinds in this layout, in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = (DescriptorKind, u32)> + '_ {
        self.counts.iter().copied()
    }
}

/// Region record of one descriptor kind inside a descriptor buffer.
/// Kinds declared with a count of zero keep a record without a region.
#[derive(Debug, Copy, Clone)]
pub struct DescriptorPool<'p> {
    pub(crate) kind: DescriptorKind,
    pub(crate) max_count: u32,
    pub(crate) descriptor_size: usize,
    pub(crate) offset: vk::DeviceSize,
    pub(crate) region: Option<PoolAllocation<'p>>,
}

impl<'p> DescriptorPool<'p> {
    pub fn kind(&self) -> DescriptorKind {
        self.kind
    }

    /// Maximum number of descriptors in this region.
    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    /// Size of a single descriptor in bytes.
    pub fn descriptor_size(&self) -> usize {
        self.descriptor_size
    }

    /// Byte offset of the next free slot, relative to the start of this region.
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    /// Number of descriptors written in the current cycle.
    pub fn count(&self) -> u32 {
        (self.offset / self.descriptor_size as vk::DeviceSize) as u32
    }

    /// Reserved size of this region in bytes.
    pub fn capacity(&self) -> vk::DeviceSize {
        self.max_count as vk::DeviceSize * self.descriptor_size as vk::DeviceSize
    }

    /// Bump pool allocation backing this region. `None` if no descriptors of this kind were reserved.
    pub fn region(&self) -> Option<&PoolAllocation<'p>> {
        self.region.as_ref()
    }
}
