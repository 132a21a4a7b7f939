//! Exposes the [`DescriptorBufferBuilder`], which writes descriptors into per-kind regions of a bump pool.
//!
//! Every descriptor kind in a [`DescriptorLayout`] gets a region reserved up front. Writing a descriptor fills the next
//! free slot of its region and returns the slot index, which shaders use to address the descriptor. Finalizing the
//! builder yields one [`DescriptorBuffer`] per kind covering exactly the written descriptors, and starts a new cycle.
//! Indices are only stable within one cycle.
//!
//! The builder borrows the pool its regions live in for as long as it exists.
//!
//! # Example
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn bind_textures<D: DescriptorDevice, A: Allocator>(
//!     device: &D,
//!     pool: &GrowableBumpPool<A>,
//!     views: &[vk::ImageView],
//! ) -> Result<Vec<DescriptorBuffer>> {
//!     let layout = DescriptorLayout::new().with(DescriptorKind::SampledImage, views.len() as u32);
//!     let mut builder = DescriptorBufferBuilder::init(device, pool, &layout, 64 * 1024)?;
//!     for view in views {
//!         builder.set_descriptor(
//!             DescriptorKind::SampledImage,
//!             &DescriptorResource::SampledImage { view: *view, layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL },
//!         )?;
//!     }
//!     Ok(builder.finalize())
//! }
//! ```
//!
//! Dropping the pool while a builder still writes into it does not compile:
//! ```compile_fail
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn write_after_drop<D: DescriptorDevice, A: Allocator>(device: &D, pool: GrowableBumpPool<A>) -> Result<u32> {
//!     let layout = DescriptorLayout::new().with(DescriptorKind::Sampler, 1);
//!     let mut builder = DescriptorBufferBuilder::init(device, &pool, &layout, 1024)?;
//!     drop(pool);
//!     builder.set_descriptor(DescriptorKind::Sampler, &DescriptorResource::Sampler(vk::Sampler::default()))
//! }
//! ```

use anyhow::Result;
use ash::vk;
use smallvec::{smallvec, SmallVec};

use crate::{Allocator, DescriptorDevice, Error, GrowableBumpPool};
use crate::descriptor::layout::{ADDRESS_ENTRY_SIZE, DescriptorKind, DescriptorLayout, DescriptorPool, DescriptorResource};
use crate::util::align::align;

/// Finalized descriptors of one kind, ready to be bound as a descriptor buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DescriptorBuffer {
    pub kind: DescriptorKind,
    /// Buffer the descriptors live in.
    pub buffer: vk::Buffer,
    /// Byte offset of the first descriptor in `buffer`.
    pub offset: vk::DeviceSize,
    /// Size of the written descriptors in bytes.
    pub size: vk::DeviceSize,
    /// Device address of the first descriptor.
    pub address: vk::DeviceAddress,
    /// Number of descriptors written.
    pub count: u32,
}

/// Writes descriptors into a descriptor buffer. See the [module documentation](self).
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct DescriptorBufferBuilder<'d, 'p, D: DescriptorDevice + ?Sized> {
    #[derivative(Debug = "ignore")]
    device: &'d D,
    pools: Vec<DescriptorPool<'p>>,
}

impl<'d, 'p, D: DescriptorDevice + ?Sized> DescriptorBufferBuilder<'d, 'p, D> {
    /// Reserve a region for every kind in `layout` from `pool`. All regions together may not exceed `backing_size` bytes.
    /// # Errors
    /// * Fails with [`Error::InvalidDescriptorSize`] if the device reports a descriptor size of zero for a kind.
    /// * Fails with [`Error::DescriptorCapacityExceeded`] if the regions do not fit in `backing_size` bytes.
    /// * Fails with [`Error::UnmappableBuffer`] if the pool memory is not host visible.
    /// * Fails if allocating from the pool fails.
    pub fn init<A: Allocator>(
        device: &'d D,
        pool: &'p GrowableBumpPool<A>,
        layout: &DescriptorLayout,
        backing_size: vk::DeviceSize,
    ) -> Result<Self> {
        let alignment = device.descriptor_alignment();
        let mut reserved: vk::DeviceSize = 0;
        let mut pools = Vec::new();

        for (kind, max_count) in layout.iter() {
            let descriptor_size = match kind {
                DescriptorKind::AddressTable => ADDRESS_ENTRY_SIZE,
                _ => device.descriptor_size(kind),
            };
            if descriptor_size == 0 {
                anyhow::bail!(Error::InvalidDescriptorSize(kind));
            }
            if max_count == 0 {
                pools.push(DescriptorPool {
                    kind,
                    max_count,
                    descriptor_size,
                    offset: 0,
                    region: None,
                });
                continue;
            }

            let bytes = (max_count as vk::DeviceSize).saturating_mul(descriptor_size as vk::DeviceSize);
            let start = align(reserved, alignment).unwrap_or(vk::DeviceSize::MAX);
            let Some(end) = start.checked_add(bytes).filter(|end| *end <= backing_size) else {
                anyhow::bail!(Error::DescriptorCapacityExceeded {
                    kind,
                    requested: bytes,
                    capacity: backing_size.saturating_sub(start),
                });
            };
            reserved = end;

            let region = pool.allocate(bytes, alignment)?;
            if !region.is_mapped() {
                anyhow::bail!(Error::UnmappableBuffer);
            }
            pools.push(DescriptorPool {
                kind,
                max_count,
                descriptor_size,
                offset: 0,
                region: Some(region),
            });
        }

        debug!("Initialized descriptor buffer layout with {} regions ({reserved} bytes)", pools.len());
        Ok(Self {
            device,
            pools,
        })
    }

    /// Write a descriptor into the next free slot of its kind and return the slot index.
    /// Indices start at zero and increase by one for every write in a cycle.
    /// # Errors
    /// * Fails with [`Error::NoDescriptorRegion`] if the layout did not include this kind. This is asserted in debug builds.
    /// * Fails with [`Error::DescriptorKindMismatch`] if the resource cannot be written as this kind. This is asserted in debug builds.
    /// * Fails with [`Error::DescriptorPoolFull`] if all slots of this kind are used, or the layout reserved none.
    /// * Fails if the device layer cannot produce the descriptor data.
    pub fn set_descriptor(&mut self, kind: DescriptorKind, resource: &DescriptorResource) -> Result<u32> {
        debug_assert_eq!(resource.kind(), kind, "descriptor resource does not match descriptor kind");
        if resource.kind() != kind {
            anyhow::bail!(Error::DescriptorKindMismatch(kind));
        }

        let Some(pool) = self.pools.iter_mut().find(|pool| pool.kind == kind) else {
            debug_assert!(false, "no descriptor region initialized for {kind:?}");
            anyhow::bail!(Error::NoDescriptorRegion(kind));
        };

        let index = pool.count();
        let region = match pool.region {
            Some(region) if index < pool.max_count => region,
            _ => anyhow::bail!(Error::DescriptorPoolFull(kind)),
        };

        let mut data: SmallVec<[u8; 64]> = smallvec![0; pool.descriptor_size];
        match resource {
            DescriptorResource::Buffer {
                address,
            } => data.copy_from_slice(&address.to_le_bytes()),
            _ => self.device.get_descriptor_data(kind, resource, &mut data)?,
        }
        region.write(pool.offset, &data)?;
        pool.offset += pool.descriptor_size as vk::DeviceSize;
        Ok(index)
    }

    /// Region record of a kind.
    pub fn pool(&self, kind: DescriptorKind) -> Option<&DescriptorPool<'p>> {
        self.pools.iter().find(|pool| pool.kind == kind)
    }

    /// Produce one descriptor buffer per reserved kind, sized to the descriptors written in this cycle, and start a
    /// new cycle. Kinds declared with a count of zero have nothing to bind and are left out.
    /// The returned buffers stay valid until the next cycle writes over them, so the next cycle may only start once
    /// the GPU is done reading them.
    pub fn finalize(&mut self) -> Vec<DescriptorBuffer> {
        self.pools
            .iter_mut()
            .filter_map(|pool| {
                let region = pool.region?;
                let buffer = DescriptorBuffer {
                    kind: pool.kind,
                    buffer: region.buffer(),
                    offset: region.offset(),
                    size: pool.offset,
                    address: region.address(),
                    count: pool.count(),
                };
                pool.offset = 0;
                Some(buffer)
            })
            .collect()
    }
}
