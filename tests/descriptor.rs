use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use deimos::{
    DescriptorBufferBuilder, DescriptorDevice, DescriptorKind, DescriptorLayout, DescriptorResource, Error,
    GrowableBumpPool, MemoryType, SettingsBuilder,
};

use framework::{HostAllocator, MockDescriptorDevice};

mod framework;

fn make_pool(allocator: HostAllocator) -> Result<GrowableBumpPool<HostAllocator>> {
    let settings = SettingsBuilder::new().scratch_size(4096u64).scratch_alignment(16u64).build();
    GrowableBumpPool::new(allocator, &settings, vk::BufferUsageFlags::STORAGE_BUFFER)
}

fn layout() -> DescriptorLayout {
    DescriptorLayout::new()
        .with(DescriptorKind::AddressTable, 4)
        .with(DescriptorKind::SampledImage, 3)
        .with(DescriptorKind::Sampler, 2)
}

fn sampled(raw: u64) -> DescriptorResource {
    DescriptorResource::SampledImage {
        view: vk::ImageView::from_raw(raw),
        layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    }
}

fn descriptor_error(result: Result<impl std::fmt::Debug>) -> Error {
    let err = result.expect_err("operation should fail");
    match err.downcast::<Error>() {
        Ok(err) => err,
        Err(err) => panic!("unexpected error type: {err}"),
    }
}

#[test]
pub fn indices_increase_per_kind() -> Result<()> {
    framework::init_logging();
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096)?;

    let images: Vec<u32> = (1..=3)
        .map(|raw| builder.set_descriptor(DescriptorKind::SampledImage, &sampled(raw)))
        .collect::<Result<_>>()?;
    assert_eq!(images, vec![0, 1, 2]);
    assert_eq!(builder.set_descriptor(DescriptorKind::AddressTable, &DescriptorResource::Buffer { address: 0x100 })?, 0);
    assert_eq!(builder.set_descriptor(DescriptorKind::AddressTable, &DescriptorResource::Buffer { address: 0x200 })?, 1);

    assert!(matches!(
        descriptor_error(builder.set_descriptor(DescriptorKind::SampledImage, &sampled(4))),
        Error::DescriptorPoolFull(DescriptorKind::SampledImage)
    ));
    Ok(())
}

#[test]
pub fn regions_are_aligned_and_disjoint() -> Result<()> {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096)?;

    let mut regions = Vec::new();
    for kind in [DescriptorKind::AddressTable, DescriptorKind::SampledImage, DescriptorKind::Sampler] {
        let record = builder.pool(kind).expect("kind is in the layout");
        let region = record.region().expect("region is reserved");
        assert_eq!(region.offset() % MockDescriptorDevice::ALIGNMENT, 0);
        assert_eq!(region.size(), record.capacity());
        regions.push((region.offset(), record.capacity()));
    }
    assert_eq!(regions, vec![(0, 32), (64, 96), (192, 32)]);
    assert!(builder.pool(DescriptorKind::StorageImage).is_none());
    Ok(())
}

#[test]
pub fn descriptor_data_is_written() -> Result<()> {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096)?;
    builder.set_descriptor(DescriptorKind::AddressTable, &DescriptorResource::Buffer { address: 0xdead_beef })?;
    builder.set_descriptor(DescriptorKind::AddressTable, &DescriptorResource::Buffer { address: 0x1234 })?;
    builder.set_descriptor(DescriptorKind::SampledImage, &sampled(5))?;
    builder.set_descriptor(DescriptorKind::SampledImage, &sampled(6))?;

    let mut table = [0u8; 16];
    builder.pool(DescriptorKind::AddressTable).and_then(|pool| pool.region()).expect("region exists").read(0, &mut table)?;
    assert_eq!(table[..8], 0xdead_beef_u64.to_le_bytes());
    assert_eq!(table[8..], 0x1234_u64.to_le_bytes());

    let mut descriptor = [0u8; 32];
    builder.pool(DescriptorKind::SampledImage).and_then(|pool| pool.region()).expect("region exists").read(32, &mut descriptor)?;
    assert_eq!(descriptor[..8], 6u64.to_le_bytes());
    assert!(descriptor[8..].iter().all(|byte| *byte == MockDescriptorDevice::tag(DescriptorKind::SampledImage)));
    Ok(())
}

#[test]
pub fn finalize_covers_written_descriptors() -> Result<()> {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096)?;
    builder.set_descriptor(DescriptorKind::SampledImage, &sampled(1))?;
    builder.set_descriptor(DescriptorKind::SampledImage, &sampled(2))?;
    builder.set_descriptor(DescriptorKind::Sampler, &DescriptorResource::Sampler(vk::Sampler::from_raw(9)))?;

    let buffers = builder.finalize();
    assert_eq!(buffers.len(), 3);
    let images = buffers.iter().find(|buffer| buffer.kind == DescriptorKind::SampledImage).expect("buffer exists");
    assert_eq!(images.count, 2);
    assert_eq!(images.size, 64);
    let region = builder.pool(DescriptorKind::SampledImage).and_then(|pool| pool.region()).expect("region exists");
    assert_eq!(images.offset, region.offset());
    assert_eq!(images.address, region.address());
    assert_eq!(images.buffer, region.buffer());
    let addresses = buffers.iter().find(|buffer| buffer.kind == DescriptorKind::AddressTable).expect("buffer exists");
    assert_eq!((addresses.count, addresses.size), (0, 0));

    // A new cycle starts at index zero again.
    assert_eq!(builder.set_descriptor(DescriptorKind::SampledImage, &sampled(3))?, 0);
    assert_eq!(builder.pool(DescriptorKind::SampledImage).map(|pool| pool.count()), Some(1));
    Ok(())
}

#[test]
pub fn layout_must_fit_backing_size() -> Result<()> {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let layout = DescriptorLayout::new()
        .with(DescriptorKind::AddressTable, 8)
        .with(DescriptorKind::SampledImage, 100);
    match descriptor_error(DescriptorBufferBuilder::init(&device, &pool, &layout, 1024)) {
        Error::DescriptorCapacityExceeded {
            kind,
            requested,
            capacity,
        } => {
            assert_eq!(kind, DescriptorKind::SampledImage);
            assert_eq!(requested, 3200);
            assert_eq!(capacity, 1024 - 64);
        }
        err => panic!("unexpected error: {err}"),
    }
    Ok(())
}

#[test]
pub fn zero_count_kind_is_always_full() -> Result<()> {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new())?;
    let layout = DescriptorLayout::new()
        .with(DescriptorKind::AddressTable, 4)
        .with(DescriptorKind::Sampler, 0);
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout, 4096)?;

    let samplers = builder.pool(DescriptorKind::Sampler).expect("kind is in the layout");
    assert_eq!(samplers.capacity(), 0);
    assert!(samplers.region().is_none());
    let sampler = DescriptorResource::Sampler(vk::Sampler::from_raw(1));
    assert!(matches!(
        descriptor_error(builder.set_descriptor(DescriptorKind::Sampler, &sampler)),
        Error::DescriptorPoolFull(DescriptorKind::Sampler)
    ));

    builder.set_descriptor(DescriptorKind::AddressTable, &DescriptorResource::Buffer { address: 0x100 })?;
    let buffers = builder.finalize();
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].kind, DescriptorKind::AddressTable);
    Ok(())
}

/// Reports zero-sized sampler descriptors.
struct ZeroSizedSamplers;

impl DescriptorDevice for ZeroSizedSamplers {
    fn descriptor_size(&self, kind: DescriptorKind) -> usize {
        match kind {
            DescriptorKind::Sampler => 0,
            kind => MockDescriptorDevice.descriptor_size(kind),
        }
    }

    fn descriptor_alignment(&self) -> vk::DeviceSize {
        MockDescriptorDevice.descriptor_alignment()
    }

    fn get_descriptor_data(&self, kind: DescriptorKind, resource: &DescriptorResource, out: &mut [u8]) -> Result<()> {
        MockDescriptorDevice.get_descriptor_data(kind, resource, out)
    }
}

#[test]
pub fn zero_sized_descriptors_are_rejected() -> Result<()> {
    let pool = make_pool(HostAllocator::new())?;
    assert!(matches!(
        descriptor_error(DescriptorBufferBuilder::init(&ZeroSizedSamplers, &pool, &layout(), 4096)),
        Error::InvalidDescriptorSize(DescriptorKind::Sampler)
    ));
    Ok(())
}

#[test]
pub fn layout_counts_replace() {
    let layout = DescriptorLayout::new()
        .with(DescriptorKind::Sampler, 2)
        .with(DescriptorKind::Sampler, 5);
    assert_eq!(layout.count(DescriptorKind::Sampler), Some(5));
    assert_eq!(layout.iter().count(), 1);
    assert_eq!(layout.count(DescriptorKind::StorageImage), None);
}

#[test]
pub fn device_local_backing_is_rejected() -> Result<()> {
    let device = MockDescriptorDevice;
    let settings = SettingsBuilder::new().scratch_size(4096u64).memory_type(MemoryType::GpuOnly).build();
    let pool = GrowableBumpPool::new(HostAllocator::unmapped(), &settings, vk::BufferUsageFlags::empty())?;
    assert!(matches!(
        descriptor_error(DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096)),
        Error::UnmappableBuffer
    ));
    Ok(())
}

#[test]
#[cfg_attr(debug_assertions, should_panic)]
pub fn missing_region_is_rejected() {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new()).unwrap();
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096).unwrap();
    let storage = DescriptorResource::StorageImage {
        view: vk::ImageView::from_raw(1),
    };
    assert!(builder.set_descriptor(DescriptorKind::StorageImage, &storage).is_err());
}

#[test]
#[cfg_attr(debug_assertions, should_panic)]
pub fn mismatched_kind_is_rejected() {
    let device = MockDescriptorDevice;
    let pool = make_pool(HostAllocator::new()).unwrap();
    let mut builder = DescriptorBufferBuilder::init(&device, &pool, &layout(), 4096).unwrap();
    assert!(builder.set_descriptor(DescriptorKind::Sampler, &sampled(1)).is_err());
}
