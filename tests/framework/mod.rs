#![allow(dead_code)]

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use deimos::{
    Allocation, Allocator, BarrierBatch, BufferBarrier, CommandStream, DescriptorDevice, DescriptorKind,
    DescriptorResource, ImageBarrier, MemoryBarrier, MemoryType, TaskBuffer, TaskImage,
};

/// Base of the fake device addresses handed out by [`HostAllocator`]. Every block gets its own 16 MiB window.
pub const ADDRESS_BASE: vk::DeviceAddress = 0x1000_0000;

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

#[derive(Debug, Default)]
pub struct AllocatorStats {
    pub allocations: usize,
    pub frees: usize,
    pub live_bytes: vk::DeviceSize,
    pub sizes: Vec<vk::DeviceSize>,
    next_handle: u64,
}

/// Allocator backed by host memory, so bump pools can be tested without a device.
#[derive(Debug, Clone, Default)]
pub struct HostAllocator {
    stats: Arc<Mutex<AllocatorStats>>,
    budget: Option<vk::DeviceSize>,
    unmapped: bool,
}

impl HostAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a memory budget of `budget` bytes minus everything currently allocated.
    pub fn with_budget(budget: vk::DeviceSize) -> Self {
        Self {
            budget: Some(budget),
            ..Default::default()
        }
    }

    /// Hand out blocks without a host pointer, like device local memory would.
    pub fn unmapped() -> Self {
        Self {
            unmapped: true,
            ..Default::default()
        }
    }

    pub fn allocations(&self) -> usize {
        self.stats.lock().unwrap().allocations
    }

    pub fn frees(&self) -> usize {
        self.stats.lock().unwrap().frees
    }

    pub fn live_bytes(&self) -> vk::DeviceSize {
        self.stats.lock().unwrap().live_bytes
    }

    /// Sizes of all blocks ever allocated, in allocation order.
    pub fn sizes(&self) -> Vec<vk::DeviceSize> {
        self.stats.lock().unwrap().sizes.clone()
    }
}

#[derive(Debug)]
pub struct HostAllocation {
    memory: Option<NonNull<u8>>,
    size: vk::DeviceSize,
    buffer: vk::Buffer,
    address: vk::DeviceAddress,
}

impl Allocation for HostAllocation {
    fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    fn size(&self) -> vk::DeviceSize {
        self.size
    }

    fn device_address(&self) -> vk::DeviceAddress {
        self.address
    }

    fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.memory.map(|memory| memory.cast())
    }
}

impl Drop for HostAllocation {
    fn drop(&mut self) {
        if let Some(memory) = self.memory.take() {
            let slice = std::ptr::slice_from_raw_parts_mut(memory.as_ptr(), self.size as usize);
            drop(unsafe { Box::from_raw(slice) });
        }
    }
}

impl Allocator for HostAllocator {
    type Allocation = HostAllocation;

    fn allocate(
        &mut self,
        _name: &str,
        size: vk::DeviceSize,
        _alignment: vk::DeviceSize,
        _usage: vk::BufferUsageFlags,
        _ty: MemoryType,
    ) -> Result<Self::Allocation> {
        let mut stats = self.stats.lock().unwrap();
        stats.allocations += 1;
        stats.next_handle += 1;
        stats.live_bytes += size;
        stats.sizes.push(size);
        let handle = stats.next_handle;

        let memory = if self.unmapped {
            None
        } else {
            let memory = vec![0u8; size as usize].into_boxed_slice();
            NonNull::new(Box::into_raw(memory).cast::<u8>())
        };
        Ok(HostAllocation {
            memory,
            size,
            buffer: vk::Buffer::from_raw(handle),
            address: ADDRESS_BASE * handle,
        })
    }

    fn free(&mut self, allocation: Self::Allocation) -> Result<()> {
        let mut stats = self.stats.lock().unwrap();
        stats.frees += 1;
        stats.live_bytes -= allocation.size;
        Ok(())
    }

    fn memory_budget(&self, _ty: MemoryType) -> Option<vk::DeviceSize> {
        let live = self.live_bytes();
        self.budget.map(|budget| budget.saturating_sub(live))
    }
}

/// Descriptor device with fixed descriptor sizes. Descriptors contain the raw handle followed by the kind tag.
#[derive(Debug, Default)]
pub struct MockDescriptorDevice;

impl MockDescriptorDevice {
    pub const ALIGNMENT: vk::DeviceSize = 64;

    pub fn tag(kind: DescriptorKind) -> u8 {
        match kind {
            DescriptorKind::AddressTable => 0xA0,
            DescriptorKind::SampledImage => 0xA1,
            DescriptorKind::StorageImage => 0xA2,
            DescriptorKind::Sampler => 0xA3,
        }
    }
}

impl DescriptorDevice for MockDescriptorDevice {
    fn descriptor_size(&self, kind: DescriptorKind) -> usize {
        match kind {
            DescriptorKind::AddressTable => 8,
            DescriptorKind::SampledImage => 32,
            DescriptorKind::StorageImage => 16,
            DescriptorKind::Sampler => 16,
        }
    }

    fn descriptor_alignment(&self) -> vk::DeviceSize {
        Self::ALIGNMENT
    }

    fn get_descriptor_data(&self, kind: DescriptorKind, resource: &DescriptorResource, out: &mut [u8]) -> Result<()> {
        let raw = match resource {
            DescriptorResource::SampledImage {
                view,
                ..
            } => view.as_raw(),
            DescriptorResource::StorageImage {
                view,
            } => view.as_raw(),
            DescriptorResource::Sampler(sampler) => sampler.as_raw(),
            DescriptorResource::Buffer {
                address,
            } => *address,
        };
        out[..8].copy_from_slice(&raw.to_le_bytes());
        out[8..].fill(Self::tag(kind));
        Ok(())
    }
}

/// Owned copy of one pipeline barrier command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBatch {
    pub images: Vec<ImageBarrier>,
    pub buffers: Vec<BufferBarrier>,
    pub memory: Option<MemoryBarrier>,
}

impl RecordedBatch {
    pub fn len(&self) -> usize {
        self.images.len() + self.buffers.len() + self.memory.is_some() as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PipelineBarrier(RecordedBatch),
    BeginLabel(String),
    EndLabel,
    /// Emitted by pass executors under test.
    Marker(String),
}

/// Command stream recording everything into a list.
#[derive(Debug, Default)]
pub struct RecordingStream {
    pub commands: Vec<Command>,
}

impl RecordingStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, name: impl Into<String>) {
        self.commands.push(Command::Marker(name.into()));
    }

    /// All pipeline barrier commands, in recording order.
    pub fn batches(&self) -> Vec<&RecordedBatch> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::PipelineBarrier(batch) => Some(batch),
                _ => None,
            })
            .collect()
    }

    /// Recorded commands without debug labels.
    pub fn without_labels(&self) -> Vec<&Command> {
        self.commands
            .iter()
            .filter(|command| !matches!(command, Command::BeginLabel(_) | Command::EndLabel))
            .collect()
    }
}

impl CommandStream for RecordingStream {
    fn pipeline_barrier(&mut self, batch: &BarrierBatch<'_>) {
        self.commands.push(Command::PipelineBarrier(RecordedBatch {
            images: batch.images.to_vec(),
            buffers: batch.buffers.to_vec(),
            memory: batch.memory,
        }));
    }

    fn begin_label(&mut self, name: &str, _color: [f32; 4]) {
        self.commands.push(Command::BeginLabel(name.to_owned()));
    }

    fn end_label(&mut self) {
        self.commands.push(Command::EndLabel);
    }
}

pub fn color_image(raw: u64) -> TaskImage {
    TaskImage::new(vk::Image::from_raw(raw), vk::ImageAspectFlags::COLOR)
}

pub fn buffer(raw: u64) -> TaskBuffer {
    TaskBuffer::new(vk::Buffer::from_raw(raw))
}
