//! Contains a default allocator type based on the [`gpu_allocator`] crate that is good for most needs.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;
use gpu_allocator::vulkan as vk_alloc;
use gpu_allocator::vulkan::AllocationScheme;

use crate::{Allocator, Error};
use crate::allocator::memory_type::MemoryType;
use crate::allocator::traits;

/// The default allocator. This calls into the `gpu_allocator` crate and creates a buffer for every block it
/// hands out. It's important to note that this allocator is `Clone`, `Send` and `Sync`. All its internal state
/// is wrapped inside an `Arc<Mutex<T>>`.
///
/// See also: [`Allocator`](traits::Allocator), [`Allocation`](traits::Allocation)
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DefaultAllocator {
    #[derivative(Debug = "ignore")]
    device: ash::Device,
    #[derivative(Debug = "ignore")]
    alloc: Arc<Mutex<vk_alloc::Allocator>>,
}

/// Block returned from the default allocator. The buffer is destroyed and the memory freed when it is dropped,
/// so it's not strictly necessary to call [`DefaultAllocator::free()`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Allocation {
    // Wrapped in `Option`s so we can move out of them in `Drop`. Always Some(_) until freed.
    allocator: Option<DefaultAllocator>,
    allocation: Option<vk_alloc::Allocation>,
    buffer: vk::Buffer,
    size: vk::DeviceSize,
    address: vk::DeviceAddress,
}

impl DefaultAllocator {
    /// Create a new default allocator. The device must have the `bufferDeviceAddress` feature enabled.
    /// # Errors
    /// * May fail if creating the internal `gpu_allocator` fails.
    pub fn new(instance: &ash::Instance, device: &ash::Device, physical_device: vk::PhysicalDevice) -> Result<Self> {
        Ok(Self {
            device: device.clone(),
            alloc: Arc::new(Mutex::new(vk_alloc::Allocator::new(&vk_alloc::AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: true,
            })?)),
        })
    }

    fn free_impl(&mut self, allocation: &mut Allocation) -> Result<()> {
        let Some(memory) = allocation.allocation.take() else {
            return Ok(());
        };
        let mut alloc = self.alloc.lock().map_err(|_| Error::PoisonError)?;
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkBuffer {:p} (size = {} bytes)", allocation.buffer, allocation.size);
        // SAFETY: The buffer was created by this allocator and is no longer in use once its block is freed.
        unsafe {
            self.device.destroy_buffer(allocation.buffer, None);
        }
        alloc.free(memory)?;
        Ok(())
    }
}

impl Allocator for DefaultAllocator {
    type Allocation = Allocation;

    /// Create a buffer of `size` bytes and bind freshly allocated memory to it.
    /// The buffer always has `SHADER_DEVICE_ADDRESS` usage so pools can hand out device addresses.
    /// # Errors
    /// * May fail if the device is out of memory
    /// * May fail if the buffer could not be created or bound.
    fn allocate(
        &mut self,
        name: &str,
        size: vk::DeviceSize,
        alignment: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        ty: MemoryType,
    ) -> Result<Self::Allocation> {
        let info = vk::BufferCreateInfo {
            size,
            usage: usage | vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        };
        // SAFETY: Valid device and create info.
        let buffer = unsafe { self.device.create_buffer(&info, None)? };
        let mut requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };
        requirements.alignment = requirements.alignment.max(alignment);

        let memory = {
            let mut alloc = self.alloc.lock().map_err(|_| Error::PoisonError)?;
            alloc.allocate(&vk_alloc::AllocationCreateDesc {
                name,
                requirements,
                location: gpu_allocator::MemoryLocation::from(ty),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
        };
        let memory = match memory {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { self.device.destroy_buffer(buffer, None) };
                return Err(Error::from(err).into());
            }
        };

        // SAFETY: The memory was allocated with the requirements of this buffer.
        if let Err(err) = unsafe { self.device.bind_buffer_memory(buffer, memory.memory(), memory.offset()) } {
            unsafe { self.device.destroy_buffer(buffer, None) };
            let mut alloc = self.alloc.lock().map_err(|_| Error::PoisonError)?;
            alloc.free(memory)?;
            return Err(Error::from(err).into());
        }
        let address = unsafe {
            self.device.get_buffer_device_address(&vk::BufferDeviceAddressInfo {
                buffer,
                ..Default::default()
            })
        };

        #[cfg(feature = "log-objects")]
        trace!("Created new VkBuffer {buffer:p} (name = {name}, size = {size} bytes)");

        Ok(Allocation {
            allocator: Some(self.clone()),
            allocation: Some(memory),
            buffer,
            size,
            address,
        })
    }

    /// Explicitly free a block owned by this allocator. This is generally not needed,
    /// since the implementation of [`Drop`] for [`Allocation`] already handles this.
    fn free(&mut self, mut allocation: Self::Allocation) -> Result<()> {
        self.free_impl(&mut allocation)
    }
}

impl traits::Allocation for Allocation {
    fn buffer(&self) -> vk::Buffer {
        self.buffer
    }

    fn size(&self) -> vk::DeviceSize {
        self.size
    }

    fn device_address(&self) -> vk::DeviceAddress {
        self.address
    }

    /// Obtain a mapped pointer to this block. Returns `None` if this memory was not allocated from a
    /// [`HOST_VISIBLE`](ash::vk::MemoryPropertyFlags::HOST_VISIBLE) heap.
    fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.allocation.as_ref().and_then(|allocation| allocation.mapped_ptr())
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if let Some(mut allocator) = self.allocator.take() {
            if let Err(err) = allocator.free_impl(self) {
                error!("Failed to free allocation: {err}");
            }
        }
    }
}
