//! Exposes the interface this crate needs from the device layer to write descriptor data.

use anyhow::Result;
use ash::vk;

use crate::descriptor::{DescriptorKind, DescriptorResource};

/// The part of the device layer the descriptor buffer builder talks to. With `VK_EXT_descriptor_buffer` this maps
/// directly onto `vkGetDescriptorEXT` and the descriptor size properties of the physical device.
pub trait DescriptorDevice {
    /// Size in bytes of one descriptor of the given kind.
    fn descriptor_size(&self, kind: DescriptorKind) -> usize;

    /// Required alignment of the start of every descriptor region.
    fn descriptor_alignment(&self) -> vk::DeviceSize;

    /// Write the native descriptor for `resource` into `out`. `out` is exactly
    /// [`descriptor_size(kind)`](Self::descriptor_size) bytes long.
    /// # Errors
    /// * Fails if the resource cannot be described as a descriptor of this kind.
    fn get_descriptor_data(&self, kind: DescriptorKind, resource: &DescriptorResource, out: &mut [u8]) -> Result<()>;
}
