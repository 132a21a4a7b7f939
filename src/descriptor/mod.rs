//! This module handles bindless descriptor buffers.
//!
//! Instead of binding descriptors through fixed slots in descriptor sets, descriptors are written as raw bytes into
//! buffers that shaders index directly. The [`DescriptorBufferBuilder`](builder::DescriptorBufferBuilder) lays out one
//! region per [`DescriptorKind`]. Image and sampler descriptors are obtained from the device layer through
//! [`DescriptorDevice`](crate::DescriptorDevice). Buffers are stored in an address table of 8-byte device addresses.
//!
//! The backing memory comes from a [`GrowableBumpPool`](crate::GrowableBumpPool), the same kind of pool used for
//! per-frame scratch memory.

pub mod builder;
pub mod layout;

pub use layout::{DescriptorKind, DescriptorResource};
