//! GPU command recording synchronization for Vulkan
//!
//! Deimos tracks how images and buffers are used across a sequence of passes, derives the pipeline barriers between
//! those uses, batches passes into ordered groups and lays out bindless descriptor buffers. Device and swapchain
//! creation, windowing and shader compilation are left to the application. This crate only needs opaque
//! handles to the resources it synchronizes and something to record commands into.
//!
//! To get started, the easiest way is to simply
//! ```
//! // Import all important traits
//! use deimos::prelude::traits;
//! // Import types under a namespace.
//! use deimos::prelude as dm;
//!
//! // Or, if you dont care about using the types under a namespace
//! use deimos::prelude::*;
//! ```
//!
//! # Example
//!
//! First, define [`Settings`](crate::Settings) for the memory pools and task graphs.
//! ```
//! use deimos::prelude::*;
//!
//! let settings = SettingsBuilder::new()
//!     .scratch_size(64 * 1024u64) // 64 KiB per pool block
//!     .frames_in_flight(2)
//!     .build();
//! ```
//! Per-frame scratch memory lives in [`FramePools`](crate::FramePools), one
//! [`GrowableBumpPool`](crate::GrowableBumpPool) per frame in flight.
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn create_pools(instance: &ash::Instance, device: &ash::Device, physical_device: vk::PhysicalDevice, settings: &Settings)
//!     -> Result<FramePools<DefaultAllocator>> {
//!     let allocator = DefaultAllocator::new(instance, device, physical_device)?;
//!     FramePools::new(allocator, settings, vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::STORAGE_BUFFER)
//! }
//! ```
//! Every frame, passes are declared in a [`TaskGraph`](crate::TaskGraph), compiled and recorded into a command buffer.
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn record(cmd: &mut IncompleteCommandBuffer, target: &TaskImage) -> Result<()> {
//!     let mut graph = TaskGraph::new();
//!     graph.add_pass(PassBuilder::new("clear").use_image(target, TaskAccess::TRANSFER_WRITE, vk::ImageLayout::TRANSFER_DST_OPTIMAL).build(), None)?;
//!     graph.compile()?;
//!     graph.execute(cmd)
//! }
//! ```
//! For further example code, check out the following modules
//! - [`graph`] for declaring passes and compiling task graphs.
//! - [`sync`] for resource state tracking, barrier synthesis and barrier batching.
//! - [`descriptor`] for bindless descriptor buffers.
//! - [`allocator`] for the bump pool and the allocator traits.
//! - [`command_buffer`] for the recording boundary.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod allocator;
pub mod command_buffer;
pub mod core;
pub mod descriptor;
pub mod frame;
pub mod graph;
pub mod sync;
pub mod util;
