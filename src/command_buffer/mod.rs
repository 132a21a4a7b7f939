//! The recording boundary of the crate.
//!
//! Barriers and pass commands are recorded into anything implementing [`CommandStream`]. The
//! [`IncompleteCommandBuffer`] implements it over a Vulkan command buffer in the recording state. Tests and tools
//! can implement it to capture the emitted barrier batches instead.

pub mod incomplete;
pub mod traits;

pub use incomplete::IncompleteCommandBuffer;
