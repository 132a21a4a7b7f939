//! The task graph system manages synchronization **within a single command stream**. Each task declares the
//! resources it uses and how it uses them. Tasks are scheduled into groups, either by joining the head group or by
//! depending on an earlier group, and compiling the graph computes one barrier for every declared use, including
//! the image layout transitions.
//!
//! Resources are plain Vulkan handles wrapped in a [`TaskImage`](resource::TaskImage) or
//! [`TaskBuffer`](resource::TaskBuffer). The graph never owns them.
//!
//! Through the [`GraphViz`](viz::GraphViz) trait, it's possible to export a graphviz-compatible dot file to display
//! a compiled task graph.
//!
//! # Example
//!
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn frame<S: CommandStream>(stream: &mut S, color: &TaskImage, swapchain: &TaskImage) -> Result<()> {
//!     let mut graph = TaskGraph::new();
//!     let render = graph.add_pass(PassBuilder::new("render").color_attachment(color).build(), None)?;
//!     graph.add_pass(
//!         PassBuilder::new("composite")
//!             .sample_image(color, PipelineStage::FRAGMENT_SHADER)
//!             .color_attachment(swapchain)
//!             .build(),
//!         Some(render),
//!     )?;
//!     // Leave the swapchain image ready for presentation.
//!     graph.add_boundary(ResourceUse::image(swapchain, TaskAccess::PRESENT, vk::ImageLayout::PRESENT_SRC_KHR));
//!     graph.compile()?;
//!     graph.execute(stream)
//! }
//! ```
//!
//! For more complex passes, see the [`pass`] module documentation.

pub mod pass;
pub mod resource;
pub mod task_graph;
pub mod viz;
