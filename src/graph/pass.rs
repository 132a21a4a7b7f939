//! This module mainly exposes the [`PassBuilder`] struct, used for defining tasks in a [`TaskGraph`](crate::TaskGraph).
//!
//! Each pass declares the resources it uses and how it uses them, and can optionally specify a closure to be executed
//! when the graph is recorded to a command stream. A color can be given to each pass, which shows up in debuggers like
//! [*RenderDoc*](https://renderdoc.org/) if the `debug-markers` feature is enabled.
//!
//! # Example
//!
//! An offscreen pass writing to an image, and a pass sampling from it afterwards.
//! ```
//! # use deimos::prelude::*;
//! # use anyhow::Result;
//! fn build<'a, S: CommandStream + 'a>(graph: &mut TaskGraph<'a, S>, offscreen: &TaskImage) -> Result<()> {
//!     let render = PassBuilder::new("offscreen")
//!         .color([1.0, 0.0, 0.0, 1.0])
//!         .color_attachment(offscreen)
//!         .build();
//!     let group = graph.add_pass(render, None)?;
//!
//!     let sample = PassBuilder::new("sample")
//!         .sample_image(offscreen, PipelineStage::FRAGMENT_SHADER)
//!         .execute_fn(|_ctx| {
//!             // Record draw commands here
//!             Ok(())
//!         })
//!         .build();
//!     graph.add_pass(sample, Some(group))?;
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use ash::vk;

use crate::command_buffer::traits::CommandStream;
use crate::graph::resource::{ResourceUse, TaskBuffer, TaskImage};
use crate::graph::task_graph::GroupId;
use crate::sync::access::{AccessType, PipelineStage, TaskAccess};

/// Everything a pass executor gets to see while it is recorded.
pub struct PassContext<'a, S: ?Sized> {
    stream: &'a mut S,
    name: &'a str,
    uses: &'a [ResourceUse],
    group: GroupId,
}

impl<'a, S: ?Sized> PassContext<'a, S> {
    pub(crate) fn new(stream: &'a mut S, name: &'a str, uses: &'a [ResourceUse], group: GroupId) -> Self {
        Self {
            stream,
            name,
            uses,
            group,
        }
    }

    /// The command stream to record into. All barriers for this pass' uses have been recorded already.
    pub fn stream(&mut self) -> &mut S {
        self.stream
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Resource uses declared by this pass.
    pub fn uses(&self) -> &[ResourceUse] {
        self.uses
    }

    /// Group this pass was scheduled in.
    pub fn group(&self) -> GroupId {
        self.group
    }
}

/// Defines a pass executor that can be called when the pass is recorded.
pub trait PassExecutor<S: ?Sized> {
    /// Record this pass to a command stream.
    fn execute(&mut self, ctx: &mut PassContext<'_, S>) -> Result<()>;
}

impl<S, F> PassExecutor<S> for F
where
    S: ?Sized,
    F: FnMut(&mut PassContext<'_, S>) -> Result<()>,
{
    /// Record this pass by calling the given function.
    fn execute(&mut self, ctx: &mut PassContext<'_, S>) -> Result<()> {
        self(ctx)
    }
}

pub(crate) type BoxedPassFn<'cb, S> = Box<dyn PassExecutor<S> + 'cb>;

/// An empty pass executor that does nothing
pub struct EmptyPassExecutor;

impl EmptyPassExecutor {
    /// Creates an empty pass executor
    pub fn new() -> Self {
        Self {}
    }

    /// Create a new empty pass executor in a [`Box`]
    pub fn new_boxed() -> Box<Self> {
        Box::new(Self::new())
    }
}

impl Default for EmptyPassExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> PassExecutor<S> for EmptyPassExecutor {
    fn execute(&mut self, _ctx: &mut PassContext<'_, S>) -> Result<()> {
        Ok(())
    }
}

/// Represents one task in a task graph. You can obtain one using a [`PassBuilder`].
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Pass<'cb, S: ?Sized> {
    pub(crate) name: String,
    pub(crate) color: Option<[f32; 4]>,
    pub(crate) uses: Vec<ResourceUse>,
    #[derivative(Debug = "ignore")]
    pub(crate) execute: BoxedPassFn<'cb, S>,
}

impl<'cb, S: ?Sized + 'cb> Pass<'cb, S> {
    /// Create a pass that only declares resource uses and records nothing.
    pub fn from_uses(name: impl Into<String>, uses: impl IntoIterator<Item = ResourceUse>) -> Self {
        Self {
            name: name.into(),
            color: None,
            uses: uses.into_iter().collect(),
            execute: EmptyPassExecutor::new_boxed(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared resource uses, in declaration order.
    pub fn uses(&self) -> &[ResourceUse] {
        &self.uses
    }
}

/// Used to create [`Pass`] objects correctly.
pub struct PassBuilder<'cb, S: ?Sized> {
    inner: Pass<'cb, S>,
}

impl<'cb, S: ?Sized + 'cb> PassBuilder<'cb, S> {
    /// Create a new, empty pass.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Pass::from_uses(name, Vec::new()),
        }
    }

    /// Set the color of this pass. This shows up in graphics debuggers if the `debug-markers` feature is enabled.
    pub fn color(mut self, color: [f32; 4]) -> Self {
        self.inner.color = Some(color);
        self
    }

    /// Declare a use of an image with an explicit access and layout.
    pub fn use_image(mut self, image: &TaskImage, access: TaskAccess, layout: vk::ImageLayout) -> Self {
        self.inner.uses.push(ResourceUse::image(image, access, layout));
        self
    }

    /// Declare a use of a buffer with an explicit access.
    pub fn use_buffer(mut self, buffer: &TaskBuffer, access: TaskAccess) -> Self {
        self.inner.uses.push(ResourceUse::buffer(buffer, access));
        self
    }

    /// Write to an image as a color attachment.
    pub fn color_attachment(self, image: &TaskImage) -> Self {
        self.use_image(image, TaskAccess::COLOR_ATTACHMENT_WRITE, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
    }

    /// Use an image as the depth attachment.
    pub fn depth_attachment(self, image: &TaskImage) -> Self {
        self.use_image(image, TaskAccess::DEPTH_ATTACHMENT_WRITE, vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
    }

    /// Sample an image in the given pipeline stage.
    pub fn sample_image(self, image: &TaskImage, stage: PipelineStage) -> Self {
        self.use_image(image, TaskAccess::new(AccessType::READ, stage), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }

    /// Access an image as a storage image in the given pipeline stage.
    pub fn storage_image(self, image: &TaskImage, access: AccessType, stage: PipelineStage) -> Self {
        self.use_image(image, TaskAccess::new(access, stage), vk::ImageLayout::GENERAL)
    }

    /// Read from a buffer in the given pipeline stage.
    pub fn read_buffer(self, buffer: &TaskBuffer, stage: PipelineStage) -> Self {
        self.use_buffer(buffer, TaskAccess::new(AccessType::READ, stage))
    }

    /// Write to a buffer in the given pipeline stage.
    pub fn write_buffer(self, buffer: &TaskBuffer, stage: PipelineStage) -> Self {
        self.use_buffer(buffer, TaskAccess::new(AccessType::WRITE, stage))
    }

    /// Set the function to be called when recording this pass.
    pub fn execute_fn<F>(mut self, exec: F) -> Self
    where
        F: FnMut(&mut PassContext<'_, S>) -> Result<()> + 'cb,
    {
        self.inner.execute = Box::new(exec);
        self
    }

    /// Set the executor to be called when recording this pass.
    pub fn executor(mut self, exec: impl PassExecutor<S> + 'cb) -> Self {
        self.inner.execute = Box::new(exec);
        self
    }

    /// Obtain the built pass.
    pub fn build(self) -> Pass<'cb, S> {
        self.inner
    }
}

impl<S: CommandStream + ?Sized> PassContext<'_, S> {
    /// Open a debug label inside this pass.
    pub fn begin_label(&mut self, name: &str, color: [f32; 4]) {
        self.stream.begin_label(name, color);
    }

    pub fn end_label(&mut self) {
        self.stream.end_label();
    }
}
