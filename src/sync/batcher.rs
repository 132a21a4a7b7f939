//! Batching of barriers into as few pipeline barrier commands as possible.
//!
//! A [`CommandBatcher`] accumulates image, buffer and memory barriers and emits them as a single
//! `vkCmdPipelineBarrier2` when it is flushed. Image and buffer barriers are kept in fixed-capacity arrays. Inserting
//! into a full array flushes first. Dropping the batcher flushes whatever is still pending, so a batcher held on the
//! stack always emits its barriers before the surrounding scope ends.
//!
//! # Example
//! ```
//! # use deimos::prelude::*;
//! fn transition_to_present<S: CommandStream>(stream: &mut S, image: &TaskImage, tracker: &mut ResourceStateTracker) {
//!     let mut batcher = CommandBatcher::new(stream);
//!     batcher.use_resource(tracker, &ResourceUse::image(image, TaskAccess::PRESENT, vk::ImageLayout::PRESENT_SRC_KHR));
//!     // The barrier is emitted when `batcher` goes out of scope.
//! }
//! ```

use smallvec::SmallVec;

use crate::command_buffer::traits::CommandStream;
use crate::graph::resource::ResourceUse;
use crate::sync::barrier::{Barrier, BufferBarrier, ImageBarrier, MemoryBarrier};
use crate::sync::state::ResourceStateTracker;

/// One batched pipeline barrier command.
#[derive(Debug, Copy, Clone)]
pub struct BarrierBatch<'a> {
    pub images: &'a [ImageBarrier],
    pub buffers: &'a [BufferBarrier],
    pub memory: Option<MemoryBarrier>,
}

impl BarrierBatch<'_> {
    /// Number of barriers in this batch.
    pub fn len(&self) -> usize {
        self.images.len() + self.buffers.len() + self.memory.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates barriers and flushes them to a [`CommandStream`] in batches of at most `N` image and `N` buffer barriers.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CommandBatcher<'s, S: CommandStream + ?Sized, const N: usize = 32> {
    #[derivative(Debug = "ignore")]
    stream: &'s mut S,
    images: SmallVec<[ImageBarrier; N]>,
    buffers: SmallVec<[BufferBarrier; N]>,
    memory: Option<MemoryBarrier>,
}

impl<'s, S: CommandStream + ?Sized> CommandBatcher<'s, S> {
    /// Create a batcher with the default capacity of 32 image and 32 buffer barriers.
    pub fn new(stream: &'s mut S) -> Self {
        Self::with_capacity(stream)
    }
}

impl<'s, S: CommandStream + ?Sized, const N: usize> CommandBatcher<'s, S, N> {
    /// Create a batcher holding at most `N` image and `N` buffer barriers per batch.
    pub fn with_capacity(stream: &'s mut S) -> Self {
        Self {
            stream,
            images: SmallVec::new(),
            buffers: SmallVec::new(),
            memory: None,
        }
    }

    /// Add a barrier to the current batch.
    pub fn insert(&mut self, barrier: Barrier) {
        match barrier {
            Barrier::Image(barrier) => self.insert_image(barrier),
            Barrier::Buffer(barrier) => self.insert_buffer(barrier),
            Barrier::Memory(barrier) => self.insert_memory(barrier),
        }
    }

    /// Add an image barrier, flushing first if the image array is full.
    pub fn insert_image(&mut self, barrier: ImageBarrier) {
        if self.images.len() == N {
            self.flush();
        }
        self.images.push(barrier);
    }

    /// Add a buffer barrier, flushing first if the buffer array is full.
    pub fn insert_buffer(&mut self, barrier: BufferBarrier) {
        if self.buffers.len() == N {
            self.flush();
        }
        self.buffers.push(barrier);
    }

    /// Merge a memory barrier into the pending memory barrier.
    pub fn insert_memory(&mut self, barrier: MemoryBarrier) {
        self.memory = Some(match self.memory {
            Some(pending) => pending | barrier,
            None => barrier,
        });
    }

    /// Record a resource use in `tracker` and add the barrier from its previous state.
    pub fn use_resource(&mut self, tracker: &mut ResourceStateTracker, resource: &ResourceUse) {
        let prior = tracker.record_use(resource, None);
        self.insert(Barrier::between(&prior, resource));
    }

    /// Number of barriers waiting to be flushed.
    pub fn pending(&self) -> usize {
        self.images.len() + self.buffers.len() + self.memory.is_some() as usize
    }

    /// Emit all pending barriers as one pipeline barrier command. Does nothing if no barriers are pending.
    pub fn flush(&mut self) {
        if self.pending() == 0 {
            return;
        }
        let batch = BarrierBatch {
            images: self.images.as_slice(),
            buffers: self.buffers.as_slice(),
            memory: self.memory,
        };
        trace!(
            "Flushing barrier batch ({} image, {} buffer, {} memory)",
            batch.images.len(),
            batch.buffers.len(),
            batch.memory.is_some() as usize
        );
        self.stream.pipeline_barrier(&batch);
        self.images.clear();
        self.buffers.clear();
        self.memory = None;
    }
}

impl<S: CommandStream + ?Sized, const N: usize> Drop for CommandBatcher<'_, S, N> {
    fn drop(&mut self) {
        self.flush();
    }
}
