//! Per-frame bump pools.
//!
//! While the GPU executes frame N, the host already records frame N + 1. Scratch memory of frame N may only be reused
//! once the GPU is done with it, so [`FramePools`] keeps one [`GrowableBumpPool`] per frame in flight and cycles
//! through them. The owning frame loop waits for the device before calling [`FramePools::reset_frame_pools()`].

use anyhow::Result;
use ash::vk;

use crate::{Allocator, Error, GrowableBumpPool, Settings};

/// One bump pool for every frame in flight.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct FramePools<A: Allocator> {
    pools: Vec<GrowableBumpPool<A>>,
    current_frame: usize,
}

impl<A: Allocator> FramePools<A> {
    /// Create [`Settings::frames_in_flight`] pools.
    /// # Errors
    /// * Fails if `frames_in_flight` is zero.
    /// * Fails if creating any of the pools fails.
    pub fn new(allocator: A, settings: &Settings, usage: vk::BufferUsageFlags) -> Result<Self> {
        if settings.frames_in_flight == 0 {
            anyhow::bail!(Error::Uncategorized("At least one frame in flight is required"));
        }
        let pools = (0..settings.frames_in_flight)
            .map(|_| GrowableBumpPool::new(allocator.clone(), settings, usage))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            pools,
            current_frame: 0,
        })
    }

    /// Pool of the frame currently being recorded. Allocations from it keep the frame pools borrowed, so they
    /// cannot outlive the next [`FramePools::reset_frame_pools()`].
    pub fn current(&self) -> &GrowableBumpPool<A> {
        &self.pools[self.current_frame]
    }

    /// Index of the frame currently being recorded.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frames_in_flight(&self) -> usize {
        self.pools.len()
    }

    /// Advance to the next frame and reset its pool.
    /// # Safety
    /// The GPU must be done with all work recorded the last time this frame slot was current.
    /// # Errors
    /// * Fails if resetting the pool fails.
    pub unsafe fn reset_frame_pools(&mut self) -> Result<()> {
        self.current_frame = (self.current_frame + 1) % self.pools.len();
        trace!("Resetting bump pool of frame slot {}", self.current_frame);
        self.pools[self.current_frame].reset()
    }
}
