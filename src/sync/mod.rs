//! The sync module computes and records the pipeline barriers between resource uses.
//!
//! - The [`access`] module describes how and when a resource is accessed.
//! - The [`state`] module provides the [`ResourceStateTracker`](state::ResourceStateTracker), which remembers the
//! last access of every resource.
//! - The [`barrier`] module synthesizes barriers from a prior and a requested state.
//! - The [`batcher`] module batches barriers into as few `vkCmdPipelineBarrier2` calls as possible.
//!
//! Most of the time these are driven by a [`TaskGraph`](crate::TaskGraph), but they can be used directly for
//! immediate mode recording through [`CommandBatcher::use_resource()`](batcher::CommandBatcher::use_resource).

pub mod access;
pub mod barrier;
pub mod batcher;
pub mod state;
