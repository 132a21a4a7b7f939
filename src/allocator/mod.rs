//! The allocator module exposes the memory side of the crate
//! <br>
//! <br>
//! # Allocator traits
//! These are defined in [`traits`], and can be implemented to supply a custom sub-allocator to the bump pools.
//! # Default allocator
//! A default allocator based on the `gpu_allocator` crate is implemented in [`default_allocator`].
//! # Bump pool
//! A growable linear allocator used for per-frame scratch data and descriptor buffers. For more information check the
//! [`bump_pool`] module documentation.

pub mod traits;
pub mod default_allocator;
pub mod memory_type;
pub mod bump_pool;
