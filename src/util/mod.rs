//! Various utilities

pub mod align;
pub mod to_vk;
