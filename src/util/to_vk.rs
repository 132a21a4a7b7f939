//! Conversion of barrier descriptions into the structures Vulkan consumes.

use smallvec::SmallVec;

/// Convert an object into a vulkan type
pub trait IntoVulkanType {
    /// Output Vulkan type
    type Output;

    /// Consume self and return a vulkan type
    fn into_vulkan(self) -> Self::Output;
}

/// Convert every item of a slice, keeping up to `N` converted items on the stack.
pub fn collect_vulkan<T: IntoVulkanType + Copy, const N: usize>(items: &[T]) -> SmallVec<[T::Output; N]> {
    items.iter().map(|item| item.into_vulkan()).collect()
}
