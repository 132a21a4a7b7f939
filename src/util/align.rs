//! Utilities for aligning memory offsets

use ash::vk;

/// Round `value` up to the next multiple of `alignment`. A value that is already aligned is returned unchanged.
/// `alignment` must be a power of two. Returns `None` if the result does not fit in a `DeviceSize`.
pub fn align(value: vk::DeviceSize, alignment: vk::DeviceSize) -> Option<vk::DeviceSize> {
    debug_assert!(is_power_of_two(alignment), "alignment {alignment} is not a power of two");
    value.checked_add(alignment - 1).map(|value| value & !(alignment - 1))
}

/// Returns true if `value` is a non-zero power of two.
pub fn is_power_of_two(value: vk::DeviceSize) -> bool {
    value != 0 && (value & (value - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_values_are_unchanged() {
        assert_eq!(align(0, 16), Some(0));
        assert_eq!(align(32, 16), Some(32));
        assert_eq!(align(1024, 256), Some(1024));
        assert_eq!(align(u64::MAX - 15, 16), Some(u64::MAX - 15));
    }

    #[test]
    fn rounds_up_to_next_multiple() {
        assert_eq!(align(1, 16), Some(16));
        assert_eq!(align(600, 16), Some(608));
        assert_eq!(align(257, 256), Some(512));
    }

    #[test]
    fn overflow_is_none() {
        assert_eq!(align(u64::MAX - 7, 16), None);
        assert_eq!(align(u64::MAX, 2), None);
    }

    #[test]
    fn power_of_two() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(256));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(24));
    }
}
