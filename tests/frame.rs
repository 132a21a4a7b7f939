use anyhow::Result;
use ash::vk;

use deimos::{FramePools, SettingsBuilder};

use framework::HostAllocator;

mod framework;

#[test]
pub fn frame_pools_cycle() -> Result<()> {
    framework::init_logging();
    let allocator = HostAllocator::new();
    let settings = SettingsBuilder::new().scratch_size(1024u64).frames_in_flight(3).build();
    let mut frames = FramePools::new(allocator.clone(), &settings, vk::BufferUsageFlags::STORAGE_BUFFER)?;
    assert_eq!(frames.frames_in_flight(), 3);
    assert_eq!(allocator.allocations(), 3);

    frames.current().allocate(100, 16)?;
    assert_eq!(frames.current_frame(), 0);

    let mut visited = Vec::new();
    for _ in 0..3 {
        unsafe {
            frames.reset_frame_pools()?;
        }
        visited.push(frames.current_frame());
        assert_eq!(frames.current().used(), 0);
        frames.current().allocate(100, 16)?;
    }
    assert_eq!(visited, vec![1, 2, 0]);
    Ok(())
}

#[test]
pub fn frame_pools_need_a_frame() {
    let settings = SettingsBuilder::new().frames_in_flight(0).build();
    assert!(FramePools::new(HostAllocator::new(), &settings, vk::BufferUsageFlags::STORAGE_BUFFER).is_err());
}
