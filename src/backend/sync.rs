// Idle synchronization - blocking fence wait
//
// wait_for_fence spin-polls with a bounded per-attempt timeout until the
// fence signals; there is no cancellation path. Intended for startup,
// shutdown, and frame pacing, not the hot path.

use anyhow::{Context, Result};
use ash::prelude::VkResult;
use ash::vk;

use super::device::Device;

/// Per-attempt wait timeout in nanoseconds.
const FENCE_POLL_TIMEOUT_NS: u64 = 100;

/// Poll until success, treating TIMEOUT as retry. Any other status means
/// driver-level corruption: the process cannot continue.
///
/// Returns the number of polls performed.
fn wait_until_signaled<F>(mut poll: F) -> u64
where
    F: FnMut() -> VkResult<()>,
{
    let mut polls = 0;
    loop {
        polls += 1;
        match poll() {
            Ok(()) => return polls,
            Err(vk::Result::TIMEOUT) => {}
            Err(status) => panic!("fence wait returned unexpected status {:?}", status),
        }
    }
}

/// Block the calling thread until `fence` signals.
pub fn wait_for_fence(device: &Device, fence: vk::Fence) {
    let handle = device.handle();
    wait_until_signaled(|| unsafe {
        handle.wait_for_fences(&[fence], true, FENCE_POLL_TIMEOUT_NS)
    });
}

/// Block until all work submitted to the device completes.
pub fn wait_idle(device: &Device) -> Result<()> {
    unsafe { device.handle().device_wait_idle() }.context("Failed to wait for device idle")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signaled_fence_polls_once() {
        assert_eq!(wait_until_signaled(|| Ok(())), 1);
    }

    #[test]
    fn timeouts_retry_until_success() {
        let mut timeouts_left = 5;
        let polls = wait_until_signaled(|| {
            if timeouts_left == 0 {
                Ok(())
            } else {
                timeouts_left -= 1;
                Err(vk::Result::TIMEOUT)
            }
        });
        assert_eq!(polls, 6);
    }

    #[test]
    #[should_panic(expected = "unexpected status")]
    fn unexpected_status_aborts() {
        wait_until_signaled(|| Err(vk::Result::ERROR_DEVICE_LOST));
    }
}
