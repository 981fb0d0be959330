// Physical device selection
//
// Enumerates adapters and applies an injected selection policy. The
// default policy takes the first adapter; scoring heuristics slot in
// here without touching the rest of the bootstrap.

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::CStr;

use super::instance::Instance;

/// Picks which adapter to use from the enumerated list.
pub type AdapterPolicy = fn(&[vk::PhysicalDevice]) -> Option<usize>;

/// Default policy: first enumerated adapter.
pub fn first_adapter(adapters: &[vk::PhysicalDevice]) -> Option<usize> {
    if adapters.is_empty() {
        None
    } else {
        Some(0)
    }
}

/// The selected hardware adapter. Non-owning; the handle stays valid for
/// the instance's lifetime.
pub struct Adapter {
    handle: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
}

impl Adapter {
    pub fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }
}

/// Apply a policy to the enumerated list; an out-of-range choice counts
/// as no choice.
fn policy_choice(
    adapters: &[vk::PhysicalDevice],
    policy: AdapterPolicy,
) -> Option<vk::PhysicalDevice> {
    policy(adapters).and_then(|index| adapters.get(index).copied())
}

/// Enumerate adapters and select one via `policy`. No adapter at all is
/// unrecoverable.
pub fn select_adapter(instance: &Instance, policy: AdapterPolicy) -> Result<Adapter> {
    let adapters = unsafe { instance.handle().enumerate_physical_devices() }
        .context("Failed to enumerate physical devices")?;

    let handle = policy_choice(&adapters, policy).context("No Vulkan-capable GPU found")?;

    let properties = unsafe { instance.handle().get_physical_device_properties(handle) };

    log::info!(
        "Selected GPU: {}",
        unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy()
    );
    log::info!(
        "API Version: {}.{}.{}",
        vk::api_version_major(properties.api_version),
        vk::api_version_minor(properties.api_version),
        vk::api_version_patch(properties.api_version)
    );

    // Extended properties are queried for diagnostics only; they do not
    // influence selection.
    let mut subgroup = vk::PhysicalDeviceSubgroupProperties::default();
    let mut properties2 = vk::PhysicalDeviceProperties2::builder().push_next(&mut subgroup);
    unsafe {
        instance
            .handle()
            .get_physical_device_properties2(handle, &mut properties2);
    }
    log::debug!(
        "Subgroup size: {}, arithmetic supported? {}",
        subgroup.subgroup_size,
        subgroup
            .supported_operations
            .contains(vk::SubgroupFeatureFlags::ARITHMETIC)
    );

    Ok(Adapter { handle, properties })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_adapter_picks_index_zero() {
        let adapters = [vk::PhysicalDevice::null(), vk::PhysicalDevice::null()];
        assert_eq!(first_adapter(&adapters), Some(0));
    }

    #[test]
    fn first_adapter_rejects_empty_list() {
        assert_eq!(first_adapter(&[]), None);
    }

    #[test]
    fn out_of_range_policy_choice_is_rejected() {
        let adapters = [vk::PhysicalDevice::null()];
        assert!(policy_choice(&adapters, |_| Some(5)).is_none());
        assert!(policy_choice(&adapters, first_adapter).is_some());
    }
}
