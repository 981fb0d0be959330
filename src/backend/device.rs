// Logical device creation
//
// Builds one queue request per distinct family, chains the ray-tracing
// feature requests, and enables the fixed extension set. Driver
// rejection is fatal; there is no feature-downgrade path.

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::c_char;

use super::adapter::Adapter;
use super::instance::Instance;
use super::queues::QueueFamilyAssignment;

/// Optional hardware features requested at device creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFeature {
    BufferDeviceAddress,
    AccelerationStructure,
    RayTracingPipeline,
}

/// One link of the feature chain: a capability toggle for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureNode {
    pub feature: DeviceFeature,
    pub enabled: bool,
}

/// Ordered feature requests handed to device creation. Order encodes
/// dependency: acceleration structures need buffer device addresses,
/// the ray-tracing pipeline needs acceleration structures.
pub struct FeatureChain {
    nodes: Vec<FeatureNode>,
    /// Classic robust-memory-access flag, set independently of the chain
    pub robust_buffer_access: bool,
}

impl FeatureChain {
    /// The full chain this engine runs with.
    pub fn for_ray_tracing() -> Self {
        Self {
            nodes: vec![
                FeatureNode {
                    feature: DeviceFeature::BufferDeviceAddress,
                    enabled: true,
                },
                FeatureNode {
                    feature: DeviceFeature::AccelerationStructure,
                    enabled: true,
                },
                FeatureNode {
                    feature: DeviceFeature::RayTracingPipeline,
                    enabled: true,
                },
            ],
            robust_buffer_access: true,
        }
    }

    /// Visit nodes from the head in declaration order.
    pub fn walk(&self) -> impl Iterator<Item = FeatureNode> + '_ {
        self.nodes.iter().copied()
    }

    fn is_enabled(&self, feature: DeviceFeature) -> bool {
        self.nodes
            .iter()
            .any(|node| node.feature == feature && node.enabled)
    }
}

/// Owned logical device. Exclusive owner of every queue fetched from it;
/// dropped before the instance.
pub struct Device {
    handle: ash::Device,
}

impl Device {
    pub fn handle(&self) -> &ash::Device {
        &self.handle
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            self.handle.destroy_device(None);
        }
    }
}

/// Create the logical device with de-duplicated queue requests and the
/// feature chain applied.
pub fn build_device(
    instance: &Instance,
    adapter: &Adapter,
    assignment: &QueueFamilyAssignment,
    chain: &FeatureChain,
    debug_mode: bool,
) -> Result<Device> {
    let queue_priorities = [1.0f32];

    // One request per distinct family, never one per role: aliased roles
    // collapse to a single entry.
    let queue_infos: Vec<vk::DeviceQueueCreateInfo> = assignment
        .distinct_families()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(&queue_priorities)
                .build()
        })
        .collect();

    let mut extensions: Vec<*const c_char> = vec![
        ash::extensions::khr::Swapchain::name().as_ptr(),
        vk::KhrGetMemoryRequirements2Fn::name().as_ptr(),
        // Ray tracing
        ash::extensions::khr::AccelerationStructure::name().as_ptr(),
        ash::extensions::khr::RayTracingPipeline::name().as_ptr(),
        ash::extensions::khr::DeferredHostOperations::name().as_ptr(),
        vk::KhrPipelineLibraryFn::name().as_ptr(),
    ];
    if debug_mode {
        extensions.push(vk::ExtDebugMarkerFn::name().as_ptr());
    }

    let mut address_features = vk::PhysicalDeviceBufferDeviceAddressFeatures::builder()
        .buffer_device_address(chain.is_enabled(DeviceFeature::BufferDeviceAddress));
    let mut acceleration_features =
        vk::PhysicalDeviceAccelerationStructureFeaturesKHR::builder()
            .acceleration_structure(chain.is_enabled(DeviceFeature::AccelerationStructure));
    let mut ray_tracing_features = vk::PhysicalDeviceRayTracingPipelineFeaturesKHR::builder()
        .ray_tracing_pipeline(chain.is_enabled(DeviceFeature::RayTracingPipeline));

    let features = vk::PhysicalDeviceFeatures::builder()
        .robust_buffer_access(chain.robust_buffer_access);

    // push_next prepends, so push in reverse of chain order to keep
    // buffer-device-address at the head of the pNext walk.
    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extensions)
        .enabled_features(&features)
        .push_next(&mut ray_tracing_features)
        .push_next(&mut acceleration_features)
        .push_next(&mut address_features);

    let handle = unsafe {
        instance
            .handle()
            .create_device(adapter.handle(), &create_info, None)
    }
    .context("Device creation rejected by driver (missing feature or extension?)")?;

    log::debug!(
        "Logical device created with {} queue request(s)",
        queue_infos.len()
    );

    Ok(Device { handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_chain_walks_in_declaration_order() {
        let chain = FeatureChain::for_ray_tracing();
        let order: Vec<DeviceFeature> = chain.walk().map(|node| node.feature).collect();
        assert_eq!(
            order,
            vec![
                DeviceFeature::BufferDeviceAddress,
                DeviceFeature::AccelerationStructure,
                DeviceFeature::RayTracingPipeline,
            ]
        );
        assert!(chain.walk().all(|node| node.enabled));
        assert!(chain.robust_buffer_access);
    }

    #[test]
    fn aliased_roles_yield_single_queue_request() {
        // graphics and compute on the same family: exactly one entry.
        let assignment = QueueFamilyAssignment {
            graphics: 0,
            present: 1,
            compute: 0,
        };
        assert_eq!(assignment.distinct_families(), vec![0, 1]);

        let assignment = QueueFamilyAssignment {
            graphics: 0,
            present: 0,
            compute: 0,
        };
        assert_eq!(assignment.distinct_families().len(), 1);
    }
}
