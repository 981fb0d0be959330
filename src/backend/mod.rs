// Backend module - GPU context bootstrap layer
//
// Design: thin wrapper around ash with deterministic ownership
// Construction is linear; teardown is strict reverse order

pub mod adapter;
pub mod context;
pub mod debug;
pub mod device;
pub mod instance;
pub mod queues;
pub mod surface;
pub mod sync;

pub use context::{ContextOptions, VulkanContext};
pub use device::{Device, DeviceFeature, FeatureChain};
pub use queues::{QueueFamilyAssignment, QueueSet};
