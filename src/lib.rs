// popgun - GPU context bootstrap for a small Vulkan engine
//
// Takes a window, negotiates instance/adapter/surface/device with
// role-tagged queues, and tears everything down deterministically.
// Rendering, scene, physics, audio and UI live in other crates.

pub mod backend;
pub mod config;
pub mod window;

pub use backend::{ContextOptions, VulkanContext};
pub use config::Config;
pub use window::RenderWindow;

/// Initialize logging for engine startup.
pub fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    let _ = builder.try_init();
}
