// Vulkan context - the full bootstrap sequence
//
// Strictly linear, single pass: instance -> debug reporter -> adapter ->
// surface -> queue families -> device -> queues. Each stage consumes the
// previous stage's output; nothing re-enters an earlier stage. Either
// every handle comes up valid or the error propagates to the entry
// point before the main loop starts.

use anyhow::{Context, Result};
use ash::vk;

use super::adapter::{self, Adapter, AdapterPolicy};
use super::debug::DebugReporter;
use super::device::{self, Device, FeatureChain};
use super::instance::{Instance, InstanceBuilder};
use super::queues::{self, QueueSet};
use super::surface::{self, Surface, SurfaceFormatPolicy};
use super::sync;
use crate::config::Config;
use crate::window::RenderWindow;

/// Replaceable selection policies plus the build-mode flag.
pub struct ContextOptions {
    pub adapter_policy: AdapterPolicy,
    pub surface_format_policy: SurfaceFormatPolicy,
    /// Debug mode enables validation layers, the debug reporter, and
    /// queue labels. Force-disabled in release builds by default.
    pub debug_mode: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            adapter_policy: adapter::first_adapter,
            surface_format_policy: surface::first_format,
            debug_mode: cfg!(debug_assertions),
        }
    }
}

/// Fully initialized GPU execution context.
///
/// Field order is teardown order: queues are plain handles, the surface
/// and debug reporter go before the device, the device before the
/// instance. Every exit path runs the same reverse-acquisition order.
pub struct VulkanContext {
    pub queues: QueueSet,
    surface: Surface,
    // Held only so the messenger outlives construction and is
    // unregistered before the instance goes away.
    _debug: Option<DebugReporter>,
    device: Device,
    adapter: Adapter,
    instance: Instance,
    window_size: (u32, u32),
}

impl VulkanContext {
    pub fn new<W: RenderWindow>(window: &W, config: &Config) -> Result<Self> {
        Self::with_options(window, config, ContextOptions::default())
    }

    pub fn with_options<W: RenderWindow>(
        window: &W,
        config: &Config,
        options: ContextOptions,
    ) -> Result<Self> {
        let window_size = window.framebuffer_size();
        let debug_mode = options.debug_mode && config.debug.validation_layers;

        let instance = InstanceBuilder {
            app_name: &config.app.name,
            app_version: config.app.version,
            window_extensions: window.required_extensions()?,
            debug_mode,
        }
        .build()?;

        let debug = if debug_mode {
            Some(DebugReporter::new(&instance, &config.debug)?)
        } else {
            None
        };

        let adapter = adapter::select_adapter(&instance, options.adapter_policy)?;

        let surface = Surface::bind(&instance, &adapter, window, options.surface_format_policy)?;

        let families = unsafe {
            instance
                .handle()
                .get_physical_device_queue_family_properties(adapter.handle())
        };
        let assignment = queues::assign_queue_families(&families, |index| {
            surface.supports_present(&adapter, index)
        })
        .context("No usable queue topology on selected adapter")?;
        log::debug!(
            "Queue families: graphics={} present={} compute={}",
            assignment.graphics,
            assignment.present,
            assignment.compute
        );

        let device = device::build_device(
            &instance,
            &adapter,
            &assignment,
            &FeatureChain::for_ray_tracing(),
            debug_mode,
        )?;

        let queues = QueueSet::fetch(&device, assignment);
        if let Some(reporter) = &debug {
            queues.apply_debug_labels(reporter, &device);
        }

        log::info!("Vulkan context initialized");

        Ok(Self {
            queues,
            surface,
            _debug: debug,
            device,
            adapter,
            instance,
            window_size,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Negotiated surface pixel format, for the rendering layer.
    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.surface.format()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Block until `fence` signals. See [`sync::wait_for_fence`].
    pub fn wait_for_fence(&self, fence: vk::Fence) {
        sync::wait_for_fence(&self.device, fence);
    }

    /// Block until all submitted work completes.
    pub fn wait_idle(&self) -> Result<()> {
        sync::wait_idle(&self.device)
    }
}

impl Drop for VulkanContext {
    fn drop(&mut self) {
        // Quiesce the device before any handle goes away; field drop
        // order then releases surface and debug sink, device, instance.
        if let Err(err) = self.wait_idle() {
            log::error!("Device idle wait failed during teardown: {}", err);
        }
        log::info!("Vulkan context torn down");
    }
}
