// Instance creation - API entry point with negotiated layers/extensions
//
// Two-phase dispatch loading: Entry::load() resolves the global loader
// functions, create_instance() resolves the instance-scoped table. Both
// are explicit objects passed by reference; no global dispatch state.

use anyhow::{Context, Result};
use ash::{vk, Entry};
use std::ffi::{c_char, CString};

/// Engine identity reported to the driver alongside the application's.
pub const ENGINE_NAME: &str = "popgun";
pub const ENGINE_VERSION: [u32; 3] = [0, 1, 0];

/// Owned API entry point. Root of every other handle's lifetime:
/// dropped last, after all devices and surfaces created against it.
pub struct Instance {
    handle: ash::Instance,
    entry: Entry,
}

impl Instance {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn handle(&self) -> &ash::Instance {
        &self.handle
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            self.handle.destroy_instance(None);
        }
    }
}

/// Builds the instance with validation layers and debug extensions in
/// debug mode, plus whatever the window system requires.
pub struct InstanceBuilder<'a> {
    pub app_name: &'a str,
    pub app_version: [u32; 3],
    /// Extension names required by the window system for presentation
    pub window_extensions: Vec<*const c_char>,
    /// Debug mode: validation/monitor layers and debug-report extensions
    pub debug_mode: bool,
}

impl InstanceBuilder<'_> {
    pub fn build(self) -> Result<Instance> {
        // Phase 1: global loader functions
        let entry = unsafe { Entry::load() }
            .context("Failed to load Vulkan library. Is Vulkan installed?")?;

        let app_name = CString::new(self.app_name)?;
        let engine_name = CString::new(ENGINE_NAME)?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(
                0,
                self.app_version[0],
                self.app_version[1],
                self.app_version[2],
            ))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(
                0,
                ENGINE_VERSION[0],
                ENGINE_VERSION[1],
                ENGINE_VERSION[2],
            ))
            .api_version(vk::API_VERSION_1_2);

        let mut layers: Vec<*const c_char> = Vec::new();
        if self.debug_mode {
            layers.push(c"VK_LAYER_KHRONOS_validation".as_ptr());
            layers.push(c"VK_LAYER_LUNARG_monitor".as_ptr());
        }

        // Capability-query extension is required unconditionally; the
        // debug-reporting pair only when a reporter will be attached.
        let mut extensions: Vec<*const c_char> = Vec::new();
        if self.debug_mode {
            extensions.push(vk::ExtDebugReportFn::name().as_ptr());
            extensions.push(ash::extensions::ext::DebugUtils::name().as_ptr());
        }
        extensions.push(vk::KhrGetPhysicalDeviceProperties2Fn::name().as_ptr());
        extensions.extend_from_slice(&self.window_extensions);

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);

        // Phase 2: instance-scoped dispatch table. Rejection here is
        // unrecoverable - there is no fallback layer/extension set.
        let handle = unsafe { entry.create_instance(&create_info, None) }
            .context("Failed to create Vulkan instance")?;

        log::debug!(
            "Instance created ({} layers, {} extensions)",
            layers.len(),
            extensions.len()
        );

        Ok(Instance { handle, entry })
    }
}
