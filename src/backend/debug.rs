// Debug reporter - severity-routed driver diagnostics
//
// Registers a debug-utils messenger on the instance and routes every
// message to the log facade at the matching level. The callback's
// user-data slot carries a boxed sink owned by the reporter, so routing
// never depends on global state and the box is freed exactly once.

use anyhow::{Context, Result};
use ash::vk;
use ash::vk::Handle;
use std::ffi::{CStr, CString};

use super::instance::Instance;
use crate::config::DebugConfig;

/// Routing target delivered to the callback through user-data.
struct DebugSink {
    target: &'static str,
}

impl DebugSink {
    fn route(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT, message: &str) {
        match severity {
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => {
                log::trace!(target: self.target, "{}", message)
            }
            vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
                log::info!(target: self.target, "{}", message)
            }
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
                log::warn!(target: self.target, "{}", message)
            }
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
                log::error!(target: self.target, "{}", message)
            }
            // No other severity bit exists in the API; nothing to route.
            _ => {}
        }
    }
}

/// Owns the messenger registration and its callback sink. Must be
/// dropped before the instance it was registered on.
pub struct DebugReporter {
    loader: ash::extensions::ext::DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
    sink: *mut DebugSink,
}

impl DebugReporter {
    pub fn new(instance: &Instance, config: &DebugConfig) -> Result<Self> {
        let loader =
            ash::extensions::ext::DebugUtils::new(instance.entry(), instance.handle());

        let mut severity = vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR;
        if config.verbose_messages {
            severity |= vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE;
        }

        let mut message_type = vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION;
        if config.performance_messages {
            message_type |= vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE;
        }

        let sink = Box::into_raw(Box::new(DebugSink { target: "vulkan" }));

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(severity)
            .message_type(message_type)
            .pfn_user_callback(Some(debug_callback))
            .user_data(sink.cast());

        let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
            .context("Failed to register debug messenger")?;

        Ok(Self {
            loader,
            messenger,
            sink,
        })
    }

    /// Tag a queue with a human-readable name for tooling visibility.
    pub fn name_queue(&self, device: &ash::Device, queue: vk::Queue, name: &str) {
        let Ok(name) = CString::new(name) else {
            return;
        };
        let name_info = vk::DebugUtilsObjectNameInfoEXT::builder()
            .object_type(vk::ObjectType::QUEUE)
            .object_handle(queue.as_raw())
            .object_name(&name);
        if let Err(err) =
            unsafe { self.loader.set_debug_utils_object_name(device.handle(), &name_info) }
        {
            log::warn!("Failed to name queue: {}", err);
        }
    }
}

impl Drop for DebugReporter {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_debug_utils_messenger(self.messenger, None);
            // Callback is unregistered; reclaim the sink.
            drop(Box::from_raw(self.sink));
        }
    }
}

// Callback must be a plain extern fn; the sink arrives via user-data.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let sink = &*(p_user_data as *const DebugSink);
    let message = CStr::from_ptr((*p_callback_data).p_message);
    sink.route(severity, &message.to_string_lossy());
    vk::FALSE
}
