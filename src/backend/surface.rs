// Surface binding - window presentation target
//
// Binds a surface to the chosen adapter and negotiates its pixel format
// through an injected policy. Owns the surface handle; must be dropped
// before the instance it was created against.

use anyhow::{Context, Result};
use ash::vk;

use super::adapter::Adapter;
use super::instance::Instance;
use crate::window::RenderWindow;

/// Picks the pixel format from the adapter's supported list.
pub type SurfaceFormatPolicy = fn(&[vk::SurfaceFormatKHR]) -> Option<usize>;

/// Default policy: first supported format.
pub fn first_format(formats: &[vk::SurfaceFormatKHR]) -> Option<usize> {
    if formats.is_empty() {
        None
    } else {
        Some(0)
    }
}

/// Apply a policy to the supported-format list; an out-of-range choice
/// counts as no choice.
fn policy_choice(
    formats: &[vk::SurfaceFormatKHR],
    policy: SurfaceFormatPolicy,
) -> Option<vk::SurfaceFormatKHR> {
    policy(formats).and_then(|index| formats.get(index).copied())
}

/// Presentation surface bound to one window, with its negotiated format.
pub struct Surface {
    loader: ash::extensions::khr::Surface,
    handle: vk::SurfaceKHR,
    format: vk::SurfaceFormatKHR,
}

impl Surface {
    pub fn bind<W: RenderWindow>(
        instance: &Instance,
        adapter: &Adapter,
        window: &W,
        policy: SurfaceFormatPolicy,
    ) -> Result<Self> {
        let loader =
            ash::extensions::khr::Surface::new(instance.entry(), instance.handle());

        let handle = window.create_surface(instance.entry(), instance.handle())?;

        // The handle is live from here on; wrap before anything can fail
        // so an early return still releases it.
        let mut surface = Self {
            loader,
            handle,
            format: vk::SurfaceFormatKHR::default(),
        };

        let formats = unsafe {
            surface
                .loader
                .get_physical_device_surface_formats(adapter.handle(), surface.handle)
        }
        .context("Failed to query surface formats")?;

        surface.format = policy_choice(&formats, policy).context("No supported surface format")?;

        log::debug!("Surface format: {:?}", surface.format.format);

        Ok(surface)
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Negotiated pixel format, exposed to the rendering layer.
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.format
    }

    /// Whether `family_index` on the adapter can present to this surface.
    pub fn supports_present(&self, adapter: &Adapter, family_index: u32) -> Result<bool> {
        let supported = unsafe {
            self.loader.get_physical_device_surface_support(
                adapter.handle(),
                family_index,
                self.handle,
            )
        }
        .context("Failed to query surface presentation support")?;
        Ok(supported)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.handle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_format_picks_index_zero() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        assert_eq!(first_format(&formats), Some(0));
    }

    #[test]
    fn first_format_rejects_empty_list() {
        assert_eq!(first_format(&[]), None);
    }

    #[test]
    fn out_of_range_policy_choice_is_rejected() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        assert!(policy_choice(&formats, |_| Some(9)).is_none());
        assert_eq!(
            policy_choice(&formats, first_format).map(|f| f.format),
            Some(vk::Format::B8G8R8A8_SRGB)
        );
    }
}
