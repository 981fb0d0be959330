// Windowing seam - what the bootstrap needs from a window
//
// The context layer never touches winit directly; it only needs the
// framebuffer size, the instance extensions the window system requires,
// and a way to create a presentation surface against an instance.

use anyhow::{Context, Result};
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use std::ffi::c_char;

/// The window-side contract for GPU context bootstrap.
pub trait RenderWindow {
    /// Current framebuffer size in pixels (width, height).
    fn framebuffer_size(&self) -> (u32, u32);

    /// Instance extension names this window system needs for presentation.
    fn required_extensions(&self) -> Result<Vec<*const c_char>>;

    /// Create a presentation surface bound to this window.
    fn create_surface(
        &self,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<vk::SurfaceKHR>;
}

impl RenderWindow for winit::window::Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }

    fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        let extensions =
            ash_window::enumerate_required_extensions(self.raw_display_handle())
                .context("No presentation extensions for this display")?;

        Ok(extensions.to_vec())
    }

    fn create_surface(
        &self,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<vk::SurfaceKHR> {
        let surface = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                self.raw_display_handle(),
                self.raw_window_handle(),
                None,
            )
        }
        .context("Failed to create window surface")?;

        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that the winit window satisfies the seam; the
    // handle types it yields must stay the ones ash-window accepts.
    fn assert_render_window<W: RenderWindow>() {}

    #[test]
    fn winit_window_satisfies_seam() {
        assert_render_window::<winit::window::Window>();
    }
}
