// Engine startup - bring the GPU context up, idle, tear it down
//
// No rendering happens here; this binary exists to boot the context
// once at startup and release it cleanly at shutdown. Any fatal
// bootstrap error is logged and the process exits non-zero.

use anyhow::Result;
use popgun::{init_logging, Config, VulkanContext};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

fn main() -> Result<()> {
    let config = Config::load();

    init_logging();
    log::info!("Starting {}", config.app.name);
    log::info!("Window: {}x{}", config.window.width, config.window.height);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // Bootstrap failures surface here after the loop exits.
    if let Some(err) = app.init_error.take() {
        return Err(err);
    }
    Ok(())
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    context: Option<VulkanContext>,
    init_error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            context: None,
            init_error: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.init_error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        match VulkanContext::new(window.as_ref(), &self.config) {
            Ok(context) => {
                let format = context.surface_format();
                let assignment = context.queues.assignment();
                log::info!(
                    "Context ready: format {:?}, queue families g={} p={} c={}",
                    format.format,
                    assignment.graphics,
                    assignment.present,
                    assignment.compute
                );
                self.context = Some(context);
            }
            Err(e) => {
                log::error!("GPU context bootstrap failed: {:?}", e);
                self.init_error = Some(e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed() {
                    if let PhysicalKey::Code(KeyCode::Escape) = event.physical_key {
                        log::info!("ESC pressed, exiting...");
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        // Context goes first so the surface is released while the
        // window it was bound to still exists.
        self.context.take();
    }
}
