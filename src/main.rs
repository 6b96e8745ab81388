// =============================================================================
// OPENGL HARNESS DEMO - Learning Project
// =============================================================================
//
// Draws one indexed square with the wrappers from the library crate.
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  winit event loop (window, input)                               │
// │    └── glutin (GL 3.3 core context + window surface)            │
// │          └── GlDevice (glow function table)                     │
// │                └── Scene: ShaderProgram, GeometryBuffers,       │
// │                           Texture2D, FrameRenderer              │
// └─────────────────────────────────────────────────────────────────┘
//
// FRAME FLOW:
// 1. Rebuild the shader program if its file changed on disk
// 2. Clear the color buffer
// 3. Bind the program, push uniforms (animated u_Color)
// 4. Draw the square (program -> VAO -> index buffer -> glDrawElements)
// 5. Swap buffers
//
// =============================================================================

use anyhow::{Context, Result};
use gl_harness::backend::{
    ComponentType, FrameRenderer, GeometryBuffers, GlDevice, ShaderProgram, SharedDriver,
    Texture2D, VertexLayout,
};
use gl_harness::config::Config;
use gl_harness::watcher::ShaderWatcher;
use glutin::config::{Config as GlutinConfig, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{Display, DisplayApiPreference, GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, WindowSurface};
use glutin_winit::GlWindow;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::fs::OpenOptions;
use std::io::Write;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowAttributes},
};

/// Unit square: position (x, y) + texture coordinate (u, v) per vertex
#[rustfmt::skip]
const VERTICES: [f32; 16] = [
    -0.5, -0.5,   0.0, 0.0,   // 0
     0.5, -0.5,   1.0, 0.0,   // 1
     0.5,  0.5,   1.0, 1.0,   // 2
    -0.5,  0.5,   0.0, 1.0,   // 3
];

/// Two triangles sharing the 0-2 diagonal
#[rustfmt::skip]
const INDICES: [u32; 6] = [
    0, 1, 2,   // triangle 1
    2, 3, 0,   // triangle 2
];

/// Per-frame step of the animated red channel
const COLOR_STEP: f32 = 0.05;

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    // Initialize logging
    init_logging(&config);
    log::info!("Starting OpenGL harness");
    log::info!(
        "Window: {}x{} ({})",
        config.window.width,
        config.window.height,
        if config.window.fullscreen { "fullscreen" } else { "windowed" }
    );
    log::info!("Present mode: {}", config.graphics.present_mode);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

/// Initialize logging with optional file output
fn init_logging(config: &Config) {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();

    // Create/clear log file if enabled
    if config.debug.log_to_file {
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&config.debug.log_file)
        {
            let _ = writeln!(file, "=== OpenGL Harness Log ===");
            let _ = writeln!(file, "Started: {:?}", std::time::SystemTime::now());
            let _ = writeln!(file);
        }
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Everything that only exists while a GL context does.
///
/// IMPORTANT: Field order matters for Drop! The scene's wrappers delete GL
/// objects, so they go before the context and surface they live in.
struct GlState {
    scene: Scene,
    renderer: FrameRenderer,
    driver: SharedDriver,
    gl_surface: Surface<WindowSurface>,
    gl_context: PossiblyCurrentContext,
    window: Window,
}

/// GPU resources for the demo square.
struct Scene {
    program: ShaderProgram,
    geometry: GeometryBuffers,
    texture: Option<Texture2D>,
    watcher: Option<ShaderWatcher>,
}

struct App {
    // ─────────────────────────────────────────────────────────────────────────
    // CONFIGURATION
    // ─────────────────────────────────────────────────────────────────────────
    config: Config,

    // ─────────────────────────────────────────────────────────────────────────
    // WINDOW & GL CONTEXT
    // ─────────────────────────────────────────────────────────────────────────
    gl: Option<GlState>,
    is_fullscreen: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // ANIMATION
    // ─────────────────────────────────────────────────────────────────────────
    red_channel: f32,
    increment: f32,

    // ─────────────────────────────────────────────────────────────────────────
    // FPS TRACKING
    // ─────────────────────────────────────────────────────────────────────────
    frame_count: u32,
    last_fps_update: Instant,
    last_frame_time: Instant,
}

impl App {
    fn new(config: Config) -> Self {
        let is_fullscreen = config.window.fullscreen;
        let now = Instant::now();
        Self {
            config,
            gl: None,
            is_fullscreen,
            red_channel: 0.0,
            increment: COLOR_STEP,
            frame_count: 0,
            last_fps_update: now,
            last_frame_time: now,
        }
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Create the window, the GL context and the scene.
    ///
    /// 1. Window + GL config (the config with the most MSAA samples)
    /// 2. GL 3.3 core context made current on a window surface
    /// 3. glow function table wrapped in a GlDevice
    /// 4. Scene resources
    fn init_gl(&self, event_loop: &ActiveEventLoop) -> Result<GlState> {
        log::info!("Initializing OpenGL...");

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Window and GL config
        // ─────────────────────────────────────────────────────────────────────
        let mut window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        if self.config.window.fullscreen {
            window_attributes =
                window_attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let (window, gl_config) = create_window_and_config(event_loop, window_attributes)?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Context and surface
        // ─────────────────────────────────────────────────────────────────────
        let raw_window_handle = window
            .window_handle()
            .context("Failed to get window handle")?
            .as_raw();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_window_handle));

        let gl_display = gl_config.display();
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("Failed to create GL 3.3 core context")?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .context("Failed to describe window surface")?;
        let gl_surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("Failed to create window surface")?;

        let gl_context = not_current
            .make_current(&gl_surface)
            .context("Failed to make GL context current")?;

        if let Err(e) = gl_surface.set_swap_interval(&gl_context, self.config.get_swap_interval()) {
            log::warn!("Failed to set swap interval: {}", e);
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Load GL functions
        // ─────────────────────────────────────────────────────────────────────
        // Safety: the context was made current on this thread above and lives
        // in the same GlState as every wrapper that uses the device.
        let driver: SharedDriver = unsafe {
            Rc::new(GlDevice::from_loader(
                |symbol| gl_display.get_proc_address(symbol),
                self.config.debug.check_driver_errors,
            ))
        };

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Scene
        // ─────────────────────────────────────────────────────────────────────
        let renderer = FrameRenderer::new(driver.clone());
        renderer.set_clear_color(self.config.graphics.clear_color);
        let size = window.inner_size();
        renderer.set_viewport(size.width, size.height);

        let scene = self.create_scene(&driver)?;

        log::info!("OpenGL initialized successfully!");
        Ok(GlState {
            scene,
            renderer,
            driver,
            gl_surface,
            gl_context,
            window,
        })
    }

    fn create_scene(&self, driver: &SharedDriver) -> Result<Scene> {
        let assets = &self.config.assets;

        let geometry = GeometryBuffers::from_slices(driver.clone(), &VERTICES, &INDICES)
            .context("Failed to upload square geometry")?;

        // position (slot 0) + texture coordinate (slot 1) = 16 byte stride
        let mut layout = VertexLayout::new();
        layout.push(ComponentType::F32, 2).push(ComponentType::F32, 2);
        geometry.attach(&layout);

        let program = ShaderProgram::from_file(driver.clone(), &assets.shader)
            .with_context(|| format!("Failed to build shader {:?}", assets.shader))?;

        let texture = match &assets.texture {
            Some(path) => Some(
                Texture2D::load(driver.clone(), path)
                    .with_context(|| format!("Failed to load texture {:?}", path))?,
            ),
            None => None,
        };

        let watcher = if self.config.debug.hot_reload_shaders {
            ShaderWatcher::new(&assets.shader)
                .map_err(|e| log::warn!("Shader hot reload disabled: {:?}", e))
                .ok()
        } else {
            None
        };

        // Unbind everything; each draw binds what it needs again
        geometry.vertex_array().unbind();
        geometry.vertex_buffer().unbind();
        program.unbind();

        Ok(Scene {
            program,
            geometry,
            texture,
            watcher,
        })
    }

    // =========================================================================
    // RENDER LOOP
    // =========================================================================

    /// Render a single frame.
    fn render_frame(&mut self) -> Result<()> {
        let Some(gl) = self.gl.as_mut() else {
            return Ok(());
        };
        let scene = &mut gl.scene;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Hot reload
        // ─────────────────────────────────────────────────────────────────────
        if let Some(watcher) = &scene.watcher {
            if watcher.take_change() {
                match ShaderProgram::from_file(gl.driver.clone(), watcher.path()) {
                    Ok(program) => {
                        log::info!("Reloaded shader {:?}", watcher.path());
                        scene.program = program;
                    }
                    Err(e) => log::error!("Shader reload failed, keeping previous program: {}", e),
                }
            }
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Clear
        // ─────────────────────────────────────────────────────────────────────
        gl.renderer.clear();

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Uniforms
        // ─────────────────────────────────────────────────────────────────────
        scene.program.bind();
        scene
            .program
            .set_uniform_4f("u_Color", self.red_channel, 0.3, 0.8, 1.0);

        if let Some(texture) = &scene.texture {
            texture.bind(0)?;
            scene.program.set_uniform_1i("u_Texture", 0);
        }

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Draw
        // ─────────────────────────────────────────────────────────────────────
        gl.renderer
            .draw(&scene.geometry, scene.geometry.index_count(), &scene.program);

        // Animate the colour
        if self.red_channel > 1.0 {
            self.increment = -COLOR_STEP;
        } else if self.red_channel < 0.0 {
            self.increment = COLOR_STEP;
        }
        self.red_channel += self.increment;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 5: Present
        // ─────────────────────────────────────────────────────────────────────
        gl.gl_surface
            .swap_buffers(&gl.gl_context)
            .context("Failed to swap buffers")?;

        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let Some(gl) = self.gl.as_ref() else {
            return;
        };
        // A minimized window reports 0x0; keep the old surface size
        let (Some(w), Some(h)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return;
        };
        gl.gl_surface.resize(&gl.gl_context, w, h);
        gl.renderer.set_viewport(width, height);
    }

    // =========================================================================
    // FULLSCREEN TOGGLE
    // =========================================================================

    fn toggle_fullscreen(&mut self) {
        if let Some(gl) = &self.gl {
            self.is_fullscreen = !self.is_fullscreen;

            if self.is_fullscreen {
                gl.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                log::info!("Entered fullscreen mode");
            } else {
                gl.window.set_fullscreen(None);
                log::info!("Exited fullscreen mode");
            }
        }
    }

    // =========================================================================
    // FPS TRACKING
    // =========================================================================

    fn update_fps(&mut self) {
        if !self.config.debug.show_fps {
            return;
        }

        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        self.frame_count += 1;

        // Update title every second
        let elapsed = now.duration_since(self.last_fps_update).as_secs_f32();
        if elapsed >= 1.0 {
            let fps = self.frame_count as f32 / elapsed;

            if let Some(gl) = &self.gl {
                gl.window.set_title(&format!(
                    "{} - {:.0} FPS ({:.2}ms)",
                    self.config.window.title,
                    fps,
                    frame_time * 1000.0,
                ));
            }

            self.frame_count = 0;
            self.last_fps_update = now;
        }
    }
}

// =============================================================================
// DISPLAY SETUP
// =============================================================================

/// Pick a GL config and create the window it renders to.
///
/// WGL needs the window before the display. Elsewhere the window is created
/// afterwards so it can take the config's X11 visual.
fn create_window_and_config(
    event_loop: &ActiveEventLoop,
    attributes: WindowAttributes,
) -> Result<(Window, GlutinConfig)> {
    let raw_display_handle = event_loop
        .display_handle()
        .context("Failed to get display handle")?
        .as_raw();

    #[cfg(target_os = "windows")]
    {
        let window = event_loop
            .create_window(attributes)
            .context("Failed to create window")?;
        let raw_window_handle = window
            .window_handle()
            .context("Failed to get window handle")?
            .as_raw();
        let preference = DisplayApiPreference::WglThenEgl(Some(raw_window_handle));
        let display = unsafe { Display::new(raw_display_handle, preference) }
            .context("Failed to create GL display")?;
        let template = ConfigTemplateBuilder::new().compatible_with_native_window(raw_window_handle);
        let config = pick_config(&display, template)?;
        Ok((window, config))
    }

    #[cfg(not(target_os = "windows"))]
    {
        #[cfg(target_os = "macos")]
        let preference = DisplayApiPreference::Cgl;
        #[cfg(not(target_os = "macos"))]
        let preference = DisplayApiPreference::GlxThenEgl(Box::new(
            winit::platform::x11::register_xlib_error_hook,
        ));

        let display = unsafe { Display::new(raw_display_handle, preference) }
            .context("Failed to create GL display")?;
        let config = pick_config(&display, ConfigTemplateBuilder::new())?;
        let window = glutin_winit::finalize_window(event_loop, attributes, &config)
            .context("Failed to create window")?;
        Ok((window, config))
    }
}

/// The matching config with the most MSAA samples.
fn pick_config(display: &Display, template: ConfigTemplateBuilder) -> Result<GlutinConfig> {
    let configs = unsafe { display.find_configs(template.build()) }
        .context("Failed to query GL configs")?;
    most_samples(configs, |config| config.num_samples())
        .context("No GL config matches the window template")
}

/// The item with the highest sample count. Ties keep the earliest item.
fn most_samples<T>(items: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    items.reduce(|best, item| if samples(&item) > samples(&best) { item } else { best })
}

// =============================================================================
// EVENT HANDLING
// =============================================================================

impl ApplicationHandler for App {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gl.is_some() {
            return;
        }

        match self.init_gl(event_loop) {
            Ok(state) => self.gl = Some(state),
            Err(e) => {
                log::error!("Failed to initialize OpenGL: {:?}", e);
                event_loop.exit();
            }
        }
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

            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);
                self.resize(size.width, size.height);
            }

            WindowEvent::RedrawRequested => match self.render_frame() {
                Ok(()) => self.update_fps(),
                Err(e) => log::error!("Render error: {:?}", e),
            },

            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed() {
                    if let PhysicalKey::Code(key) = event.physical_key {
                        match key {
                            // ESC - Quit application
                            KeyCode::Escape => {
                                log::info!("ESC pressed, exiting...");
                                event_loop.exit();
                            }
                            // F11 - Toggle fullscreen
                            KeyCode::F11 => self.toggle_fullscreen(),
                            _ => {}
                        }
                    }
                }
            }

            _ => {}
        }
    }

    /// Request continuous redraws; the swap interval paces the loop.
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gl) = &self.gl {
            gl.window.request_redraw();
        }
    }
}

// =============================================================================
// CLEANUP
// =============================================================================

impl Drop for App {
    fn drop(&mut self) {
        log::info!("Cleaning up GL resources...");
        // GlState's field order deletes scene objects while the context is
        // still current, then the surface, context and window.
        self.gl = None;
        log::info!("Cleanup complete");
    }
}
