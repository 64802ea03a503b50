/*!
# portgfx - OpenGL Backend

OpenGL implementation of the [`GraphicsBackend`](portgfx::portgfx::GraphicsBackend)
trait, for desktop compatibility contexts and OpenGL ES 2.0.

Preset programs run on texture combiners (the `fixed-function` feature, desktop
only) or on a set of stock GLSL programs compiled at startup. Every native call
goes through the [`GlApi`] trait: [`LoadedGl`] resolves the entry points of a
live context through the windowing layer's loader, [`MockGl`] simulates one for
headless runs and tests.

## Example

```no_run
use portgfx::portgfx::Engine;
use portgfx_renderer_gl::{GlConfig, GlProfile, GlRenderer, LoadedGl};

# fn get_proc_address(_: &str) -> *const std::ffi::c_void { std::ptr::null() }
# fn has_extension(_: &str) -> bool { false }
let gl = LoadedGl::load(GlProfile::Desktop, get_proc_address, has_extension)?;
let renderer = GlRenderer::new(Box::new(gl), GlConfig::default())?;

Engine::initialize()?;
Engine::create_backend(renderer)?;
# Ok::<(), portgfx::portgfx::Error>(())
```
*/

// Native call seam
pub mod gl_api;
mod gl_context;
mod gl_debug;
pub mod mock_gl;

// Resources and state
mod gl_frame_buffer;
mod gl_texture;
mod gl_render_state;
mod gl_buffer;

// Preset engines
#[cfg(feature = "fixed-function")]
mod gl_fixed_function;
mod gl_shader;

mod gl_renderer;

pub use gl_api::GlApi;
pub use gl_context::{GlProfile, LoadedGl};
pub use gl_renderer::{GlConfig, GlRenderer};
pub use mock_gl::MockGl;

// Re-export error tracking utilities
pub use gl_debug::{gl_error_stats, print_gl_error_report, reset_gl_error_stats, GlErrorStats};
