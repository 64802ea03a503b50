/*!
# portgfx

Backend-neutral graphics layer for a 2D/3D game-porting runtime.

The upper drawing layer talks to a single [`GraphicsBackend`](graphics::GraphicsBackend)
trait object owned by the [`Engine`](portgfx::Engine) singleton. Concrete
backends (OpenGL fixed-function, OpenGL shaders, GLES2) live in their own
crates and implement that trait.

## Architecture

- **Engine**: global owner of the active backend and of the logger
- **GraphicsBackend**: dispatch table (state, textures, framebuffers, buffers, drawing)
- **Surface**: CPU-side pixel buffer used for uploads and read-back
- **VertexDefinition**: element layout consumed by the backend's vertex binder
- **PresetProgramDesc**: selects one of the stock texture/color combine presets
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics;

// Main portgfx namespace module
pub mod portgfx {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Dispatch trait
    pub use crate::graphics::GraphicsBackend;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Graphics sub-module with all backend-facing types
    pub mod graphics {
        pub use crate::graphics::*;
    }
}

// Re-export math library at crate root
pub use glam;
