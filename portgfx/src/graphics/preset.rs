/// Preset programs: the fixed palette of legacy compositing modes
///
/// A preset is selected together with the transform matrices, an optional
/// texture and an optional alpha test. Backends realize it either with
/// texture combiners or with a stock shader program; the observable contract
/// is the same.

use glam::Mat4;
use crate::graphics::texture::{DrawMode, TextureId};

/// Legacy compositing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TexturePreset {
    /// texture * color
    #[default]
    Modulate,
    /// color.rgb scaled by color.a
    MulAlpha,
    /// inverted color before modulate
    Invert,
    /// rgb result times 4
    X4,
    /// premultiplied alpha
    Pma,
    /// premultiplied alpha, inverted color
    PmaInvert,
    /// premultiplied alpha, rgb result times 4
    PmaX4,
}

impl TexturePreset {
    pub const ALL: [TexturePreset; 7] = [
        TexturePreset::Modulate,
        TexturePreset::MulAlpha,
        TexturePreset::Invert,
        TexturePreset::X4,
        TexturePreset::Pma,
        TexturePreset::PmaInvert,
        TexturePreset::PmaX4,
    ];
}

/// Alpha test comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlphaTestFunc {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

/// Alpha test configuration: fragments pass when `alpha <func> reference`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTest {
    pub func: AlphaTestFunc,
    pub reference: f32,
}

/// Everything `set_preset_program` needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetProgramDesc {
    pub preset: TexturePreset,
    /// `None` disables alpha testing
    pub alpha_test: Option<AlphaTest>,
    pub projection: Mat4,
    pub view: Mat4,
    /// `None` draws untextured (backends substitute a white pixel texture
    /// where the combiner math needs one)
    pub texture: Option<TextureId>,
    pub draw_mode: DrawMode,
}

impl PresetProgramDesc {
    /// Untextured preset with identity matrices
    pub fn new(preset: TexturePreset) -> Self {
        Self {
            preset,
            alpha_test: None,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            texture: None,
            draw_mode: DrawMode::Nearest,
        }
    }

    pub fn with_texture(mut self, texture: TextureId, draw_mode: DrawMode) -> Self {
        self.texture = Some(texture);
        self.draw_mode = draw_mode;
        self
    }

    pub fn with_alpha_test(mut self, func: AlphaTestFunc, reference: f32) -> Self {
        self.alpha_test = Some(AlphaTest { func, reference });
        self
    }

    pub fn with_matrices(mut self, projection: Mat4, view: Mat4) -> Self {
        self.projection = projection;
        self.view = view;
        self
    }
}

impl Default for PresetProgramDesc {
    fn default() -> Self {
        Self::new(TexturePreset::Modulate)
    }
}
