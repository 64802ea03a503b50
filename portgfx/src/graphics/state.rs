/// Render-state value types: blending, depth, scissor, clears, primitives

use bitflags::bitflags;

// ===== BLENDING =====

/// Blend factor applied to source or destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    #[default]
    Zero,
    One,
    SrcColor,
    DstColor,
    SrcAlpha,
    DstAlpha,
    OneMinusSrcColor,
    OneMinusDstColor,
    OneMinusSrcAlpha,
    OneMinusDstAlpha,
}

/// Blend equation
///
/// `Disable` turns blending off instead of selecting an equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendEquation {
    Disable,
    #[default]
    Add,
    ReverseSubtract,
}

// ===== DEPTH =====

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
    NotEqual,
    Always,
}

// ===== CLEARING =====

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

// ===== RECTANGLES =====

/// Integer rectangle in x/y/width/height form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// True when the rectangle lies within a `width` x `height` area
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.w >= 0
            && self.h >= 0
            && (self.x as i64 + self.w as i64) <= width as i64
            && (self.y as i64 + self.h as i64) <= height as i64
    }
}

/// Integer rectangle in left/top/right/bottom form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn to_rect(self) -> Rect {
        Rect {
            x: self.left,
            y: self.top,
            w: self.right - self.left,
            h: self.bottom - self.top,
        }
    }
}

impl From<Bounds> for Rect {
    fn from(bounds: Bounds) -> Self {
        bounds.to_rect()
    }
}

// ===== PRIMITIVES =====

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    #[default]
    Triangles,
    TriangleFan,
    TriangleStrip,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
