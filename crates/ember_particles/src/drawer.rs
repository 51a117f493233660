//! # Drawer State
//!
//! Per-pool render configuration read by the rendering backend, plus the
//! packed instance layout it uploads.
//!
//! The engine never draws. It only records what the renderer needs to batch
//! a pool's alive particles: which texture, how to blend, and whether
//! positions are relative to the owning entity or already in world space.

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use ember_shared::{Rgba, Vec2};
use serde::{Deserialize, Serialize};

/// A renderable texture owned by the rendering backend.
pub trait Texture: Send + Sync {
    /// Backend identifier of the texture.
    fn id(&self) -> u32;
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
}

/// Shared reference to a texture.
pub type TextureRef = Arc<dyn Texture>;

/// Resolves texture names to textures at pool configuration time.
///
/// Missing assets are the provider's concern; it decides whether to return a
/// placeholder.
pub trait TextureFactory {
    /// Returns the texture registered under `name`.
    fn create_texture(&self, name: &str) -> TextureRef;
}

/// How particle fragments combine with the framebuffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Standard alpha blending.
    #[default]
    SourceAlpha,
    /// Additive blending, for fire and sparks.
    Additive,
}

/// Coordinate space of particle positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpace {
    /// Relative to the owning entity; moves with it.
    #[default]
    Local,
    /// Already in world space; stays behind when the entity moves.
    World,
}

/// Render configuration of one pool.
#[derive(Clone, Default)]
pub struct ParticleDrawer {
    texture: Option<TextureRef>,
    blend_mode: BlendMode,
    transform_space: TransformSpace,
}

impl ParticleDrawer {
    /// Texture to draw particles with, if one is set.
    #[must_use]
    pub fn texture(&self) -> Option<&TextureRef> {
        self.texture.as_ref()
    }

    /// Blend mode.
    #[must_use]
    pub const fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Coordinate space.
    #[must_use]
    pub const fn transform_space(&self) -> TransformSpace {
        self.transform_space
    }

    pub(crate) fn set(
        &mut self,
        texture: Option<TextureRef>,
        blend_mode: BlendMode,
        transform_space: TransformSpace,
    ) {
        self.texture = texture;
        self.blend_mode = blend_mode;
        self.transform_space = transform_space;
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for ParticleDrawer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleDrawer")
            .field("texture", &self.texture.as_ref().map(|texture| texture.id()))
            .field("blend_mode", &self.blend_mode)
            .field("transform_space", &self.transform_space)
            .finish()
    }
}

/// One alive particle packed for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Position (xy).
    pub position: [f32; 2],
    /// Rotation in radians.
    pub rotation: f32,
    /// Quad size.
    pub size: f32,
    /// Color (rgba).
    pub color: [f32; 4],
}

impl ParticleInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Packs one particle.
    #[must_use]
    pub const fn new(position: Vec2, rotation: f32, size: f32, color: Rgba) -> Self {
        Self {
            position: position.to_array(),
            rotation,
            size,
            color: color.to_array(),
        }
    }
}
