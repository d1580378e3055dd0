//! # Scene
//! The portable document model of a canvas. [`SceneDoc`] is what snapshots
//! store and what a rendering surface serializes to and restores from -
//! everything in it is plain data with structural equality.
//!
//! Live objects on a surface additionally carry an [`ObjectId`] runtime
//! handle. IDs are never part of the document: a restored scene is rebuilt
//! from scratch and gets fresh handles, so documents address objects by list
//! order alone.

use crate::color::Color;
use crate::source::ImageSource;

pub type ObjectId = crate::UniqueId<SceneObject>;

/// Where an object's `(left, top)` placement point sits on the object itself.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

/// Position, scale, and rotation of an object on the canvas.
///
/// `left`/`top` locate the anchor named by the origin pair, in canvas
/// coordinates. `angle` is degrees clockwise about that same anchor.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Debug)]
pub struct Placement {
    pub left: f32,
    pub top: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub angle: f32,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
}
impl Default for Placement {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
        }
    }
}
impl Placement {
    /// Uniform scale centered on the given point, anchored at the object's own center.
    #[must_use]
    pub fn centered_at(left: f32, top: f32, scale: f32) -> Self {
        Self {
            left,
            top,
            scale_x: scale,
            scale_y: scale,
            angle: 0.0,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
        }
    }
}

/// Content payload of an object. The engine only ever branches on
/// image-ness; the other kinds ride along for the document's sake.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Debug)]
pub enum ObjectKind {
    /// Raster image materialized from a source reference.
    Image { source: ImageSource },
    Text {
        content: String,
        size: f32,
        fill: Color,
    },
    Shape { shape: Shape, fill: Color },
}
impl ObjectKind {
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
    /// The image source, if this is an image.
    #[must_use]
    pub fn image_source(&self) -> Option<&ImageSource> {
        match self {
            Self::Image { source } => Some(source),
            _ => None,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Debug)]
pub enum Shape {
    Rect { width: f32, height: f32 },
    Ellipse { rx: f32, ry: f32 },
    Line { x2: f32, y2: f32 },
}

/// Everything the document records about one object.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Debug)]
pub struct ObjectState {
    pub kind: ObjectKind,
    pub placement: Placement,
}

/// A live object on a surface: document state plus a runtime handle.
#[derive(Clone, PartialEq, Debug)]
pub struct SceneObject {
    pub id: ObjectId,
    pub state: ObjectState,
}
impl SceneObject {
    /// Wrap fresh state under a newly allocated handle.
    #[must_use]
    pub fn new(state: ObjectState) -> Self {
        Self {
            id: ObjectId::next(),
            state,
        }
    }
}

/// The canvas background. Color and image layers are independent - an image
/// composites over the color where both are set.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Debug, Default)]
pub struct Background {
    pub color: Option<Color>,
    pub image: Option<BackgroundImage>,
}

/// A background image is placed like any object, just rendered beneath all of them.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Debug)]
pub struct BackgroundImage {
    pub source: ImageSource,
    pub placement: Placement,
}

/// The whole portable scene: logical canvas size, background, and the
/// ordered object list (bottom-most first, as the surface paints them).
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Debug)]
pub struct SceneDoc {
    pub width: f32,
    pub height: f32,
    pub background: Background,
    pub objects: Vec<ObjectState>,
}
impl SceneDoc {
    /// Empty document at the given canvas size.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            objects: Vec::new(),
        }
    }
    /// Canvas size as a vector, for placement math.
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        [self.width, self.height]
    }
    /// The primary subject: the first image in paint order, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&ObjectState> {
        self.objects.iter().find(|object| object.kind.is_image())
    }
}

/// The primary subject among live objects: the first image in paint order.
///
/// Looked up on demand, never cached - restores and removals reshuffle the
/// list, and a stale answer here would route an AI transform at the wrong
/// object.
#[must_use]
pub fn find_subject(objects: &[SceneObject]) -> Option<&SceneObject> {
    objects.iter().find(|object| object.state.kind.is_image())
}
