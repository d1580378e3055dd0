//! # Surface
//! The seam between the engine and whatever actually paints pixels.
//!
//! A [`Surface`] owns the live scene - the engine never keeps a second copy,
//! it reads the scene out as a document ([`Surface::serialize`]) and writes
//! whole documents back in ([`Surface::deserialize`]). Only restoration is
//! async: rebuilding a scene re-materializes its images, and that can take
//! real time on a real host. Everything else is bookkeeping the host can
//! answer immediately.
//!
//! Image decoding lives on its own seam, [`ImageLoader`], so that fetches for
//! background workflows can overlap each other and the editor lock.

use backdrop_core::color::Color;
use backdrop_core::scene::{BackgroundImage, ObjectId, ObjectState, SceneDoc, SceneObject};
use backdrop_core::source::ImageSource;

#[async_trait::async_trait]
pub trait Surface: Send {
    /// Logical canvas size, `[width, height]`.
    fn canvas_size(&self) -> [f32; 2];
    /// Every object in paint order, bottom-most first.
    fn objects(&self) -> Vec<SceneObject>;
    /// Append an object on top.
    fn add_object(&mut self, object: SceneObject);
    /// Remove by handle. False if the handle is not on this surface.
    fn remove_object(&mut self, id: ObjectId) -> bool;
    /// Swap an object's state in place, keeping its handle and its position
    /// in paint order. False if the handle is not on this surface.
    fn replace_object(&mut self, id: ObjectId, state: ObjectState) -> bool;
    /// `None` clears the color layer. An existing background image is not
    /// touched - the two layers are independent.
    fn set_background_color(&mut self, color: Option<Color>);
    /// Replaces any previous background image outright. `None` clears it.
    fn set_background_image(&mut self, image: Option<BackgroundImage>);
    fn resize(&mut self, width: f32, height: f32);
    /// Schedule a repaint. Must be cheap and coalescing.
    fn request_repaint(&mut self);
    /// Read the whole scene out as a portable document. Lossless: feeding
    /// the result back through [`Surface::deserialize`] reproduces the scene.
    fn serialize(&self) -> SceneDoc;
    /// Replace the whole scene with `doc`. Not a merge - anything live that
    /// the document does not mention is gone afterwards. On error the scene
    /// is unspecified and the caller must not assume either state.
    async fn deserialize(&mut self, doc: &SceneDoc) -> Result<(), crate::BoxedError>;
}

/// A decoded image: the source it came from and the size it decoded at.
#[derive(Clone, PartialEq, Debug)]
pub struct LoadedImage {
    pub source: ImageSource,
    /// Intrinsic `[width, height]` in pixels, before any placement scaling.
    pub natural_size: [f32; 2],
}

/// Fetches and decodes images. Shared by concurrent workflows, hence `&self`
/// and `Sync` - implementations handle their own connection reuse.
#[async_trait::async_trait]
pub trait ImageLoader: Send + Sync {
    /// Fetch `source` and decode it far enough to know its natural size.
    /// For directive URLs this is what makes the CDN actually run the
    /// transformation.
    async fn load(&self, source: &ImageSource) -> Result<LoadedImage, crate::BoxedError>;
}
