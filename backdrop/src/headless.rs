//! # Headless surface
//! In-memory [`Surface`] and [`ImageLoader`] with no rendering behind them.
//! The test suite runs entire sessions against these; embedders without a
//! real canvas (batch tools, server-side checks) can too.
//!
//! The surface plays by the real rules - paint order, handle semantics,
//! lossless serialize/restore - and additionally counts repaint requests and
//! offers one injectable restore failure, because those are the things a
//! test wants to see.

use backdrop_core::color::Color;
use backdrop_core::scene::{
    Background, BackgroundImage, ObjectId, ObjectState, SceneDoc, SceneObject,
};
use backdrop_core::source::ImageSource;

use crate::surface::{ImageLoader, LoadedImage, Surface};

#[derive(Debug)]
pub struct HeadlessSurface {
    width: f32,
    height: f32,
    background: Background,
    objects: Vec<SceneObject>,
    /// Repaint requests so far. Observable stand-in for actual painting.
    pub repaints: u64,
    /// When set, the next [`Surface::deserialize`] fails and the flag
    /// clears, as if one restore hit a dead network.
    pub fail_next_restore: bool,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            objects: Vec::new(),
            repaints: 0,
            fail_next_restore: false,
        }
    }
}

#[async_trait::async_trait]
impl Surface for HeadlessSurface {
    fn canvas_size(&self) -> [f32; 2] {
        [self.width, self.height]
    }
    fn objects(&self) -> Vec<SceneObject> {
        self.objects.clone()
    }
    fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }
    fn remove_object(&mut self, id: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| object.id != id);
        before != self.objects.len()
    }
    fn replace_object(&mut self, id: ObjectId, state: ObjectState) -> bool {
        let Some(object) = self.objects.iter_mut().find(|object| object.id == id) else {
            return false;
        };
        object.state = state;
        true
    }
    fn set_background_color(&mut self, color: Option<Color>) {
        self.background.color = color;
    }
    fn set_background_image(&mut self, image: Option<BackgroundImage>) {
        self.background.image = image;
    }
    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }
    fn request_repaint(&mut self) {
        self.repaints += 1;
    }
    fn serialize(&self) -> SceneDoc {
        SceneDoc {
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            objects: self
                .objects
                .iter()
                .map(|object| object.state.clone())
                .collect(),
        }
    }
    async fn deserialize(&mut self, doc: &SceneDoc) -> Result<(), crate::BoxedError> {
        if self.fail_next_restore {
            self.fail_next_restore = false;
            return Err("injected restore failure".into());
        }
        self.width = doc.width;
        self.height = doc.height;
        self.background = doc.background.clone();
        // Rebuilt objects are new objects - fresh handles, same order.
        self.objects = doc
            .objects
            .iter()
            .cloned()
            .map(SceneObject::new)
            .collect();
        Ok(())
    }
}

/// Loader answering from a fixture table instead of a network.
#[derive(Debug, Default)]
pub struct HeadlessLoader {
    sizes: hashbrown::HashMap<String, [f32; 2]>,
}

impl HeadlessLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Teach the loader a URL and the natural size it decodes at.
    pub fn register(&mut self, url: impl Into<String>, natural_size: [f32; 2]) {
        self.sizes.insert(url.into(), natural_size);
    }
}

#[async_trait::async_trait]
impl ImageLoader for HeadlessLoader {
    async fn load(&self, source: &ImageSource) -> Result<LoadedImage, crate::BoxedError> {
        let Some(&natural_size) = self.sizes.get(source.url()) else {
            return Err(format!("no image registered for {}", source.url()).into());
        };
        Ok(LoadedImage {
            source: source.clone(),
            natural_size,
        })
    }
}
