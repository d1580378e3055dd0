use crate::scene::SceneDoc;

/// An immutable capture of a whole scene, cheap to clone and to keep many of.
///
/// Equality is structural - two snapshots are equal exactly when their
/// documents are, regardless of when or where they were captured. History
/// correctness rests on that: "undo then redo lands you back where you were"
/// is checked against this equality.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug)]
pub struct Snapshot(std::sync::Arc<SceneDoc>);

impl Snapshot {
    /// Freeze a serialized scene.
    #[must_use]
    pub fn capture(doc: SceneDoc) -> Self {
        Self(std::sync::Arc::new(doc))
    }
    #[must_use]
    pub fn doc(&self) -> &SceneDoc {
        &self.0
    }
    /// Portable string form. Lossless - `from_json` of the result compares
    /// equal to `self`.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(&*self.0).map_err(CodecError::Encode)
    }
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let doc = serde_json::from_str(json).map_err(CodecError::Decode)?;
        Ok(Self(std::sync::Arc::new(doc)))
    }
}
impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        // Same allocation is the common case after clones - skip the deep walk.
        std::sync::Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}
impl From<SceneDoc> for Snapshot {
    fn from(doc: SceneDoc) -> Self {
        Self::capture(doc)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[source] serde_json::Error),
}
