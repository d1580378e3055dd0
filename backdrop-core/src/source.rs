//! # Image sources
//! Where an image came from, and what its host can do for us.
//!
//! AI-backed edits (background removal, prompt-driven background swaps) are
//! not computed locally - they are requested by deriving a new URL carrying a
//! transformation directive, which a capable CDN resolves to a freshly
//! processed image. Whether a source's host understands directives is carried
//! *explicitly* on the source, never sniffed back out of the URL text.

/// What the hosting service of an image can do.
#[derive(
    serde::Serialize, serde::Deserialize, Copy, Clone, PartialEq, Eq, Debug, strum::AsRefStr,
)]
pub enum ImageHost {
    /// A CDN that resolves `tr=` query directives into processed images.
    DirectiveCdn,
    /// Any plain file host. Serves bytes, understands nothing.
    Plain,
}

/// A reference to a remote image: its URL plus its host's capability.
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct ImageSource {
    url: String,
    host: ImageHost,
}

impl ImageSource {
    #[must_use]
    pub fn new(url: impl Into<String>, host: ImageHost) -> Self {
        Self {
            url: url.into(),
            host,
        }
    }
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
    #[must_use]
    pub fn host(&self) -> ImageHost {
        self.host
    }
    /// Derive the source for a transformed rendition of this image.
    ///
    /// Returns `None` when the host cannot apply directives (callers decide
    /// whether that is an error or a disabled button), or when the stored URL
    /// does not parse as an absolute URL.
    ///
    /// Directives do not stack: any query (and fragment) already on the URL
    /// is dropped before the new `tr` parameter is appended, so transforming
    /// an already-transformed source replaces the old directive. The
    /// directive value is percent-encoded by the URL library - prompts may
    /// contain anything.
    #[must_use]
    pub fn transformed(&self, directive: &Directive) -> Option<Self> {
        match self.host {
            ImageHost::Plain => None,
            ImageHost::DirectiveCdn => {
                let Ok(mut url) = url::Url::parse(&self.url) else {
                    log::warn!("directive host with unparseable url {:?}", self.url);
                    return None;
                };
                url.set_fragment(None);
                url.set_query(None);
                url.query_pairs_mut().append_pair("tr", &directive.param());
                Some(Self {
                    url: url.into(),
                    host: self.host,
                })
            }
        }
    }
}
impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// A server-side image transformation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    /// Cut the primary subject out of its background.
    RemoveBackground,
    /// Replace the background with one generated from a text prompt.
    ChangeBackground { prompt: String },
}
impl Directive {
    /// The `tr` query value understood by the CDN.
    #[must_use]
    pub fn param(&self) -> String {
        match self {
            Self::RemoveBackground => "e-bgremove".to_owned(),
            Self::ChangeBackground { prompt } => format!("e-changebg-prompt-{prompt}"),
        }
    }
}
