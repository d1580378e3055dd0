pub mod compose;
pub mod editor;
pub mod headless;
pub mod stock;
pub mod surface;

/// Error type crossing the host boundary. Collaborators report whatever they
/// like; the engine only ever forwards it as context.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;
