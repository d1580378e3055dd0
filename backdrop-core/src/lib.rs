pub mod color;
pub mod history;
pub mod id;
pub mod placement;
pub mod scene;
pub mod snapshot;
pub mod source;

use id::UniqueId;
