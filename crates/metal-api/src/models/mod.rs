// Request and response shapes of the metal-api v1 surface.
//
// Field names follow the API's JSON keys, so structs round-trip through
// YAML files written by users without renames.

mod audit;
mod filesystemlayout;
mod firmware;
mod health;
mod image;
mod machine;
mod network;
mod partition;
mod project;
mod size;
mod switch;
mod version;

pub use audit::*;
pub use filesystemlayout::*;
pub use firmware::*;
pub use health::*;
pub use image::*;
pub use machine::*;
pub use network::*;
pub use partition::*;
pub use project::*;
pub use size::*;
pub use switch::*;
pub use version::*;
