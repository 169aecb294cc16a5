// Endpoint groups, one impl block on `MetalClient` per file.

mod filesystemlayouts;
mod images;
mod machines;
mod networks;
mod partitions;
mod projects;
mod sizes;
mod switches;
mod system;

pub use machines::PowerAction;
