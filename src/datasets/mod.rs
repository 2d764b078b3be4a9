mod batch;
pub use batch::*;

mod graph;
pub use graph::*;

mod loader;
pub use loader::*;

mod minigc;
pub use minigc::*;

mod traits;
pub use traits::*;
