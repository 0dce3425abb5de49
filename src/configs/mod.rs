pub mod base;
pub mod gamepass;
pub mod logging;
pub mod sources;

pub use base::*;
pub use gamepass::*;
pub use logging::*;
pub use sources::*;
