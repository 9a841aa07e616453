//! Campaign lifecycle and staged creation.

mod draft;
mod lifecycle;

pub use draft::*;
pub use lifecycle::*;
