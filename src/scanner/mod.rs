//! Asset scanner: directory walker, usage resolution, deletion.

pub mod category;
pub mod deletion;
pub mod resolver;
pub mod walker;
