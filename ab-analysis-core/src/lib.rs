pub mod domain;
pub mod error;
pub mod quality;

pub use domain::*;
pub use error::*;
pub use quality::*;
