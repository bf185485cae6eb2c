pub mod ids;
pub mod variant;
pub mod record;
pub mod proportion;

pub use ids::*;
pub use variant::*;
pub use record::*;
pub use proportion::*;
