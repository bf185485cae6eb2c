pub mod aggregators;
pub mod bayesian;
pub mod correction;
pub mod effect_size;
pub mod impact;
pub mod power;
pub mod report;
pub mod root_finding;
pub mod segment;
pub mod srm;
pub mod statistical;

pub use aggregators::*;
pub use bayesian::*;
pub use correction::*;
pub use effect_size::*;
pub use impact::*;
pub use power::*;
pub use proportion_test::*;
pub use report::*;
pub use root_finding::*;
pub use segment::*;
pub use srm::*;
pub use statistical::*;
