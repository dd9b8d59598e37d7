pub mod exec;
pub mod ids;
pub mod report;
pub mod scenario;

pub use exec::*;
pub use ids::RunId;
pub use report::*;
pub use scenario::*;
