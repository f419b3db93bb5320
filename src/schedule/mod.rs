// Execution: dependency resolution, the window scheduler and its result table

pub mod resolver;
pub mod results;
pub mod scheduler;
pub mod workers;

pub use resolver::{resolve, ExecutionPlan, PlanDependency, PlanStep};
pub use results::{FeatureColumn, ResultTable};
pub use scheduler::run;
