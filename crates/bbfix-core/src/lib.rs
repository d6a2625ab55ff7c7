//! The `bb fix` remediation engine: risk collection, eligibility, plan
//! building, the apply pipeline, selector resolution, and the ambient
//! validation/notification/telemetry plumbing the other crates wire up.

pub mod apply;
pub mod eligibility;
pub mod notify;
pub mod plan;
pub mod risk;
pub mod selector;
pub mod telemetry;
pub mod validation;

pub use apply::{apply_action, ApplyRequest};
pub use eligibility::{evaluate, ineligible_reason};
pub use plan::{build_plan, PlanContext, PlanOptions};
pub use selector::resolve;
