//! Interactive `bb fix` session: a ratatui List view for triaging every
//! repository on the machine snapshot, a Wizard view for confirming risky
//! actions, and a Summary view once the queue drains.

pub mod app;
pub mod session;
pub mod view;

pub use session::run_session;
