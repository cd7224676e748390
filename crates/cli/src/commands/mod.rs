//! Command implementations.

mod compare;
mod info;
mod run;
mod validate;

pub use compare::run_compare;
pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;
