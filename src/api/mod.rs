//! Purpose: Define the public Rust API boundary for driving ipset.
//! Exports: Client, set handle, executor seam, and the core types they take.
//! Role: Public, additive-only surface used by the CLI and library callers.
//! Invariants: Process execution is reachable only through `Executor`.

mod client;
mod exec;
mod set;

pub use crate::core::action::Action;
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::info::Info;
pub use crate::core::matrix::Category;
pub use crate::core::modifier::{Modifier, NetFamily};
pub use crate::core::restore::DEFAULT_MAX_RESTORE_SIZE;
pub use crate::core::set_type::SetType;
pub use crate::core::version::major_version;
pub use client::{ApiResult, Ipset};
pub use exec::{Executor, SystemExecutor, ToolOutput};
pub use set::IpSet;
