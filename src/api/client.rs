//! Purpose: Explicit context object for talking to the ipset tool.
//! Exports: `Ipset` and its set-independent operations (check, create, swap, flush/destroy all).
//! Role: Owns program resolution, the executor, restore sizing, and reuse pools.
//! Invariants: No process-wide state; every client resolves and caches its own program path.
//! Invariants: Each operation performs at most one tool invocation (restore: one per chunk).
//! Invariants: Tool failures are never retried here; `-exist` is the idempotence mechanism.
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use bstr::ByteSlice;
use tracing::{debug, warn};

use super::exec::{Executor, SystemExecutor};
use super::set::IpSet;
use crate::core::action::Action;
use crate::core::command::{CommandDescriptor, ERROR_PREFIX};
use crate::core::compile::compile;
use crate::core::error::{Error, ErrorKind};
use crate::core::modifier::{Modifier, ModifierSet};
use crate::core::restore::DEFAULT_MAX_RESTORE_SIZE;
use crate::core::reuse::{DEFAULT_POOL_CAPACITY, ReusePool};
use crate::core::set_type::SetType;
use crate::core::version::{MIN_SUPPORTED_MAJOR, major_version};

pub type ApiResult<T> = Result<T, Error>;

const DEFAULT_PROGRAM: &str = "ipset";
const VERSION_VERB: &str = "version";

#[derive(Debug, Default)]
struct Pools {
    commands: ReusePool<CommandDescriptor>,
    modifiers: ReusePool<ModifierSet>,
}

impl Pools {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: ReusePool::new(capacity),
            modifiers: ReusePool::new(capacity),
        }
    }
}

#[derive(Debug, Default)]
struct ProgramCache {
    resolved: OnceLock<PathBuf>,
    verified: OnceLock<()>,
}

#[derive(Clone, Debug)]
pub struct Ipset {
    program: PathBuf,
    executor: Arc<dyn Executor>,
    max_restore_size: usize,
    cache: Arc<ProgramCache>,
    pools: Arc<Pools>,
}

impl Default for Ipset {
    fn default() -> Self {
        Self::new()
    }
}

impl Ipset {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            executor: Arc::new(SystemExecutor),
            max_restore_size: DEFAULT_MAX_RESTORE_SIZE,
            cache: Arc::new(ProgramCache::default()),
            pools: Arc::new(Pools::with_capacity(DEFAULT_POOL_CAPACITY)),
        }
    }

    /// Use `program` instead of searching `PATH` for `ipset`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self.cache = Arc::new(ProgramCache::default());
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = executor;
        self.cache = Arc::new(ProgramCache::default());
        self
    }

    /// Upper bound in bytes for one restore chunk written to the tool's stdin.
    pub fn with_max_restore_size(mut self, bytes: usize) -> Self {
        self.max_restore_size = bytes.max(1);
        self
    }

    /// Idle descriptors and modifier sets retained for reuse.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pools = Arc::new(Pools::with_capacity(capacity));
        self
    }

    pub fn max_restore_size(&self) -> usize {
        self.max_restore_size
    }

    pub(crate) fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// Resolve the tool's path once and reuse it for the client's lifetime.
    pub fn program(&self) -> ApiResult<PathBuf> {
        if let Some(path) = self.cache.resolved.get() {
            return Ok(path.clone());
        }
        let path = self
            .executor
            .look_path(self.program.as_os_str())
            .ok_or_else(|| not_found(&self.program))?;
        debug!(program = %path.display(), "resolved ipset executable");
        Ok(self.cache.resolved.get_or_init(|| path).clone())
    }

    /// Verify the tool is installed and at least major version 6.
    ///
    /// Succeeds immediately once a previous check has passed.
    pub fn check(&self) -> ApiResult<()> {
        if self.cache.verified.get().is_some() {
            return Ok(());
        }
        let program = self.program()?;
        let args = [VERSION_VERB.to_string()];
        let output = self.executor.run(&program, &args).map_err(|err| {
            Error::new(ErrorKind::Command)
                .with_message(format!("{ERROR_PREFIX}: can't query version: {err}"))
                .with_source(err)
        })?;
        if !output.success {
            return Err(Error::new(ErrorKind::Command).with_message(format!(
                "{ERROR_PREFIX}: can't query version: {}",
                output.combined.to_str_lossy()
            )));
        }
        let major = major_version(&output.combined);
        if major < MIN_SUPPORTED_MAJOR {
            return Err(Error::new(ErrorKind::Unsupported)
                .with_message(format!(
                    "{ERROR_PREFIX}: version not supported (found major {major}, need {MIN_SUPPORTED_MAJOR})"
                ))
                .with_hint("Upgrade the ipset package to v6 or later."));
        }
        let _ = self.cache.verified.set(());
        Ok(())
    }

    /// Bind a handle to an existing set without invoking the tool.
    pub fn open(&self, name: impl Into<String>, set_type: SetType) -> IpSet {
        IpSet::new(self.clone(), name.into(), set_type)
    }

    /// Create a set and return a handle to it.
    ///
    /// Pass [`Modifier::Exist`] to succeed when an identical set already exists.
    pub fn create(
        &self,
        name: impl Into<String>,
        set_type: SetType,
        modifiers: &[Modifier],
    ) -> ApiResult<IpSet> {
        let name = name.into();
        self.invoke(Action::Create, &name, Some(set_type), None, modifiers)?;
        Ok(IpSet::new(self.clone(), name, set_type))
    }

    pub fn flush(&self, name: &str) -> ApiResult<()> {
        self.invoke(Action::Flush, name, None, None, &[]).map(drop)
    }

    pub fn destroy(&self, name: &str) -> ApiResult<()> {
        self.invoke(Action::Destroy, name, None, None, &[]).map(drop)
    }

    /// Flush every set known to the tool.
    pub fn flush_all(&self) -> ApiResult<()> {
        self.flush("")
    }

    /// Destroy every set not referenced by a kernel rule.
    pub fn destroy_all(&self) -> ApiResult<()> {
        self.destroy("")
    }

    /// Exchange the contents of two existing sets.
    pub fn swap(&self, from: &str, to: &str) -> ApiResult<()> {
        self.invoke(Action::Swap, from, None, Some(to), &[]).map(drop)
    }

    /// Compile and run one command; returns captured output for list/save.
    pub(crate) fn invoke(
        &self,
        action: Action,
        name: &str,
        set_type: Option<SetType>,
        entry: Option<&str>,
        modifiers: &[Modifier],
    ) -> ApiResult<Vec<u8>> {
        self.invoke_tolerating(action, name, set_type, entry, modifiers, |_| false)
            .map(Option::unwrap_or_default)
    }

    /// Like `invoke`, but a non-zero exit whose output satisfies `tolerated`
    /// yields `Ok(None)` instead of an error.
    pub(crate) fn invoke_tolerating(
        &self,
        action: Action,
        name: &str,
        set_type: Option<SetType>,
        entry: Option<&str>,
        modifiers: &[Modifier],
        tolerated: impl Fn(&[u8]) -> bool,
    ) -> ApiResult<Option<Vec<u8>>> {
        let mut cmd = self.pools.commands.acquire();
        cmd.bind(action, name, set_type, entry);
        let args = {
            let mut set = self.pools.modifiers.acquire();
            set.apply(modifiers);
            compile(&cmd, &set)
        };

        let program = self.program()?;
        debug!(program = %program.display(), ?args, "invoking ipset");
        let output = self.executor.run(&program, &args).map_err(|err| {
            warn!(action = %action, set = name, error = %err, "ipset did not run");
            Error::new(ErrorKind::Command)
                .with_message(cmd.failure_message(&err.to_string()))
                .with_source(err)
        })?;

        if !output.success {
            if tolerated(&output.combined) {
                return Ok(None);
            }
            let text = output.combined.to_str_lossy();
            warn!(action = %action, set = name, "ipset rejected command");
            return Err(Error::new(ErrorKind::Command).with_message(cmd.failure_message(&text)));
        }

        if action.captures_output() {
            cmd.capture(&output.combined);
            return Ok(Some(cmd.take_output()));
        }
        Ok(Some(Vec::new()))
    }
}

fn not_found(program: &Path) -> Error {
    let shown: &OsStr = program.as_os_str();
    Error::new(ErrorKind::NotFound)
        .with_message(format!(
            "{ERROR_PREFIX}: executable {} not found",
            shown.to_string_lossy()
        ))
        .with_hint("Install the ipset package or pass --ipset <PATH>.")
}
