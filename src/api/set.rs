//! Purpose: Handle bound to one named set and the operations on its contents.
//! Exports: `IpSet`.
//! Role: Thin typed wrapper over `Ipset::invoke`; holds only (name, set type).
//! Invariants: `test` never errors on a "NOT in set" reply; it returns `false`.
//! Invariants: Restore streams chunks sequentially and stops at the first failure.
//! Invariants: File helpers surface local I/O errors as `ErrorKind::Io` with the path.
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use bstr::ByteSlice;
use tracing::{debug, warn};

use super::client::{ApiResult, Ipset};
use crate::core::action::Action;
use crate::core::command::ERROR_PREFIX;
use crate::core::error::{Error, ErrorKind};
use crate::core::info::{Info, parse_info};
use crate::core::matrix::Category;
use crate::core::modifier::Modifier;
use crate::core::restore::stream_chunks;
use crate::core::set_type::SetType;

/// Marker the tool prints when a tested entry is absent.
const NOT_MARKER: &str = "NOT";

#[derive(Clone, Debug)]
pub struct IpSet {
    client: Ipset,
    name: String,
    set_type: SetType,
}

impl IpSet {
    pub(crate) fn new(client: Ipset, name: String, set_type: SetType) -> Self {
        Self {
            client,
            name,
            set_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_type(&self) -> SetType {
        self.set_type
    }

    fn run(
        &self,
        action: Action,
        entry: Option<&str>,
        modifiers: &[Modifier],
    ) -> ApiResult<Vec<u8>> {
        self.client
            .invoke(action, &self.name, Some(self.set_type), entry, modifiers)
    }

    /// List the set's header and members.
    ///
    /// Accepts [`Modifier::Resolve`] to print host names instead of addresses.
    pub fn list(&self, modifiers: &[Modifier]) -> ApiResult<Info> {
        let out = self.list_raw(modifiers)?;
        let mut info = parse_info(&out.to_str_lossy())?;
        info.name = self.name.clone();
        info.set_type = Some(self.set_type);
        Ok(info)
    }

    /// Unparsed `ipset list` output.
    pub fn list_raw(&self, modifiers: &[Modifier]) -> ApiResult<Vec<u8>> {
        self.run(Action::List, None, modifiers)
    }

    pub fn list_to_file(&self, path: impl AsRef<Path>, modifiers: &[Modifier]) -> ApiResult<()> {
        let out = self.list_raw(modifiers)?;
        write_private_file(path.as_ref(), &out)
    }

    /// Output of `ipset save`, restorable with [`IpSet::restore`].
    pub fn save(&self, modifiers: &[Modifier]) -> ApiResult<Vec<u8>> {
        self.run(Action::Save, None, modifiers)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>, modifiers: &[Modifier]) -> ApiResult<()> {
        let out = self.save(modifiers)?;
        write_private_file(path.as_ref(), &out)
    }

    /// Rename the set; the handle follows the new name on success.
    pub fn rename(&mut self, new_name: &str) -> ApiResult<()> {
        self.run(Action::Rename, Some(new_name), &[])?;
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn add(&self, entry: &str, modifiers: &[Modifier]) -> ApiResult<()> {
        self.run(Action::Add, Some(entry), modifiers).map(drop)
    }

    pub fn del(&self, entry: &str, modifiers: &[Modifier]) -> ApiResult<()> {
        self.run(Action::Del, Some(entry), modifiers).map(drop)
    }

    /// Membership test. A "NOT in set" reply is `Ok(false)`; any other failure is an error.
    pub fn test(&self, entry: &str) -> ApiResult<bool> {
        let present = self.client.invoke_tolerating(
            Action::Test,
            &self.name,
            Some(self.set_type),
            Some(entry),
            &[],
            |out| out.contains_str(NOT_MARKER),
        )?;
        Ok(present.is_some())
    }

    pub fn flush(&self) -> ApiResult<()> {
        self.run(Action::Flush, None, &[]).map(drop)
    }

    pub fn destroy(&self) -> ApiResult<()> {
        self.run(Action::Destroy, None, &[]).map(drop)
    }

    /// Stream `restore` directives into the tool in size-bounded chunks.
    ///
    /// Each chunk is a separate `ipset restore` session. With `exist` set the
    /// tool ignores entries that are already present.
    pub fn restore(&self, reader: impl Read, exist: bool) -> ApiResult<()> {
        let mut args = vec![Action::Restore.as_str().to_string()];
        if exist {
            args.push(Category::Exist.flag().to_string());
        }

        let result = self.client.program().and_then(|program| {
            stream_chunks(
                BufReader::new(reader),
                self.client.max_restore_size(),
                |chunk| {
                    debug!(set = %self.name, bytes = chunk.len(), "restore session");
                    let output = self
                        .client
                        .executor()
                        .run_with_input(&program, &args, chunk)
                        .map_err(|err| {
                            Error::new(ErrorKind::Command)
                                .with_message(err.to_string())
                                .with_source(err)
                        })?;
                    if output.success {
                        Ok(())
                    } else {
                        Err(Error::new(ErrorKind::Command)
                            .with_message(output.combined.to_str_lossy().into_owned()))
                    }
                },
            )
        });

        result.map(drop).map_err(|err| {
            warn!(set = %self.name, error = %err, "restore aborted");
            Error::new(err.kind())
                .with_message(format!(
                    "{ERROR_PREFIX}: can't restore to {}({}): {err}",
                    self.name, self.set_type
                ))
                .with_source(err)
        })
    }

    pub fn restore_from_file(&self, path: impl AsRef<Path>, exist: bool) -> ApiResult<()> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| io_error(path, err))?;
        self.restore(file, exist)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(err.to_string())
        .with_path(path)
        .with_source(err)
}

fn write_private_file(path: &Path, contents: &[u8]) -> ApiResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(|err| io_error(path, err))?;
    file.write_all(contents).map_err(|err| io_error(path, err))
}

#[cfg(test)]
mod tests {
    use crate::api::client::Ipset;
    use crate::api::exec::ToolOutput;
    use crate::api::exec::scripted::ScriptedExecutor;
    use crate::core::error::ErrorKind;
    use crate::core::modifier::Modifier;
    use crate::core::set_type::SetType;
    use std::sync::Arc;
    use std::time::Duration;

    const LIST_INFO: &str = "
Name: foo
Type: hash:ip
Revision: 4
Header: family inet hashsize 1024 maxelem 65536
Size in memory: 168
References: 0
Number of entries: 1
Members:
1.1.1.1";

    const SAVE_INFO: &str = "
create foo hash:ip family inet hashsize 1024 maxelem 65536
add foo 1.1.1.1
";

    fn set_with(executor: &Arc<ScriptedExecutor>) -> super::IpSet {
        Ipset::new()
            .with_executor(executor.clone())
            .open("foo", SetType::HashIp)
    }

    #[test]
    fn list_parses_output_and_fills_identity() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::ok(LIST_INFO)));
        let set = set_with(&executor);
        let info = set.list(&[Modifier::Resolve(true)]).expect("list");
        assert_eq!(info.name, "foo");
        assert_eq!(info.set_type, Some(SetType::HashIp));
        assert_eq!(info.revision, 4);
        assert_eq!(info.header, "family inet hashsize 1024 maxelem 65536");
        assert_eq!(info.references, 0);
        assert_eq!(info.entries, vec!["1.1.1.1"]);
        assert_eq!(executor.calls()[0].args, vec!["list", "foo", "-resolve"]);
    }

    #[test]
    fn list_failure_uses_two_argument_shape() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::failed("fake error")));
        let err = set_with(&executor).list(&[]).expect_err("list");
        assert_eq!(err.kind(), ErrorKind::Command);
        assert_eq!(err.to_string(), "ipset: can't list foo: fake error");
    }

    #[test]
    fn save_returns_raw_output() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::ok(SAVE_INFO)));
        let out = set_with(&executor).save(&[]).expect("save");
        assert_eq!(out, SAVE_INFO.as_bytes().to_vec());
    }

    #[test]
    fn save_and_list_to_file_write_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let executor = Arc::new(
            ScriptedExecutor::new()
                .reply(ToolOutput::ok(SAVE_INFO))
                .reply(ToolOutput::ok(LIST_INFO)),
        );
        let set = set_with(&executor);

        let saved = temp.path().join("saved");
        set.save_to_file(&saved, &[]).expect("save to file");
        assert_eq!(std::fs::read_to_string(&saved).expect("read"), SAVE_INFO);

        let listed = temp.path().join("listed");
        set.list_to_file(&listed, &[]).expect("list to file");
        assert!(std::fs::read_to_string(&listed).expect("read").contains("Members:"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&saved).expect("metadata").permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn file_error_is_io_with_path() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::ok(SAVE_INFO)));
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("missing-dir").join("saved");
        let err = set_with(&executor).save_to_file(&path, &[]).expect_err("io");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.path(), Some(path.as_path()));
    }

    #[test]
    fn add_and_del_compile_entry_and_modifiers() {
        let executor = Arc::new(ScriptedExecutor::new());
        let set = set_with(&executor);
        set.add(
            "1.1.1.1",
            &[Modifier::Timeout(Duration::from_secs(3600)), Modifier::Exist(true)],
        )
        .expect("add");
        set.del("1.1.1.1", &[Modifier::Exist(true), Modifier::Timeout(Duration::from_secs(1))])
            .expect("del");
        let calls = executor.calls();
        assert_eq!(
            calls[0].args,
            vec!["add", "foo", "1.1.1.1", "timeout", "3600", "-exist"]
        );
        assert_eq!(calls[1].args, vec!["del", "foo", "1.1.1.1", "-exist"]);
    }

    #[test]
    fn add_failure_uses_three_argument_shape() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::failed("fake error")));
        let err = set_with(&executor).add("1.1.1.1", &[]).expect_err("add");
        assert_eq!(err.to_string(), "ipset: can't add foo 1.1.1.1: fake error");
    }

    #[test]
    fn test_distinguishes_absent_from_failure() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .reply(ToolOutput::ok(""))
                .reply(ToolOutput::failed("1.1.1.2 is NOT in set foo."))
                .reply(ToolOutput::failed("fake error")),
        );
        let set = set_with(&executor);
        assert!(set.test("1.1.1.1").expect("present"));
        assert!(!set.test("1.1.1.2").expect("absent"));
        let err = set.test("1.1.1.3").expect_err("failure");
        assert_eq!(err.to_string(), "ipset: can't test foo 1.1.1.3: fake error");
        assert_eq!(executor.calls()[1].args, vec!["test", "foo", "1.1.1.2"]);
    }

    #[test]
    fn rename_follows_new_name() {
        let executor = Arc::new(ScriptedExecutor::new());
        let mut set = set_with(&executor);
        set.rename("bar").expect("rename");
        assert_eq!(set.name(), "bar");
        set.flush().expect("flush");
        let calls = executor.calls();
        assert_eq!(calls[0].args, vec!["rename", "foo", "bar"]);
        assert_eq!(calls[1].args, vec!["flush", "bar"]);
    }

    #[test]
    fn rename_failure_keeps_old_name() {
        let executor = Arc::new(ScriptedExecutor::new().reply(ToolOutput::failed("fake error")));
        let mut set = set_with(&executor);
        let err = set.rename("bar").expect_err("rename");
        assert_eq!(err.to_string(), "ipset: can't rename foo bar: fake error");
        assert_eq!(set.name(), "foo");
    }

    #[test]
    fn flush_and_destroy_use_two_argument_shape() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .reply(ToolOutput::failed("fake error"))
                .reply(ToolOutput::failed("fake error")),
        );
        let set = set_with(&executor);
        assert_eq!(
            set.flush().expect_err("flush").to_string(),
            "ipset: can't flush foo: fake error"
        );
        assert_eq!(
            set.destroy().expect_err("destroy").to_string(),
            "ipset: can't destroy foo: fake error"
        );
    }

    #[test]
    fn restore_streams_chunks_in_order() {
        let executor = Arc::new(ScriptedExecutor::new());
        let set = Ipset::new()
            .with_executor(executor.clone())
            .with_max_restore_size(10)
            .open("foo", SetType::HashIp);
        let input = b"1.1.1.1\n2.2.2.2\n";
        set.restore(&input[..], true).expect("restore");

        let calls = executor.calls();
        assert!(calls.len() >= 2);
        let mut streamed = Vec::new();
        for call in &calls {
            assert_eq!(call.args, vec!["restore", "-exist"]);
            streamed.extend(call.input.clone().expect("stdin"));
        }
        assert_eq!(streamed, input.to_vec());
    }

    #[test]
    fn restore_failure_stops_and_names_set() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .reply(ToolOutput::ok(""))
                .reply(ToolOutput::failed("fake error")),
        );
        let set = Ipset::new()
            .with_executor(executor.clone())
            .with_max_restore_size(8)
            .open("foo", SetType::HashIp);
        let err = set
            .restore(&b"1.1.1.1\n2.2.2.2\n3.3.3.3\n"[..], false)
            .expect_err("second chunk fails");
        assert_eq!(err.to_string(), "ipset: can't restore to foo(hash:ip): fake error");
        assert_eq!(executor.calls().len(), 2);
        assert_eq!(executor.calls()[0].args, vec!["restore"]);
    }

    #[test]
    fn restore_from_missing_file_is_io_error() {
        let executor = Arc::new(ScriptedExecutor::new());
        let temp = tempfile::tempdir().expect("tempdir");
        let err = set_with(&executor)
            .restore_from_file(temp.path().join("absent"), false)
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn restore_from_file_streams_contents() {
        let executor = Arc::new(ScriptedExecutor::new());
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("saved");
        std::fs::write(&path, "add foo 1.1.1.1 timeout 3600\nadd foo 1.1.1.2 timeout 3600\n")
            .expect("write");
        set_with(&executor).restore_from_file(&path, false).expect("restore");
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].input.as_deref(),
            Some(&b"add foo 1.1.1.1 timeout 3600\nadd foo 1.1.1.2 timeout 3600\n"[..])
        );
    }
}
