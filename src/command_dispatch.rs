//! Purpose: Hold top-level CLI command dispatch for `ipsetctl`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Each command maps onto exactly one `Ipset`/`IpSet` operation.
//! Invariants: `test` reports absence through its exit code, not as an error.

use super::*;

use crate::info_json::info_json;

/// Exit status of `test` when the entry is absent. Distinct from every
/// `to_exit_code` value so absence never reads as a failure.
pub(super) const ABSENT_EXIT_CODE: i32 = 8;

pub(super) fn dispatch_command(command: Command, client: &Ipset) -> Result<RunOutcome, Error> {
    match command {
        Command::Check => {
            client.check()?;
            let program = client.program()?;
            emit_json(json!({
                "program": program.display().to_string(),
                "supported": true,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Create {
            name,
            set_type,
            modifiers,
        } => {
            client.create(name, set_type, &modifiers.into_modifiers())?;
            Ok(RunOutcome::ok())
        }
        Command::Add { target, modifiers } => {
            let set = open(client, &target.set);
            set.add(&target.entry, &modifiers.into_modifiers())?;
            Ok(RunOutcome::ok())
        }
        Command::Del { target, modifiers } => {
            let set = open(client, &target.set);
            set.del(&target.entry, &modifiers.into_modifiers())?;
            Ok(RunOutcome::ok())
        }
        Command::Test { target } => {
            let present = open(client, &target.set).test(&target.entry)?;
            emit_json(json!({ "present": present }));
            if present {
                Ok(RunOutcome::ok())
            } else {
                Ok(RunOutcome::with_code(ABSENT_EXIT_CODE))
            }
        }
        Command::List {
            target,
            resolve,
            raw,
        } => {
            let set = open(client, &target);
            let modifiers = [Modifier::Resolve(resolve)];
            if raw {
                emit_raw(&set.list_raw(&modifiers)?)?;
            } else {
                let mut info = set.list(&modifiers)?;
                info.set_type = target.set_type;
                emit_json(info_json(&info));
            }
            Ok(RunOutcome::ok())
        }
        Command::Save {
            target,
            resolve,
            output,
        } => {
            let set = open(client, &target);
            let modifiers = [Modifier::Resolve(resolve)];
            match output {
                Some(path) => set.save_to_file(path, &modifiers)?,
                None => emit_raw(&set.save(&modifiers)?)?,
            }
            Ok(RunOutcome::ok())
        }
        Command::Restore {
            name,
            set_type,
            file,
            exist,
        } => {
            let set = client.open(name, set_type);
            match file {
                Some(path) => set.restore_from_file(path, exist)?,
                None => set.restore(io::stdin().lock(), exist)?,
            }
            Ok(RunOutcome::ok())
        }
        Command::Flush { name } => {
            match name {
                Some(name) => client.flush(&name)?,
                None => client.flush_all()?,
            }
            Ok(RunOutcome::ok())
        }
        Command::Destroy { name } => {
            match name {
                Some(name) => client.destroy(&name)?,
                None => client.destroy_all()?,
            }
            Ok(RunOutcome::ok())
        }
        Command::Rename { from, to } => {
            let mut set = client.open(from, DEFAULT_SET_TYPE);
            set.rename(&to)?;
            Ok(RunOutcome::ok())
        }
        Command::Swap { from, to } => {
            client.swap(&from, &to)?;
            Ok(RunOutcome::ok())
        }
        Command::Types => {
            let types = SetType::ALL.into_iter().map(SetType::as_str).collect::<Vec<_>>();
            emit_json(json!({ "types": types }));
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "ipsetctl", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn open(client: &Ipset, args: &SetArgs) -> ipsetctl::api::IpSet {
    client.open(args.name.clone(), args.set_type.unwrap_or(DEFAULT_SET_TYPE))
}
