//! Purpose: `ipsetctl` CLI entry point.
//! Role: Binary crate root; parses args, runs one ipset operation, emits JSON on stdout.
//! Invariants: Query commands (check, list, test, types) emit JSON; mutations are silent on success.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod info_json;

use ipsetctl::api::{Error, ErrorKind, Ipset, Modifier, NetFamily, SetType, to_exit_code};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    let mut client = Ipset::new();
    if let Some(program) = cli.ipset {
        client = client.with_program(program);
    }
    if let Some(bytes) = cli.max_restore_size {
        client = client.with_max_restore_size(bytes);
    }

    command_dispatch::dispatch_command(cli.command, &client)
        .map_err(add_not_found_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "ipsetctl",
    version,
    about = "Typed front end for ipset(8) address sets",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Every command compiles to exactly one `ipset` invocation (restore: one per chunk).
Modifiers that do not apply to a command or set type are dropped, never passed through.
"#,
    after_help = r#"EXAMPLES
  $ ipsetctl create blocklist hash:ip --timeout 1h --exist
  $ ipsetctl add blocklist 192.0.2.7 --timeout 600
  $ ipsetctl test blocklist 192.0.2.7
  $ ipsetctl save blocklist -o blocklist.save
  $ ipsetctl restore blocklist hash:ip -f blocklist.save --exist

LEARN MORE
  $ ipsetctl <command> --help
  $ ipsetctl types"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        help = "Path to the ipset executable (default: search PATH)",
        value_hint = ValueHint::ExecutablePath
    )]
    ipset: Option<PathBuf>,
    #[arg(
        long,
        value_name = "BYTES",
        help = "Largest chunk written to one `ipset restore` session (default: 65536)"
    )]
    max_restore_size: Option<usize>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FamilyCli {
    Inet,
    Inet6,
}

impl From<FamilyCli> for NetFamily {
    fn from(value: FamilyCli) -> Self {
        match value {
            FamilyCli::Inet => NetFamily::Inet,
            FamilyCli::Inet6 => NetFamily::Inet6,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Verify ipset is installed and at least v6")]
    Check,
    #[command(
        arg_required_else_help = true,
        about = "Create a set",
        after_help = r#"EXAMPLES
  $ ipsetctl create blocklist hash:ip --timeout 1h --hashsize 4096 --exist
  $ ipsetctl create ports bitmap:port --range 1-1024
  $ ipsetctl create nets hash:net --family inet6 --counters --comment"#
    )]
    Create {
        #[arg(help = "Set name")]
        name: String,
        #[arg(value_name = "TYPE", help = "Set type (see `ipsetctl types`)")]
        set_type: SetType,
        #[command(flatten)]
        modifiers: ModifierArgs,
    },
    #[command(arg_required_else_help = true, about = "Add an entry to a set")]
    Add {
        #[command(flatten)]
        target: EntryArgs,
        #[command(flatten)]
        modifiers: ModifierArgs,
    },
    #[command(arg_required_else_help = true, about = "Delete an entry from a set")]
    Del {
        #[command(flatten)]
        target: EntryArgs,
        #[command(flatten)]
        modifiers: ModifierArgs,
    },
    #[command(
        arg_required_else_help = true,
        about = "Test whether an entry is in a set",
        long_about = r#"Test whether an entry is in a set.

Prints {"present": true|false}. Exits 8 when the entry is absent."#
    )]
    Test {
        #[command(flatten)]
        target: EntryArgs,
    },
    #[command(arg_required_else_help = true, about = "Show a set's header and members as JSON")]
    List {
        #[command(flatten)]
        target: SetArgs,
        #[arg(long, help = "Print host names instead of addresses")]
        resolve: bool,
        #[arg(long, help = "Print the tool's output unparsed")]
        raw: bool,
    },
    #[command(arg_required_else_help = true, about = "Print a set in restorable form")]
    Save {
        #[command(flatten)]
        target: SetArgs,
        #[arg(long, help = "Print host names instead of addresses")]
        resolve: bool,
        #[arg(
            short = 'o',
            long = "output",
            value_name = "FILE",
            help = "Write to FILE (mode 0600) instead of stdout",
            value_hint = ValueHint::FilePath
        )]
        output: Option<PathBuf>,
    },
    #[command(
        arg_required_else_help = true,
        about = "Feed saved directives back into ipset",
        long_about = r#"Feed saved directives back into ipset.

Input is split on line boundaries into chunks no larger than --max-restore-size;
each chunk is one `ipset restore` session. The first failing chunk stops the stream."#
    )]
    Restore {
        #[arg(help = "Set name (used in error messages)")]
        name: String,
        #[arg(value_name = "TYPE", help = "Set type")]
        set_type: SetType,
        #[arg(
            short = 'f',
            long = "file",
            value_name = "FILE",
            help = "Read directives from FILE instead of stdin",
            value_hint = ValueHint::FilePath
        )]
        file: Option<PathBuf>,
        #[arg(long, help = "Ignore entries that already exist")]
        exist: bool,
    },
    #[command(about = "Flush one set, or every set when no name is given")]
    Flush {
        #[arg(help = "Set name")]
        name: Option<String>,
    },
    #[command(about = "Destroy one set, or every unreferenced set when no name is given")]
    Destroy {
        #[arg(help = "Set name")]
        name: Option<String>,
    },
    #[command(arg_required_else_help = true, about = "Rename a set")]
    Rename {
        #[arg(help = "Current set name")]
        from: String,
        #[arg(help = "New set name")]
        to: String,
    },
    #[command(arg_required_else_help = true, about = "Exchange the contents of two sets")]
    Swap {
        #[arg(help = "First set name")]
        from: String,
        #[arg(help = "Second set name")]
        to: String,
    },
    #[command(about = "List the supported set types")]
    Types,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        after_help = r#"EXAMPLES
  $ ipsetctl completion bash > ~/.local/share/bash-completion/completions/ipsetctl
  $ ipsetctl completion zsh > ~/.zfunc/_ipsetctl"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Args)]
struct SetArgs {
    #[arg(help = "Set name")]
    name: String,
    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        help = "Set type; selects type-specific modifiers (default: hash:ip)"
    )]
    set_type: Option<SetType>,
}

#[derive(Args)]
struct EntryArgs {
    #[command(flatten)]
    set: SetArgs,
    #[arg(help = "Entry, in the set type's syntax (e.g. 192.0.2.7 or 10.0.0.0/8,tcp:80)")]
    entry: String,
}

#[derive(Args, Default)]
struct ModifierArgs {
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, help = "Entry lifetime: seconds or a number plus ms|s|m|h")]
    timeout: Option<Duration>,
    #[arg(long, help = "Do not fail when the set or entry already exists (or is missing, for del)")]
    exist: bool,
    #[arg(long, help = "Enable per-entry packet and byte counters (create)")]
    counters: bool,
    #[arg(long, value_name = "N", help = "Initial packet counter (add)")]
    packets: Option<u64>,
    #[arg(long, value_name = "N", help = "Initial byte counter (add)")]
    bytes: Option<u64>,
    #[arg(long, help = "Enable per-entry comments (create)")]
    comment: bool,
    #[arg(long, value_name = "TEXT", help = "Comment stored with the entry (add)")]
    comment_content: Option<String>,
    #[arg(long, help = "Enable skb metadata extension (create)")]
    skbinfo: bool,
    #[arg(long, value_name = "MARK[/MASK]", help = "skb mark (add)")]
    skbmark: Option<String>,
    #[arg(long, value_name = "MAJOR:MINOR", help = "skb priority (add)")]
    skbprio: Option<String>,
    #[arg(long, value_name = "N", help = "skb queue (add)")]
    skbqueue: Option<u64>,
    #[arg(long, value_name = "N", help = "Initial hash size (create, hash types)")]
    hashsize: Option<u64>,
    #[arg(long, value_name = "N", help = "Maximum number of entries (create, hash types)")]
    maxelem: Option<u64>,
    #[arg(long, value_enum, help = "Address family (create, hash types except hash:mac)")]
    family: Option<FamilyCli>,
    #[arg(long, help = "Store the entry as an exception (add, net hash types)")]
    nomatch: bool,
    #[arg(long, help = "Evict a random entry when the set is full (create)")]
    forceadd: bool,
    #[arg(long, value_name = "CIDR", help = "Netmask applied to stored addresses (create, hash:ip/bitmap:ip)")]
    netmask: Option<u8>,
    #[arg(long, value_name = "MASK", help = "Mark mask (create, hash:ip,mark)")]
    markmask: Option<u32>,
    #[arg(long = "size", value_name = "N", help = "Maximum member count (create, list:set)")]
    list_size: Option<u64>,
    #[arg(long, value_name = "FROM-TO", help = "Address or port range (create, bitmap types)")]
    range: Option<String>,
}

impl ModifierArgs {
    fn into_modifiers(self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        if let Some(timeout) = self.timeout {
            modifiers.push(Modifier::Timeout(timeout));
        }
        let flags = [
            (self.exist, Modifier::Exist(true)),
            (self.counters, Modifier::Counters(true)),
            (self.comment, Modifier::Comment(true)),
            (self.skbinfo, Modifier::Skbinfo(true)),
            (self.nomatch, Modifier::Nomatch(true)),
            (self.forceadd, Modifier::Forceadd(true)),
        ];
        modifiers.extend(flags.into_iter().filter(|(on, _)| *on).map(|(_, m)| m));
        modifiers.extend(self.packets.map(Modifier::Packets));
        modifiers.extend(self.bytes.map(Modifier::Bytes));
        modifiers.extend(self.comment_content.map(Modifier::CommentContent));
        modifiers.extend(self.skbmark.map(Modifier::Skbmark));
        modifiers.extend(self.skbprio.map(Modifier::Skbprio));
        modifiers.extend(self.skbqueue.map(Modifier::Skbqueue));
        modifiers.extend(self.hashsize.map(Modifier::HashSize));
        modifiers.extend(self.maxelem.map(Modifier::MaxElem));
        modifiers.extend(self.family.map(|family| Modifier::Family(family.into())));
        modifiers.extend(self.netmask.map(Modifier::Netmask));
        modifiers.extend(self.markmask.map(Modifier::Markmask));
        modifiers.extend(self.list_size.map(Modifier::ListSize));
        // Address and port ranges share the `range` token; only one applies per set type.
        if let Some(range) = self.range {
            modifiers.push(Modifier::IpRange(range.clone()));
            modifiers.push(Modifier::PortRange(range));
        }
        modifiers
    }
}

const DEFAULT_SET_TYPE: SetType = SetType::HashIp;

fn parse_duration(input: &str) -> Result<Duration, Error> {
    let invalid = || {
        Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use seconds or a number plus ms|s|m|h (e.g. 600 or 10m).")
    };
    let trimmed = input.trim();
    let split = trimmed
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map(|(idx, _)| idx)
        .unwrap_or(trimmed.len());
    let (num_str, unit) = trimmed.split_at(split);
    if num_str.is_empty() {
        return Err(invalid());
    }
    let value: u64 = num_str.parse().map_err(|_| invalid())?;
    let millis = match unit {
        "ms" => value,
        "" | "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => return Err(invalid()),
    };
    Ok(Duration::from_millis(millis))
}

fn add_not_found_hint(err: Error) -> Error {
    if err.is_not_found() && err.hint().is_none() {
        return err.with_hint("Install the ipset package or pass --ipset <PATH>.");
    }
    err
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_raw(bytes: &[u8]) -> Result<(), Error> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(bytes)
        .and_then(|()| stdout.flush())
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to write stdout")
                .with_source(err)
        })
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Unsupported => "unsupported ipset version".to_string(),
        ErrorKind::Command => "ipset command failed".to_string(),
        ErrorKind::Parse => "unparseable ipset output".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    if rendered.contains("unknown set type") {
        return "Run `ipsetctl types` to list supported set types.".to_string();
    }
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `ipsetctl --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "ipsetctl") else {
        return "Try `ipsetctl --help`.".to_string();
    };

    let parts: Vec<&str> = tokens
        .iter()
        .skip(pos + 1)
        .take_while(|token| {
            !(token.starts_with('-') || token.starts_with('<') || token.starts_with('['))
        })
        .copied()
        .collect();

    if parts.is_empty() {
        return "Try `ipsetctl --help`.".to_string();
    }
    format!("Try `ipsetctl {} --help`.", parts.join(" "))
}
