//! Purpose: Compile a command descriptor plus modifier set into tool arguments.
//! Exports: `compile`, `compile_modifiers`.
//! Role: Pure translation layer between typed requests and the ipset argv.
//! Invariants: Positional tokens precede every flag.
//! Invariants: Flags follow `Category::ALL` order; output is deterministic.
//! Invariants: Unset or inapplicable modifiers contribute nothing (no error).
use crate::core::command::CommandDescriptor;
use crate::core::matrix::Category;
use crate::core::modifier::ModifierSet;

enum Emit {
    Skip,
    Flag,
    Value(String),
}

fn emission(category: Category, modifiers: &ModifierSet) -> Emit {
    fn flag(on: bool) -> Emit {
        if on { Emit::Flag } else { Emit::Skip }
    }
    fn number(value: u64) -> Emit {
        if value == 0 {
            Emit::Skip
        } else {
            Emit::Value(value.to_string())
        }
    }
    fn text(value: &str) -> Emit {
        if value.is_empty() {
            Emit::Skip
        } else {
            Emit::Value(value.to_string())
        }
    }

    match category {
        Category::Timeout => {
            if modifiers.timeout().is_zero() {
                Emit::Skip
            } else {
                Emit::Value(modifiers.timeout().as_secs().to_string())
            }
        }
        Category::Exist => flag(modifiers.exist()),
        Category::Resolve => flag(modifiers.resolve()),
        Category::Counters => flag(modifiers.counters()),
        Category::Packets => number(modifiers.packets()),
        Category::Bytes => number(modifiers.bytes()),
        Category::CommentFlag => flag(modifiers.comment()),
        Category::CommentContent => text(modifiers.comment_content()),
        Category::Skbinfo => flag(modifiers.skbinfo()),
        Category::Skbmark => text(modifiers.skbmark()),
        Category::Skbprio => text(modifiers.skbprio()),
        Category::Skbqueue => number(modifiers.skbqueue()),
        Category::Nomatch => flag(modifiers.nomatch()),
        Category::Forceadd => flag(modifiers.forceadd()),
        Category::Family => match modifiers.family() {
            Some(family) => Emit::Value(family.as_str().to_string()),
            None => Emit::Skip,
        },
        Category::HashSize => number(modifiers.hash_size()),
        Category::MaxElem => number(modifiers.max_elem()),
        Category::Netmask => number(u64::from(modifiers.netmask())),
        Category::Markmask => number(u64::from(modifiers.markmask())),
        Category::ListSize => number(modifiers.list_size()),
        Category::IpRange => text(modifiers.ip_range()),
        Category::PortRange => text(modifiers.port_range()),
    }
}

/// Append the modifier flags legal for `cmd` onto `args`.
///
/// A descriptor without a set type admits only the action-dependent categories.
pub fn compile_modifiers(cmd: &CommandDescriptor, modifiers: &ModifierSet, args: &mut Vec<String>) {
    for category in Category::ALL {
        if !category.admits(cmd.action(), cmd.set_type()) {
            continue;
        }
        match emission(category, modifiers) {
            Emit::Skip => {}
            Emit::Flag => args.push(category.flag().to_string()),
            Emit::Value(value) => {
                args.push(category.flag().to_string());
                args.push(value);
            }
        }
    }
}

/// Full argument vector: positional tokens followed by applicable flags.
pub fn compile(cmd: &CommandDescriptor, modifiers: &ModifierSet) -> Vec<String> {
    let mut args = cmd.positional();
    compile_modifiers(cmd, modifiers, &mut args);
    args
}
