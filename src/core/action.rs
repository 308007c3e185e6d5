//! Purpose: The eleven ipset command verbs.
//! Exports: `Action`.
//! Role: Identity of a command; drives positional arity and output capture.
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    Create,
    Add,
    Del,
    Test,
    Destroy,
    List,
    Save,
    Restore,
    Flush,
    Rename,
    Swap,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::Create,
        Action::Add,
        Action::Del,
        Action::Test,
        Action::Destroy,
        Action::List,
        Action::Save,
        Action::Restore,
        Action::Flush,
        Action::Rename,
        Action::Swap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Add => "add",
            Action::Del => "del",
            Action::Test => "test",
            Action::Destroy => "destroy",
            Action::List => "list",
            Action::Save => "save",
            Action::Restore => "restore",
            Action::Flush => "flush",
            Action::Rename => "rename",
            Action::Swap => "swap",
        }
    }

    /// Whether the set name is followed by a second positional (entry or set name).
    ///
    /// `list`, `save`, `destroy` and `flush` take the set name alone.
    pub fn takes_entry(self) -> bool {
        !matches!(
            self,
            Action::List | Action::Save | Action::Destroy | Action::Flush
        )
    }

    /// Whether the tool's output is the product of the command.
    pub fn captures_output(self) -> bool {
        matches!(self, Action::List | Action::Save)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Action;

    #[test]
    fn two_argument_actions() {
        let two_args: Vec<_> = Action::ALL
            .into_iter()
            .filter(|action| !action.takes_entry())
            .collect();
        assert_eq!(
            two_args,
            vec![Action::Destroy, Action::List, Action::Save, Action::Flush]
        );
    }

    #[test]
    fn only_listing_actions_capture_output() {
        for action in Action::ALL {
            assert_eq!(
                action.captures_output(),
                action == Action::List || action == Action::Save
            );
        }
    }
}
