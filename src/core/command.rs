//! Purpose: Bind one ipset invocation's verb, target, entry, and set type.
//! Exports: `CommandDescriptor`, `ERROR_PREFIX`.
//! Role: Unit handed to the compiler and the executor; owns captured output.
//! Invariants: An empty name means "all sets" (only meaningful for flush/destroy).
//! Invariants: `reset` clears every field so a pooled descriptor carries no state.
use crate::core::action::Action;
use crate::core::set_type::SetType;

/// Leading token of every failure message produced for a tool invocation.
pub const ERROR_PREFIX: &str = "ipset";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandDescriptor {
    action: Action,
    name: String,
    entry: Option<String>,
    set_type: Option<SetType>,
    out: Vec<u8>,
}

impl Default for CommandDescriptor {
    fn default() -> Self {
        Self {
            action: Action::List,
            name: String::new(),
            entry: None,
            set_type: None,
            out: Vec::new(),
        }
    }
}

impl CommandDescriptor {
    pub fn new(action: Action, name: impl Into<String>) -> Self {
        Self {
            action,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn with_set_type(mut self, set_type: SetType) -> Self {
        self.set_type = Some(set_type);
        self
    }

    /// Rebind a pooled descriptor, reusing its string allocations.
    pub fn bind(
        &mut self,
        action: Action,
        name: &str,
        set_type: Option<SetType>,
        entry: Option<&str>,
    ) {
        self.action = action;
        self.name.clear();
        self.name.push_str(name);
        self.set_type = set_type;
        match (entry, self.entry.as_mut()) {
            (Some(entry), Some(slot)) => {
                slot.clear();
                slot.push_str(entry);
            }
            (Some(entry), None) => self.entry = Some(entry.to_string()),
            (None, _) => self.entry = None,
        }
    }

    pub fn reset(&mut self) {
        self.action = Action::List;
        self.name.clear();
        self.entry = None;
        self.set_type = None;
        self.out.clear();
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }

    pub fn set_type(&self) -> Option<SetType> {
        self.set_type
    }

    pub fn output(&self) -> &[u8] {
        &self.out
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    pub(crate) fn capture(&mut self, output: &[u8]) {
        self.out.extend_from_slice(output);
    }

    /// Second positional token: the set type for `create`, otherwise the entry.
    fn second(&self) -> &str {
        match (self.action, self.set_type) {
            (Action::Create, Some(set_type)) => set_type.as_str(),
            _ => self.entry.as_deref().unwrap_or_default(),
        }
    }

    /// Positional tokens: verb, then name, then the second token when the verb takes one.
    pub fn positional(&self) -> Vec<String> {
        let mut args = vec![self.action.as_str().to_string()];
        if !self.name.is_empty() {
            args.push(self.name.clone());
            if self.action.takes_entry() {
                args.push(self.second().to_string());
            }
        }
        args
    }

    /// Failure text in the shape callers parse: `ipset: can't <what>: <output>`.
    pub fn failure_message(&self, output: &str) -> String {
        let entry = self.second();
        if self.name.is_empty() {
            return format!("{ERROR_PREFIX}: can't {} all set: {output}", self.action);
        }
        match self.action {
            Action::Swap => format!(
                "{ERROR_PREFIX}: can't swap from {} to {entry}: {output}",
                self.name
            ),
            action if action.takes_entry() => format!(
                "{ERROR_PREFIX}: can't {action} {} {entry}: {output}",
                self.name
            ),
            action => format!("{ERROR_PREFIX}: can't {action} {}: {output}", self.name),
        }
    }
}
