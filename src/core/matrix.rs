//! Purpose: Action x set-type applicability matrix for every modifier category.
//! Exports: `Category`.
//! Role: Single source of truth for which modifiers the tool accepts per command.
//! Invariants: `Category::ALL` is the order in which the compiler emits flags.
//! Invariants: `is_applicable` is pure; it never depends on modifier values.
use crate::core::action::Action;
use crate::core::set_type::SetType;

const NOMATCH_TYPES: [SetType; 6] = [
    SetType::HashNet,
    SetType::HashNetNet,
    SetType::HashNetPort,
    SetType::HashIpPortNet,
    SetType::HashNetPortNet,
    SetType::HashNetIface,
];

const NETMASK_TYPES: [SetType; 2] = [SetType::BitmapIp, SetType::HashIp];

const IP_RANGE_TYPES: [SetType; 2] = [SetType::BitmapIp, SetType::BitmapIpMac];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Category {
    Timeout,
    Exist,
    Resolve,
    Counters,
    Packets,
    Bytes,
    CommentFlag,
    CommentContent,
    Skbinfo,
    Skbmark,
    Skbprio,
    Skbqueue,
    Nomatch,
    Forceadd,
    Family,
    HashSize,
    MaxElem,
    Netmask,
    Markmask,
    ListSize,
    IpRange,
    PortRange,
}

impl Category {
    pub const ALL: [Category; 22] = [
        Category::Timeout,
        Category::Exist,
        Category::Resolve,
        Category::Counters,
        Category::Packets,
        Category::Bytes,
        Category::CommentFlag,
        Category::CommentContent,
        Category::Skbinfo,
        Category::Skbmark,
        Category::Skbprio,
        Category::Skbqueue,
        Category::Nomatch,
        Category::Forceadd,
        Category::Family,
        Category::HashSize,
        Category::MaxElem,
        Category::Netmask,
        Category::Markmask,
        Category::ListSize,
        Category::IpRange,
        Category::PortRange,
    ];

    /// The token the tool expects for this category.
    pub fn flag(self) -> &'static str {
        match self {
            Category::Timeout => "timeout",
            Category::Exist => "-exist",
            Category::Resolve => "-resolve",
            Category::Counters => "counters",
            Category::Packets => "packets",
            Category::Bytes => "bytes",
            Category::CommentFlag | Category::CommentContent => "comment",
            Category::Skbinfo => "skbinfo",
            Category::Skbmark => "skbmark",
            Category::Skbprio => "skbprio",
            Category::Skbqueue => "skbqueue",
            Category::Nomatch => "nomatch",
            Category::Forceadd => "forceadd",
            Category::Family => "family",
            Category::HashSize => "hashsize",
            Category::MaxElem => "maxelem",
            Category::Netmask => "netmask",
            Category::Markmask => "markmask",
            Category::ListSize => "size",
            Category::IpRange | Category::PortRange => "range",
        }
    }

    pub fn is_applicable(self, action: Action, set_type: SetType) -> bool {
        self.admits(action, Some(set_type))
    }

    /// Applicability when the set type may be unknown (flush-all, swap, rename).
    ///
    /// Type-dependent categories never apply without a set type.
    pub fn admits(self, action: Action, set_type: Option<SetType>) -> bool {
        use Action::{Add, Create, Del, List, Save};

        let typed = |pred: fn(SetType) -> bool| set_type.is_some_and(pred);
        match self {
            Category::Exist => matches!(action, Create | Add | Del),
            Category::Timeout => matches!(action, Create | Add),
            Category::Resolve => matches!(action, List | Save),
            Category::Counters
            | Category::CommentFlag
            | Category::Skbinfo
            | Category::Forceadd => action == Create,
            Category::Packets
            | Category::Bytes
            | Category::CommentContent
            | Category::Skbmark
            | Category::Skbprio
            | Category::Skbqueue => action == Add,
            Category::Nomatch => action == Add && typed(|t| t.is_one_of(&NOMATCH_TYPES)),
            Category::Family => {
                action == Create && typed(|t| t.is_hash() && t != SetType::HashMac)
            }
            Category::HashSize | Category::MaxElem => action == Create && typed(SetType::is_hash),
            Category::Netmask => action == Create && typed(|t| t.is_one_of(&NETMASK_TYPES)),
            Category::Markmask => action == Create && typed(|t| t == SetType::HashIpMark),
            Category::ListSize => action == Create && typed(|t| t == SetType::ListSet),
            Category::IpRange => action == Create && typed(|t| t.is_one_of(&IP_RANGE_TYPES)),
            Category::PortRange => action == Create && typed(|t| t == SetType::BitmapPort),
        }
    }
}
