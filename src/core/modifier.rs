//! Purpose: Optional command parameters and the mutable bag they are applied onto.
//! Exports: `Modifier`, `ModifierSet`, `NetFamily`.
//! Role: Caller-facing vocabulary for timeout, counters, comments, sizing, and ranges.
//! Invariants: Each field has an unset sentinel (zero, empty, false, `None`).
//! Invariants: Applying a modifier overwrites the field (last write wins).
//! Invariants: `reset` returns every field to its sentinel and keeps string capacity.
//! Invariants: Values are not range-checked here; the tool reports rejections.
use std::fmt;
use std::time::Duration;

/// Protocol family of the addresses stored in a hash set.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NetFamily {
    Inet,
    Inet6,
}

impl NetFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            NetFamily::Inet => "inet",
            NetFamily::Inet6 => "inet6",
        }
    }
}

impl fmt::Display for NetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single optional parameter for an ipset command.
///
/// Modifiers that do not apply to the command they are passed to are dropped
/// when the command is compiled; see [`crate::core::matrix`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Modifier {
    /// Default entry timeout on `create`, per-entry timeout on `add`.
    ///
    /// Emitted in whole seconds. Zero means permanent and emits nothing.
    /// The tool caps the value at 2147483 seconds.
    Timeout(Duration),
    /// `-exist`: ignore already-created sets, already-added or missing entries.
    Exist(bool),
    /// `-resolve`: print host names instead of addresses when listing.
    Resolve(bool),
    /// Create the set with per-entry packet and byte counters.
    Counters(bool),
    /// Initial packet counter of an added entry.
    Packets(u64),
    /// Initial byte counter of an added entry.
    Bytes(u64),
    /// Create the set with the comment extension.
    Comment(bool),
    /// Comment text of an added entry. Must not contain quotation marks.
    CommentContent(String),
    /// Create the set with the skbinfo extension.
    Skbinfo(bool),
    /// `MARK` or `MARK/MASK`, 32-bit hex with `0x` prefix.
    Skbmark(String),
    /// tc class `MAJOR:MINOR`, hex without prefix.
    Skbprio(String),
    Skbqueue(u64),
    /// Initial hash size; the kernel rounds up to a power of two.
    HashSize(u64),
    MaxElem(u64),
    Family(NetFamily),
    /// Mark an added net entry as an exception.
    Nomatch(bool),
    /// Evict a random entry when the set is full instead of failing.
    Forceadd(bool),
    /// CIDR prefix stored instead of host addresses.
    Netmask(u8),
    Markmask(u32),
    ListSize(u64),
    /// `fromip-toip` or `ip/cidr` for bitmap ip types.
    IpRange(String),
    /// `fromport-toport` for `bitmap:port`.
    PortRange(String),
}

impl Modifier {
    pub fn apply_to(&self, set: &mut ModifierSet) {
        match self {
            Modifier::Timeout(timeout) => set.timeout = *timeout,
            Modifier::Exist(exist) => set.exist = *exist,
            Modifier::Resolve(resolve) => set.resolve = *resolve,
            Modifier::Counters(counters) => set.counters = *counters,
            Modifier::Packets(packets) => set.packets = *packets,
            Modifier::Bytes(bytes) => set.bytes = *bytes,
            Modifier::Comment(comment) => set.comment = *comment,
            Modifier::CommentContent(content) => set.comment_content.clone_from(content),
            Modifier::Skbinfo(skbinfo) => set.skbinfo = *skbinfo,
            Modifier::Skbmark(mark) => set.skbmark.clone_from(mark),
            Modifier::Skbprio(prio) => set.skbprio.clone_from(prio),
            Modifier::Skbqueue(queue) => set.skbqueue = *queue,
            Modifier::HashSize(size) => set.hash_size = *size,
            Modifier::MaxElem(max) => set.max_elem = *max,
            Modifier::Family(family) => set.family = Some(*family),
            Modifier::Nomatch(nomatch) => set.nomatch = *nomatch,
            Modifier::Forceadd(forceadd) => set.forceadd = *forceadd,
            Modifier::Netmask(netmask) => set.netmask = *netmask,
            Modifier::Markmask(markmask) => set.markmask = *markmask,
            Modifier::ListSize(size) => set.list_size = *size,
            Modifier::IpRange(range) => set.ip_range.clone_from(range),
            Modifier::PortRange(range) => set.port_range.clone_from(range),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ModifierSet {
    timeout: Duration,
    exist: bool,
    resolve: bool,
    counters: bool,
    packets: u64,
    bytes: u64,
    comment: bool,
    comment_content: String,
    skbinfo: bool,
    skbmark: String,
    skbprio: String,
    skbqueue: u64,
    hash_size: u64,
    max_elem: u64,
    family: Option<NetFamily>,
    nomatch: bool,
    forceadd: bool,
    netmask: u8,
    markmask: u32,
    list_size: u64,
    ip_range: String,
    port_range: String,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, modifiers: &[Modifier]) -> &mut Self {
        for modifier in modifiers {
            modifier.apply_to(self);
        }
        self
    }

    pub fn reset(&mut self) {
        let ModifierSet {
            timeout,
            exist,
            resolve,
            counters,
            packets,
            bytes,
            comment,
            comment_content,
            skbinfo,
            skbmark,
            skbprio,
            skbqueue,
            hash_size,
            max_elem,
            family,
            nomatch,
            forceadd,
            netmask,
            markmask,
            list_size,
            ip_range,
            port_range,
        } = self;
        *timeout = Duration::ZERO;
        *exist = false;
        *resolve = false;
        *counters = false;
        *packets = 0;
        *bytes = 0;
        *comment = false;
        comment_content.clear();
        *skbinfo = false;
        skbmark.clear();
        skbprio.clear();
        *skbqueue = 0;
        *hash_size = 0;
        *max_elem = 0;
        *family = None;
        *nomatch = false;
        *forceadd = false;
        *netmask = 0;
        *markmask = 0;
        *list_size = 0;
        ip_range.clear();
        port_range.clear();
    }

    /// True when every field holds its unset sentinel.
    pub fn is_unset(&self) -> bool {
        *self == ModifierSet::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn exist(&self) -> bool {
        self.exist
    }

    pub fn resolve(&self) -> bool {
        self.resolve
    }

    pub fn counters(&self) -> bool {
        self.counters
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn comment(&self) -> bool {
        self.comment
    }

    pub fn comment_content(&self) -> &str {
        &self.comment_content
    }

    pub fn skbinfo(&self) -> bool {
        self.skbinfo
    }

    pub fn skbmark(&self) -> &str {
        &self.skbmark
    }

    pub fn skbprio(&self) -> &str {
        &self.skbprio
    }

    pub fn skbqueue(&self) -> u64 {
        self.skbqueue
    }

    pub fn hash_size(&self) -> u64 {
        self.hash_size
    }

    pub fn max_elem(&self) -> u64 {
        self.max_elem
    }

    pub fn family(&self) -> Option<NetFamily> {
        self.family
    }

    pub fn nomatch(&self) -> bool {
        self.nomatch
    }

    pub fn forceadd(&self) -> bool {
        self.forceadd
    }

    pub fn netmask(&self) -> u8 {
        self.netmask
    }

    pub fn markmask(&self) -> u32 {
        self.markmask
    }

    pub fn list_size(&self) -> u64 {
        self.list_size
    }

    pub fn ip_range(&self) -> &str {
        &self.ip_range
    }

    pub fn port_range(&self) -> &str {
        &self.port_range
    }
}
