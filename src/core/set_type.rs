//! Purpose: Closed taxonomy of ipset storage-method/datatype combinations.
//! Exports: `SetType`.
//! Role: Pure data consulted by the applicability matrix; no I/O, no state.
//! Invariants: Exactly sixteen variants; `as_str` matches the tool's TYPENAME token.
//! Invariants: `FromStr` accepts only the exact tokens produced by `as_str`.
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::core::error::{Error, ErrorKind};

/// Storage method and datatypes of a set, spelled `method:datatype[,datatype...]`.
///
/// Bitmap and list types use fixed-size storage; hash types grow by chaining
/// and doubling. Entries added to a set must use the same comma-separated
/// datatype syntax as the type name, e.g. `ipaddr,portnum,ipaddr` for
/// `hash:ip,port,ip`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SetType {
    /// IPv4 host or network addresses from a bounded range (max 65536 entries).
    BitmapIp,
    /// IPv4 address plus MAC address pairs from a bounded range.
    BitmapIpMac,
    /// Port numbers from a bounded range.
    BitmapPort,
    HashIp,
    HashMac,
    HashIpMac,
    /// Network addresses of differing prefix sizes; supports `nomatch`.
    HashNet,
    HashNetNet,
    HashIpPort,
    HashNetPort,
    HashIpPortIp,
    HashIpPortNet,
    /// IP address plus packet mark; the only type that accepts `markmask`.
    HashIpMark,
    HashNetPortNet,
    HashNetIface,
    /// Union of other sets, matched in order.
    ListSet,
}

impl SetType {
    pub const ALL: [SetType; 16] = [
        SetType::BitmapIp,
        SetType::BitmapIpMac,
        SetType::BitmapPort,
        SetType::HashIp,
        SetType::HashMac,
        SetType::HashIpMac,
        SetType::HashNet,
        SetType::HashNetNet,
        SetType::HashIpPort,
        SetType::HashNetPort,
        SetType::HashIpPortIp,
        SetType::HashIpPortNet,
        SetType::HashIpMark,
        SetType::HashNetPortNet,
        SetType::HashNetIface,
        SetType::ListSet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SetType::BitmapIp => "bitmap:ip",
            SetType::BitmapIpMac => "bitmap:ip,mac",
            SetType::BitmapPort => "bitmap:port",
            SetType::HashIp => "hash:ip",
            SetType::HashMac => "hash:mac",
            SetType::HashIpMac => "hash:ip,mac",
            SetType::HashNet => "hash:net",
            SetType::HashNetNet => "hash:net,net",
            SetType::HashIpPort => "hash:ip,port",
            SetType::HashNetPort => "hash:net,port",
            SetType::HashIpPortIp => "hash:ip,port,ip",
            SetType::HashIpPortNet => "hash:ip,port,net",
            SetType::HashIpMark => "hash:ip,mark",
            SetType::HashNetPortNet => "hash:net,port,net",
            SetType::HashNetIface => "hash:net,iface",
            SetType::ListSet => "list:set",
        }
    }

    /// Storage method prefix test (`hash:`), independent of datatypes.
    pub fn is_hash(self) -> bool {
        self.as_str().starts_with("hash:")
    }

    pub fn is_one_of(self, candidates: &[SetType]) -> bool {
        candidates.contains(&self)
    }
}

impl fmt::Display for SetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SetType::ALL
            .into_iter()
            .find(|set_type| set_type.as_str() == value)
            .ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown set type: {value}"))
                    .with_hint("Run `ipsetctl types` to list supported set types.")
            })
    }
}

impl Serialize for SetType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
