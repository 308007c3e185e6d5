//! Purpose: Parse `ipset list` text into a structured record.
//! Exports: `Info`, `parse_info`.
//! Role: Pure parser; no I/O. Name and set type come from the caller.
//! Invariants: Numeric header fields come from the last space-delimited token.
//! Invariants: A malformed numeric field fails the whole parse.
//! Invariants: Every non-empty line after `Members:` is one opaque entry.
use serde::Serialize;

use crate::core::error::{Error, ErrorKind};
use crate::core::set_type::SetType;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Info {
    pub name: String,
    pub set_type: Option<SetType>,
    pub revision: u32,
    /// Create-time parameters as reported by the tool.
    pub header: String,
    pub size_in_memory: u64,
    pub references: u64,
    pub entries: Vec<String>,
}

const REVISION: &str = "Revision:";
const HEADER: &str = "Header:";
const SIZE_IN_MEMORY: &str = "Size in memory:";
const REFERENCES: &str = "References:";
const MEMBERS: &str = "Members:";

pub fn parse_info(out: &str) -> Result<Info, Error> {
    let mut info = Info::default();
    let mut lines = out.lines();

    for line in lines.by_ref() {
        if line.starts_with(REVISION) {
            info.revision = last_number(line)?;
        } else if let Some(header) = line.strip_prefix(HEADER) {
            info.header = header.strip_prefix(' ').unwrap_or(header).to_string();
        } else if line.starts_with(SIZE_IN_MEMORY) {
            info.size_in_memory = last_number(line)?;
        } else if line.starts_with(REFERENCES) {
            info.references = last_number(line)?;
        } else if line.starts_with(MEMBERS) {
            break;
        }
    }

    info.entries = lines
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    Ok(info)
}

fn last_number<T: std::str::FromStr>(line: &str) -> Result<T, Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let token = line.rsplit(' ').next().unwrap_or(line).trim();
    token.parse().map_err(|err| {
        Error::new(ErrorKind::Parse)
            .with_message(format!("invalid number in list output: {line:?}"))
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::parse_info;
    use crate::core::error::ErrorKind;

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

    #[test]
    fn parses_header_fields_and_members() {
        let info = parse_info(LIST_INFO).expect("parse");
        assert_eq!(info.revision, 4);
        assert_eq!(info.header, "family inet hashsize 1024 maxelem 65536");
        assert_eq!(info.size_in_memory, 168);
        assert_eq!(info.references, 0);
        assert_eq!(info.entries, vec!["1.1.1.1"]);
        assert!(info.name.is_empty());
        assert!(info.set_type.is_none());
    }

    #[test]
    fn entries_keep_extensions_verbatim() {
        let out = "Revision: 4\nMembers:\n1.1.1.3 timeout 3599\n\n1.1.1.2 timeout 3599\n\n";
        let info = parse_info(out).expect("parse");
        assert_eq!(info.entries, vec!["1.1.1.3 timeout 3599", "1.1.1.2 timeout 3599"]);
    }

    #[test]
    fn missing_fields_stay_zero() {
        let info = parse_info("Name: foo\nType: hash:ip\n").expect("parse");
        assert_eq!(info.revision, 0);
        assert!(info.header.is_empty());
        assert!(info.entries.is_empty());
    }

    #[test]
    fn malformed_number_is_parse_error() {
        let err = parse_info("Revision: four\nMembers:\n").expect_err("bad revision");
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = parse_info("Size in memory: 1k\n").expect_err("bad size");
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn lines_after_members_are_not_headers() {
        let out = "Members:\nRevision: 9\nReferences: x\n";
        let info = parse_info(out).expect("parse");
        assert_eq!(info.revision, 0);
        assert_eq!(info.entries, vec!["Revision: 9", "References: x"]);
    }
}
