//! Purpose: Extract the tool's major version from `ipset version` output.
//! Exports: `major_version`, `MIN_SUPPORTED_MAJOR`.
//! Invariants: Only a `v<digits>.` token counts; anything else yields 0.
pub const MIN_SUPPORTED_MAJOR: u32 = 6;

pub fn major_version(out: &[u8]) -> u32 {
    for (idx, _) in out.iter().enumerate().filter(|(_, byte)| **byte == b'v') {
        let digits = out[idx + 1..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        if digits == 0 || out.get(idx + 1 + digits) != Some(&b'.') {
            continue;
        }
        let parsed = std::str::from_utf8(&out[idx + 1..idx + 1 + digits])
            .ok()
            .and_then(|text| text.parse().ok());
        if let Some(major) = parsed {
            return major;
        }
    }
    0
}
