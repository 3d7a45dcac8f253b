use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::PatchError;

lazy_static! {
    /// Normal-diff command line: `L1[,L2](a|c|d)L3[,L4]`.
    pub(crate) static ref NORMAL_CMD_REGEX: Regex =
        Regex::new(r"^(\d+)(?:,(\d+))?([acd])(\d+)(?:,(\d+))?[ \t]*\r?\n").unwrap();
    /// Ed command line: `[addr](a|i|c|d|s/.//)` or `addr,addr(c|d|s/.//)`.
    static ref ED_CMD_REGEX: Regex =
        Regex::new(r"^(?:(?:\d+)?([aicd]|s/.//)|\d+,\d+([cd]|s/.//))[ \t]*\r?\n").unwrap();
    /// Git extended header: `index OLDHASH..NEWHASH [mode]`.
    pub(crate) static ref GIT_INDEX_REGEX: Regex =
        Regex::new(r"^[0-9a-f]+\.\.[0-9a-f]+(?:\s+(.*))?$").unwrap();
    static ref C_STRING_REGEX: Regex = Regex::new(r#"^("(?:\\.|[^"\\])*")(.*)"#).unwrap();
    static ref TAB_TERMINATED_REGEX: Regex = Regex::new(r"^([^\t]*)\t(.*)").unwrap();
    static ref NAME_SPLIT_REGEX: Regex = Regex::new(r"^(\S*)\s*(.*)").unwrap();
}

/// Expand the escape sequences of a C string body (quotes excluded).
///
/// Supported escapes are `\octal` (1-3 digits) and `\xHEX` (any length),
/// both masked to 8 bits, plus `\a \b \f \n \r \t \v \\ \"`.
pub fn unescape_c_string(body: &str) -> Result<String, PatchError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(digit @ '0'..='7') => {
                let mut value = digit as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&next @ '0'..='7') => {
                            value = value * 8 + (next as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(char::from((value & 0xff) as u8));
            }
            Some('x') => {
                let mut digits = String::new();
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_hexdigit() {
                        break;
                    }
                    digits.push(next);
                    chars.next();
                }
                if digits.is_empty() {
                    return Err(PatchError::MalformedEscape {
                        seq: "x".to_string(),
                    });
                }
                // Masked to 8 bits, so only the last two digits survive.
                let tail = &digits[digits.len().saturating_sub(2)..];
                let value = u8::from_str_radix(tail, 16).unwrap();
                out.push(char::from(value));
            }
            Some(other) => {
                let expanded = match other {
                    'a' => '\x07',
                    'b' => '\x08',
                    'f' => '\x0c',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    'v' => '\x0b',
                    '\\' => '\\',
                    '"' => '"',
                    _ => {
                        return Err(PatchError::MalformedEscape {
                            seq: other.to_string(),
                        })
                    }
                };
                out.push(expanded);
            }
            None => {
                return Err(PatchError::MalformedEscape { seq: String::new() });
            }
        }
    }
    Ok(out)
}

/// Given input like `"quoted \"name\"" rest`, return the unquoted name and
/// the remainder of the line. An unterminated string or a bad escape yields
/// no name and the input unconsumed.
pub fn parse_c_name(spec: &str) -> (Option<String>, String) {
    let caps = match C_STRING_REGEX.captures(spec) {
        Some(caps) => caps,
        None => return (None, spec.to_string()),
    };
    let quoted = &caps[1];
    match unescape_c_string(&quoted[1..quoted.len() - 1]) {
        Ok(name) => (Some(name), caps[2].to_string()),
        Err(_) => (None, spec.to_string()),
    }
}

/// Split a header suffix like `path\ttimestamp` (or `"quoted" timestamp`)
/// into the filename and the remainder. With `tabterm`, a tab ends the name
/// and trailing spaces are trimmed from it; otherwise the first whitespace
/// run ends the name.
pub fn parse_name(spec: &str, tabterm: bool) -> (Option<String>, String) {
    let spec = spec.trim_start();
    if spec.starts_with('"') {
        return parse_c_name(spec);
    }
    if tabterm {
        if let Some(caps) = TAB_TERMINATED_REGEX.captures(spec) {
            return (Some(caps[1].trim_end().to_string()), caps[2].to_string());
        }
    }
    let caps = NAME_SPLIT_REGEX.captures(spec).unwrap();
    (Some(caps[1].to_string()), caps[2].to_string())
}

/// Parse an octal file mode such as "100644". Anything unparseable is 0.
pub fn fetchmode(spec: &str) -> u32 {
    u32::from_str_radix(spec.trim(), 8).unwrap_or(0)
}

/// Given a line like "5,7c" or "3a" or "12s/.//", return the ed command
/// letter, with the substitute form reported as 's'.
pub fn ed_command(line: &str) -> Option<char> {
    let caps = ED_CMD_REGEX.captures(line)?;
    let letter = caps.get(1).or_else(|| caps.get(2))?;
    letter.as_str().chars().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("755", 0o755)]
    #[case("100644", 0o100644)]
    #[case(" 644\n", 0o644)]
    #[case("garbage", 0)]
    #[case("", 0)]
    #[case("778", 0)]
    fn test_fetchmode(#[case] spec: &str, #[case] expected: u32) {
        assert_eq!(fetchmode(spec), expected);
    }

    #[rstest]
    #[case("3a\n", Some('a'))]
    #[case("12i\n", Some('i'))]
    #[case("5,7c\n", Some('c'))]
    #[case("5,7d \t\r\n", Some('d'))]
    #[case("d\n", Some('d'))]
    #[case("12s/.//\n", Some('s'))]
    #[case("5,7s/.//\n", Some('s'))]
    #[case("5,7a\n", None)]
    #[case("3x\n", None)]
    #[case("foo\n", None)]
    #[case(".\n", None)]
    fn test_ed_command(#[case] line: &str, #[case] expected: Option<char>) {
        assert_eq!(ed_command(line), expected);
    }

    #[test]
    fn test_normal_cmd_regex() {
        let caps = NORMAL_CMD_REGEX.captures("2,3c2,3\n").unwrap();
        assert_eq!(&caps[1], "2");
        assert_eq!(&caps[2], "3");
        assert_eq!(&caps[3], "c");
        assert!(NORMAL_CMD_REGEX.is_match("5d4\r\n"));
        assert!(NORMAL_CMD_REGEX.is_match("0a1,3 \n"));
        assert!(!NORMAL_CMD_REGEX.is_match("2,3e2\n"));
        assert!(!NORMAL_CMD_REGEX.is_match("2,3c2,3 trailing\n"));
    }

    #[test]
    fn test_parse_name_tab_terminated() {
        let (name, rest) = parse_name("a file \t2020-01-01 00:00:00\n", true);
        assert_eq!(name.as_deref(), Some("a file"));
        assert_eq!(rest, "2020-01-01 00:00:00");
    }

    #[test]
    fn test_parse_name_whitespace_split() {
        let (name, rest) = parse_name("src/lib.rs 2020-01-01\n", false);
        assert_eq!(name.as_deref(), Some("src/lib.rs"));
        assert_eq!(rest, "2020-01-01");
    }

    #[test]
    fn test_parse_name_without_timestamp() {
        let (name, rest) = parse_name("src/lib.rs\n", false);
        assert_eq!(name.as_deref(), Some("src/lib.rs"));
        assert_eq!(rest, "");
    }

    #[rstest]
    #[case(r#"\t"#, "\t")]
    #[case(r#"\n"#, "\n")]
    #[case(r#"\\"#, "\\")]
    #[case(r#"\""#, "\"")]
    #[case(r#"\101\102"#, "AB")]
    #[case(r#"\7"#, "\x07")]
    #[case(r#"\x41"#, "A")]
    #[case(r#"\x000041"#, "A")]
    #[case(r#"\377"#, "\u{ff}")]
    fn test_unescape_c_string(#[case] body: &str, #[case] expected: &str) {
        assert_eq!(unescape_c_string(body).unwrap(), expected);
    }

    #[test]
    fn test_unescape_rejects_unknown_escape() {
        assert!(matches!(
            unescape_c_string(r#"\q"#),
            Err(PatchError::MalformedEscape { .. })
        ));
        assert!(matches!(
            unescape_c_string(r#"\x"#),
            Err(PatchError::MalformedEscape { .. })
        ));
    }

    #[test]
    fn test_parse_c_name() {
        let (name, rest) = parse_c_name(r#""with\tspace" 2020-01-01"#);
        assert_eq!(name.as_deref(), Some("with\tspace"));
        assert_eq!(rest, " 2020-01-01");
    }

    #[test]
    fn test_parse_c_name_degrades_on_bad_escape() {
        let (name, rest) = parse_c_name(r#""bad\qescape" rest"#);
        assert_eq!(name, None);
        assert_eq!(rest, r#""bad\qescape" rest"#);
    }

    #[test]
    fn test_parse_c_name_unterminated() {
        let (name, rest) = parse_c_name(r#""never closed"#);
        assert_eq!(name, None);
        assert_eq!(rest, r#""never closed"#);
    }

    #[test]
    fn test_git_index_regex() {
        let caps = GIT_INDEX_REGEX.captures("d00491f..0cfbf08 100644").unwrap();
        assert_eq!(caps.get(1).map(|m| m.as_str()), Some("100644"));
        assert!(GIT_INDEX_REGEX.is_match("d00491f..0cfbf08"));
        assert!(!GIT_INDEX_REGEX.is_match("d00491f 0cfbf08"));
    }
}
