//! Session text format.
//!
//! A whole editor session is persisted as one text blob: the startup
//! buffer in a `//====` block, then every other buffer in a `########`
//! block.
//!
//! ```text
//! //==============================================================================
//! // STARTUP_FILE: startup.py
//! //==============================================================================
//! <startup content>
//!
//! ################################################################################
//! ######## a.py
//! ################################################################################
//! <content of a.py>
//! ```
//!
//! [`write_session`] and [`parse_session`] are inverse for any content
//! that does not itself contain a block start (a rule line followed by a
//! `######## ` header line).

mod parser;
mod types;

pub use parser::parse_session;
pub use types::{ParsedSession, SessionSection};

/// Startup block delimiter: `//` and 78 `=`, 80 characters.
pub const STARTUP_RULE: &str =
    "//==============================================================================";
/// Prefix of the startup header line.
pub const STARTUP_HEADER_PREFIX: &str = "// STARTUP_FILE: ";
/// Regular block delimiter: 80 `#`.
pub const BLOCK_RULE: &str =
    "################################################################################";
/// Prefix of a regular block header line.
pub const BLOCK_HEADER_PREFIX: &str = "######## ";

/// Render a session.
///
/// `startup` is `(name, content)` of the startup buffer; `buffers` are the
/// remaining buffers in the order they should be restored.
pub fn write_session<N, C>(startup: (&str, &str), buffers: impl IntoIterator<Item = (N, C)>) -> String
where
    N: AsRef<str>,
    C: AsRef<str>,
{
    let (startup_name, startup_content) = startup;
    let mut out = String::with_capacity(startup_content.len() + 256);
    out.push_str(STARTUP_RULE);
    out.push('\n');
    out.push_str(STARTUP_HEADER_PREFIX);
    out.push_str(&header_name(startup_name));
    out.push('\n');
    out.push_str(STARTUP_RULE);
    out.push('\n');
    out.push_str(startup_content);
    out.push('\n');

    let mut first = true;
    for (name, content) in buffers {
        if first {
            out.push('\n');
            first = false;
        }
        out.push_str(BLOCK_RULE);
        out.push('\n');
        out.push_str(BLOCK_HEADER_PREFIX);
        out.push_str(&header_name(name.as_ref()));
        out.push('\n');
        out.push_str(BLOCK_RULE);
        out.push('\n');
        out.push_str(content.as_ref());
        out.push('\n');
    }
    out
}

/// Header names live on a single line.
fn header_name(name: &str) -> String {
    name.replace(['\r', '\n'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiters_are_eighty_characters() {
        assert_eq!(STARTUP_RULE.len(), 80);
        assert_eq!(STARTUP_RULE.matches('=').count(), 78);
        assert_eq!(BLOCK_RULE.len(), 80);
        assert!(BLOCK_RULE.chars().all(|c| c == '#'));
    }

    #[test]
    fn test_write_startup_only() {
        let text = write_session(("startup.py", "print(1)"), Vec::<(&str, &str)>::new());
        let expected = format!("{STARTUP_RULE}\n// STARTUP_FILE: startup.py\n{STARTUP_RULE}\nprint(1)\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn test_write_blocks_after_blank_line() {
        let text = write_session(("s.py", "s"), [("a.py", "x=1"), ("b.py", "y=2")]);
        let expected = format!(
            "{STARTUP_RULE}\n// STARTUP_FILE: s.py\n{STARTUP_RULE}\ns\n\n\
             {BLOCK_RULE}\n######## a.py\n{BLOCK_RULE}\nx=1\n\
             {BLOCK_RULE}\n######## b.py\n{BLOCK_RULE}\ny=2\n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_write_flattens_multiline_names() {
        let text = write_session(("s.py", ""), [("two\nlines", "")]);
        assert!(text.contains("######## two lines\n"));
    }
}
