//! Strips shell metacharacters from user-supplied directory arguments.
//!
//! This is a denylist, not shell escaping: the rendered command is still run
//! as a single shell line.

/// Substrings removed from every directory argument.
pub const BANISHED_TOKENS: [&str; 10] = [";", "&", "|", "[", "]", "{", "}", "(", ")", ".."];

/// Parent-directory segments, removed together with their separator so that
/// `../secret` becomes `secret` rather than the absolute `/secret`.
const PARENT_SEGMENTS: [&str; 2] = ["../", "..\\"];

/// Removes every occurrence of each banished token, keeping length and order.
pub fn sanitize_args<S: AsRef<str>>(raw_args: &[S]) -> Vec<String> {
    raw_args
        .iter()
        .map(|raw_arg| sanitize_arg(raw_arg.as_ref()))
        .collect()
}

/// Removes banished tokens from one argument.
///
/// Repeats until nothing changes, since deleting one token can join its
/// neighbours into another (`.;.` becomes `..`).
pub fn sanitize_arg(raw_arg: &str) -> String {
    let mut clean = raw_arg.to_string();
    loop {
        let before = clean.len();
        for token in PARENT_SEGMENTS.iter().chain(BANISHED_TOKENS.iter()) {
            clean = clean.replace(token, "");
        }
        if clean.len() == before {
            return clean;
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("./app; rm -rf /", "./app rm -rf /")]
    #[case("a&&b", "ab")]
    #[case("a|b|c", "abc")]
    #[case("[x][y]", "xy")]
    #[case("{a}{b}", "ab")]
    #[case("$(whoami)", "$whoami")]
    #[case("../secret", "secret")]
    #[case("../../etc", "etc")]
    #[case("public/../private", "public/private")]
    #[case("..\\windows", "windows")]
    #[case("trailing..", "trailing")]
    #[case("./public", "./public")]
    fn removes_every_occurrence(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_arg(raw), expected);
    }

    #[test]
    fn removes_tokens_formed_by_earlier_removals() {
        assert_eq!(sanitize_arg(".;."), "");
        assert_eq!(sanitize_arg("..(.)."), "");
    }

    #[test]
    fn no_banished_token_survives() {
        let inputs = [
            "a;b;c;d",
            "x&y&z",
            "((nested))",
            "....//....",
            "{[(;&|..|&;)]}",
            "..;..;..",
        ];

        for input in inputs {
            let clean = sanitize_arg(input);
            for token in PARENT_SEGMENTS.iter().chain(BANISHED_TOKENS.iter()) {
                assert!(
                    !clean.contains(token),
                    "{token:?} survived in {clean:?} (from {input:?})"
                );
            }
        }
    }

    #[test]
    fn keeps_length_and_order() {
        let raw = ["./b", "x;y", "./a"];
        assert_eq!(sanitize_args(&raw), vec!["./b", "xy", "./a"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let raw: [&str; 0] = [];
        assert!(sanitize_args(&raw).is_empty());
    }
}
