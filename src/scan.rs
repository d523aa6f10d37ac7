//! Line-oriented scanning primitives.
//!
//! Every detector in this crate works over plain text lines rather than a
//! parse tree. The primitives here delimit logical blocks by brace balance,
//! skip blank and comment lines, and count braces with awareness of
//! double-quoted string literals and `//` line comments.
//!
//! Known approximation: multi-line string literals (`"""`), block comments
//! (`/* */`) and character escapes spanning lines are not tracked, so a brace
//! inside one of those is still counted. This is a deliberate limitation of
//! the line-based heuristic, not a bug.

/// True for lines that are empty or whitespace-only.
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// True for lines that are pure `//` comments.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

/// True for lines a counting pass should ignore entirely.
pub fn is_skippable(line: &str) -> bool {
    is_blank(line) || is_comment(line)
}

/// Net brace balance of a line: count of `{` minus count of `}`.
///
/// Braces inside double-quoted string literals are not counted, and counting
/// stops at a `//` line comment outside a string.
pub fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut prev = '\0';

    for ch in line.chars() {
        if escaped {
            escaped = false;
            prev = ch;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '/' if !in_string && prev == '/' => {
                // Line comment: the preceding '/' contributed nothing.
                return delta;
            }
            '{' if !in_string => delta += 1,
            '}' if !in_string => delta -= 1,
            _ => {}
        }
        prev = ch;
    }

    delta
}

/// Count occurrences of `}` in a line, with the same string/comment rules as
/// [`brace_delta`].
pub fn closing_braces(line: &str) -> usize {
    let mut count = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut prev = '\0';

    for ch in line.chars() {
        if escaped {
            escaped = false;
            prev = ch;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '/' if !in_string && prev == '/' => return count,
            '}' if !in_string => count += 1,
            _ => {}
        }
        prev = ch;
    }

    count
}

/// A heuristically extracted code block (function or closure body).
#[derive(Debug, Clone)]
pub struct Block {
    /// The block's lines, including the terminating close-brace line.
    pub lines: Vec<String>,
    /// 1-based line number of the first line in `lines`.
    pub start_line: usize,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Extract the block opened on the trigger line at `trigger_idx` (0-based).
///
/// The balance is seeded from the trigger line itself, then lines after it
/// are accumulated while the running balance has gone positive at least
/// once; the first line on which the cumulative balance returns to `<= 0` is
/// included and terminates the block. If the balance never closes, the block
/// runs to the end of input.
pub fn extract_block(lines: &[&str], trigger_idx: usize) -> Block {
    let mut balance = brace_delta(lines[trigger_idx]);
    let mut went_positive = balance > 0;
    let mut collected = Vec::new();
    let start_line = trigger_idx + 2; // 1-based, first line after the trigger

    for line in lines.iter().skip(trigger_idx + 1) {
        collected.push((*line).to_string());
        balance += brace_delta(line);
        if balance > 0 {
            went_positive = true;
        }
        if went_positive && balance <= 0 {
            break;
        }
    }

    Block {
        lines: collected,
        start_line,
    }
}

/// Find the 0-based indices of lines containing a literal trigger substring.
pub fn find_triggers(lines: &[&str], trigger: &str) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(trigger))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_skippable() {
        assert!(is_skippable(""));
        assert!(is_skippable("   "));
        assert!(is_skippable("// a comment"));
        assert!(is_skippable("    // indented comment"));
        assert!(!is_skippable("let x = 1"));
    }

    #[test]
    fn test_brace_delta_plain() {
        assert_eq!(brace_delta("func f() {"), 1);
        assert_eq!(brace_delta("}"), -1);
        assert_eq!(brace_delta("if x { y() } else {"), 1);
        assert_eq!(brace_delta("let x = 1"), 0);
    }

    #[test]
    fn test_brace_delta_ignores_strings() {
        assert_eq!(brace_delta(r#"let s = "{not counted}""#), 0);
        assert_eq!(brace_delta(r#"print("open {") {"#), 1);
        // Escaped quote does not terminate the string
        assert_eq!(brace_delta(r#"let s = "a \" {" "#), 0);
    }

    #[test]
    fn test_brace_delta_ignores_line_comments() {
        assert_eq!(brace_delta("foo() // { opens nothing"), 0);
        assert_eq!(brace_delta("bar { // trailing comment }"), 1);
        // A "//" inside a string is not a comment
        assert_eq!(brace_delta(r#"let url = "https://x.test" + f {"#), 1);
    }

    #[test]
    fn test_extract_block_simple() {
        let lines = vec![
            "var body: some View {",
            "    Text(\"hi\")",
            "    Image(systemName: \"star\")",
            "}",
            "func unrelated() {}",
        ];
        let block = extract_block(&lines, 0);
        assert_eq!(block.lines.len(), 3);
        assert_eq!(block.start_line, 2);
        assert_eq!(block.lines[2], "}");
    }

    #[test]
    fn test_extract_block_nested_braces() {
        let lines = vec![
            "var body: some View {",
            "    VStack {",
            "        Text(\"a\")",
            "    }",
            "}",
            "let after = 1",
        ];
        let block = extract_block(&lines, 0);
        assert_eq!(block.lines.len(), 4);
        assert!(!block.lines.iter().any(|l| l.contains("after")));
    }

    #[test]
    fn test_extract_block_open_brace_on_next_line() {
        let lines = vec!["var body: some View", "{", "    Text(\"hi\")", "}"];
        let block = extract_block(&lines, 0);
        assert_eq!(block.lines.last().unwrap(), "}");
        assert_eq!(block.lines.len(), 3);
    }

    #[test]
    fn test_extract_block_unterminated_runs_to_eof() {
        let lines = vec!["func f() {", "    let x = 1", "    let y = 2"];
        let block = extract_block(&lines, 0);
        assert_eq!(block.lines.len(), 2);
    }

    #[test]
    fn test_find_triggers() {
        let lines = vec!["struct A {", "  var body: some View {", "}", "var body: some View {"];
        let hits = find_triggers(&lines, "var body: some View");
        assert_eq!(hits, vec![1, 3]);
    }
}
