//! Block location inside dictionary text.
//!
//! Two flavours are needed:
//! - `find_block`: the boundary-file convention, where a block starts at a
//!   line holding only its name and ends at the first line containing `}`
//!   within a bounded window.
//! - `read_block`: general keyword blocks (`blocks ( ... );`,
//!   `ddtSchemes { ... }`) with nested delimiter tracking.

use crate::error::{FoamError, FoamResult};

/// Default number of lines searched for a closing brace after a block start.
pub const DEFAULT_SCAN_WINDOW: usize = 100;

/// Half-open line range of a located block: `start` is the name line,
/// `end` is the closing-brace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Seeking,
    InBlock { start: usize },
    Closed { start: usize, end: usize },
}

/// Line-at-a-time scanner for a named block.
///
/// Lines must be fed with strictly increasing indices. Once `Closed`, further
/// lines are ignored.
#[derive(Debug)]
pub struct BlockScanner<'a> {
    name: &'a str,
    window: usize,
    state: ScanState,
}

impl<'a> BlockScanner<'a> {
    pub fn new(name: &'a str, window: usize) -> Self {
        Self {
            name,
            window,
            state: ScanState::Seeking,
        }
    }

    pub fn feed(&mut self, index: usize, line: &str) -> FoamResult<ScanState> {
        if let ScanState::Seeking = self.state {
            if line.trim() == self.name {
                self.state = ScanState::InBlock { start: index };
            }
        }

        if let ScanState::InBlock { start } = self.state {
            if index - start >= self.window {
                return Err(FoamError::MalformedDictionary(format!(
                    "block '{}' starting at line {} has no closing brace within {} lines",
                    self.name,
                    start + 1,
                    self.window
                )));
            }
            if line.contains('}') {
                self.state = ScanState::Closed { start, end: index };
            }
        }

        Ok(self.state)
    }

    /// Consume the scanner once input is exhausted.
    pub fn finish(self) -> FoamResult<BlockSpan> {
        match self.state {
            ScanState::Closed { start, end } => Ok(BlockSpan { start, end }),
            ScanState::InBlock { start } => Err(FoamError::MalformedDictionary(format!(
                "block '{}' starting at line {} is never closed",
                self.name,
                start + 1
            ))),
            ScanState::Seeking => Err(FoamError::MalformedDictionary(format!(
                "block '{}' not found",
                self.name
            ))),
        }
    }
}

/// Locate a named block in a line buffer.
pub fn find_block<S: AsRef<str>>(lines: &[S], name: &str, window: usize) -> FoamResult<BlockSpan> {
    let mut scanner = BlockScanner::new(name, window);
    for (i, line) in lines.iter().enumerate() {
        if let ScanState::Closed { .. } = scanner.feed(i, line.as_ref())? {
            break;
        }
    }
    scanner.finish()
}

/// First whitespace-separated token of a line, if any.
pub fn first_token(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

/// Value of a `key value;` entry line: the second token without the `;`.
pub fn entry_value(line: &str) -> Option<&str> {
    line.split_whitespace()
        .nth(1)
        .map(|v| v.trim_end_matches(';'))
        .filter(|v| !v.is_empty())
}

fn is_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("//") || t.starts_with("/*") || t.starts_with('|') || t.starts_with("\\*")
}

/// Read the lines of a keyword block, from the keyword line through the line
/// that closes the first `(`/`{` group opened after it.
pub fn read_block(text: &str, keyword: &str) -> FoamResult<Vec<String>> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines
        .iter()
        .position(|l| !is_comment(l) && first_token(l) == Some(keyword))
        .ok_or_else(|| FoamError::anchor(keyword, "no line starts with this keyword"))?;

    let mut depth: i64 = 0;
    let mut opened = false;
    let mut out = Vec::new();
    for line in &lines[start..] {
        out.push(line.to_string());
        for c in line.chars() {
            match c {
                '(' | '{' => {
                    depth += 1;
                    opened = true;
                }
                ')' | '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return Ok(out);
        }
    }

    Err(FoamError::MalformedDictionary(format!(
        "block '{}' starting at line {} is never closed",
        keyword,
        start + 1
    )))
}

/// Value of the first `keyword value;` line in a dictionary.
pub fn read_single_line_value(text: &str, keyword: &str) -> FoamResult<String> {
    for line in text.lines() {
        if is_comment(line) || first_token(line) != Some(keyword) {
            continue;
        }
        return entry_value(line)
            .map(str::to_string)
            .ok_or_else(|| FoamError::anchor(keyword, format!("entry has no value: {:?}", line)));
    }
    Err(FoamError::anchor(keyword, "no entry with this key"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BOUNDARY: &str = "2\n(\n    inlet\n    {\n        type patch;\n        nFaces 10;\n    }\n    AMI1\n    {\n        type patch;\n    }\n)\n";

    #[test]
    fn finds_block_span() {
        let lines: Vec<&str> = BOUNDARY.lines().collect();
        let span = find_block(&lines, "AMI1", DEFAULT_SCAN_WINDOW).unwrap();
        assert_eq!(span, BlockSpan { start: 7, end: 10 });
    }

    #[test]
    fn name_must_match_whole_trimmed_line() {
        let lines = ["    AMI10", "    {", "    }"];
        let err = find_block(&lines, "AMI1", DEFAULT_SCAN_WINDOW).unwrap_err();
        assert!(matches!(err, FoamError::MalformedDictionary(_)));
    }

    #[test]
    fn brace_outside_window_is_malformed() {
        let lines: Vec<&str> = BOUNDARY.lines().collect();
        let err = find_block(&lines, "AMI1", 2).unwrap_err();
        assert!(err.to_string().contains("within 2 lines"));
    }

    #[test]
    fn unterminated_block_is_malformed() {
        let lines = ["AMI1", "{", "nFaces 3;"];
        let err = find_block(&lines, "AMI1", DEFAULT_SCAN_WINDOW).unwrap_err();
        assert!(err.to_string().contains("never closed"));
    }

    #[test]
    fn scanner_walks_through_states() {
        let mut s = BlockScanner::new("AMI2", 10);
        assert_eq!(s.feed(0, "AMI1").unwrap(), ScanState::Seeking);
        assert_eq!(s.feed(1, "  AMI2  ").unwrap(), ScanState::InBlock { start: 1 });
        assert_eq!(s.feed(2, "{").unwrap(), ScanState::InBlock { start: 1 });
        assert_eq!(s.feed(3, "}").unwrap(), ScanState::Closed { start: 1, end: 3 });
        assert_eq!(s.feed(4, "}").unwrap(), ScanState::Closed { start: 1, end: 3 });
    }

    #[test]
    fn read_block_tracks_nesting() {
        let text = "convertToMeters 1;\n\nblocks\n(\n    hex (0 1 2 3 4 5 6 7)\n    (40 1 20)\n    simpleGrading (1 1 1)\n);\n\nedges ();\n";
        let block = read_block(text, "blocks").unwrap();
        assert_eq!(block.len(), 6);
        assert_eq!(block[3].trim(), "(40 1 20)");
        assert_eq!(block[5], ");");
    }

    #[test]
    fn single_line_values() {
        let text = "// adjustTimeStep no;\nadjustTimeStep  yes;\nmaxCo           0.9;\n";
        assert_eq!(read_single_line_value(text, "adjustTimeStep").unwrap(), "yes");
        assert_eq!(read_single_line_value(text, "maxCo").unwrap(), "0.9");
        assert!(matches!(
            read_single_line_value(text, "deltaT"),
            Err(FoamError::AnchorNotFound { .. })
        ));
    }
}
