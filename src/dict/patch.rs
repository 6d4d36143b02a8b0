//! Cyclic AMI patch rewriting for `constant/polyMesh/boundary`.
//!
//! Mesh generation leaves the two AMI patches as plain patches. The solver
//! needs them as a `cyclicAMI` pair that name each other as neighbours, while
//! keeping the face counts and start faces the mesher produced.

use crate::dict::banner::BANNER;
use crate::dict::scan::{BlockSpan, DEFAULT_SCAN_WINDOW, entry_value, find_block, first_token};
use crate::error::{FoamError, FoamResult};

use std::fs;
use std::path::Path;

const CAPTURED_KEYS: [&str; 2] = ["nFaces", "startFace"];

#[derive(Debug, Clone, PartialEq)]
pub struct CyclicAmi {
    /// Patch names, in the order they appear in the file.
    pub patches: [String; 2],
    /// Neighbour of each patch, index-aligned with `patches`.
    pub neighbours: [String; 2],
    pub tolerance: f64,
    pub transform: String,
    pub window: usize,
}

impl Default for CyclicAmi {
    fn default() -> Self {
        Self {
            patches: ["AMI1".to_string(), "AMI2".to_string()],
            neighbours: ["AMI2".to_string(), "AMI1".to_string()],
            tolerance: 0.0001,
            transform: "noOrdering".to_string(),
            window: DEFAULT_SCAN_WINDOW,
        }
    }
}

impl CyclicAmi {
    /// Pair two patches as each other's neighbours.
    pub fn pair(first: &str, second: &str) -> Self {
        Self {
            patches: [first.to_string(), second.to_string()],
            neighbours: [second.to_string(), first.to_string()],
            ..Self::default()
        }
    }
}

/// The `nFaces` and `startFace` lines of a block, verbatim (line endings kept).
struct Captured<'a> {
    n_faces: &'a str,
    start_face: &'a str,
}

fn capture<'a>(lines: &[&'a str], span: BlockSpan, name: &str) -> FoamResult<Captured<'a>> {
    let mut n_faces = None;
    let mut start_face = None;
    for line in &lines[span.start..span.end] {
        match first_token(line) {
            Some("nFaces") => n_faces = Some(*line),
            Some("startFace") => start_face = Some(*line),
            _ => {}
        }
    }
    match (n_faces, start_face) {
        (Some(n_faces), Some(start_face)) => Ok(Captured { n_faces, start_face }),
        _ => Err(FoamError::MalformedDictionary(format!(
            "block '{}' (line {}) lacks one of {:?}",
            name,
            span.start + 1,
            CAPTURED_KEYS
        ))),
    }
}

fn render_block(
    out: &mut String,
    name: &str,
    neighbour: &str,
    captured: &Captured,
    cfg: &CyclicAmi,
) {
    out.push_str(&format!("    {}\n    {{\n", name));
    out.push_str("        type cyclicAMI;\n");
    out.push_str("        inGroups 1(cyclicAMI);\n");
    push_line(out, captured.n_faces);
    push_line(out, captured.start_face);
    out.push_str(&format!("        matchTolerance {};\n", cfg.tolerance));
    out.push_str(&format!("        transform {};\n", cfg.transform));
    out.push_str(&format!("        neighbourPatch {};\n", neighbour));
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push('\n');
    }
}

/// Rewrite the two AMI blocks of a boundary dictionary.
///
/// Output is banner + prefix + block 1 + middle + block 2 + suffix + `\n`.
/// Each rewritten block replaces the lines from the name line up to, not
/// including, its closing brace, so the brace lines stay in the untouched text.
pub fn patch_boundary(text: &str, cfg: &CyclicAmi) -> FoamResult<String> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let [first, second] = &cfg.patches;
    let span0 = find_block(&lines, first, cfg.window)?;
    let span1 = find_block(&lines, second, cfg.window)?;
    if span1.start <= span0.end {
        return Err(FoamError::MalformedDictionary(format!(
            "patch '{}' (line {}) must come after '{}' closes (line {})",
            second,
            span1.start + 1,
            first,
            span0.end + 1
        )));
    }

    let cap0 = capture(&lines, span0, first)?;
    let cap1 = capture(&lines, span1, second)?;
    tracing::debug!(?span0, ?span1, "located AMI blocks");

    let mut out = String::with_capacity(text.len() + BANNER.len() + 256);
    out.push_str(BANNER);
    out.push('\n');
    out.extend(lines[..span0.start].iter().copied());
    render_block(&mut out, first, &cfg.neighbours[0], &cap0, cfg);
    out.extend(lines[span0.end..span1.start].iter().copied());
    render_block(&mut out, second, &cfg.neighbours[1], &cap1, cfg);
    out.extend(lines[span1.end..].iter().copied());
    out.push('\n');
    Ok(out)
}

/// Patch a boundary file in place. No backup is written.
pub fn patch_boundary_file(path: &Path, cfg: &CyclicAmi) -> FoamResult<()> {
    let text = fs::read_to_string(path)?;
    let patched = patch_boundary(&text, cfg)?;
    fs::write(path, patched)?;
    tracing::info!(path = %path.display(), patches = ?cfg.patches, "rewrote cyclic AMI patches");
    Ok(())
}

/// The `(nFaces, startFace)` values of a block.
pub fn captured_values(text: &str, name: &str, window: usize) -> FoamResult<(String, String)> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let span = find_block(&lines, name, window)?;
    let cap = capture(&lines, span, name)?;
    let value = |line: &str| {
        entry_value(line).map(str::to_string).ok_or_else(|| {
            FoamError::MalformedDictionary(format!("entry without value: {:?}", line))
        })
    };
    Ok((value(cap.n_faces)?, value(cap.start_face)?))
}
