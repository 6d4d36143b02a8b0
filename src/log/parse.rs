use crate::dict::scan::{read_block, read_single_line_value};
use crate::error::{FoamError, FoamResult};
use crate::log::row::{BlockCounts, LayerSettings, TimeStepPolicy, YPlus};

use regex::Regex;
use std::str::FromStr;

fn parse_field<T: FromStr>(raw: &str, context: &str) -> FoamResult<T> {
    raw.trim_end_matches(';')
        .parse::<T>()
        .map_err(|_| FoamError::parse(context, raw))
}

/// Total cell count from a `checkMesh` log.
///
/// Expected line (first token is the anchor):
///     cells:            1843200
pub fn cell_count(text: &str) -> FoamResult<u64> {
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("cells:") {
            continue;
        }
        let raw = fields
            .next()
            .ok_or_else(|| FoamError::anchor("cells:", "line has no value"))?;
        return parse_field(raw, "cell count");
    }
    Err(FoamError::anchor("cells:", "not present in checkMesh log"))
}

/// y+ statistics for `patch` from a `yPlus` log.
///
/// The anchor is the first line whose last token is the patch name; the
/// statistics sit three lines below it:
///     y+ : min: 0.57 max: 8.31 average: 2.74
/// Fields 3, 5 and 7 of that line are min, max and mean.
pub fn y_plus(text: &str, patch: &str) -> FoamResult<YPlus> {
    let lines: Vec<&str> = text.lines().collect();
    let anchor = lines
        .iter()
        .position(|l| l.split_whitespace().last() == Some(patch))
        .ok_or_else(|| FoamError::anchor(patch, "no line ends with the patch name"))?;

    let line = lines.get(anchor + 3).ok_or_else(|| {
        FoamError::anchor(
            patch,
            format!("log ends before the statistics line (anchor at line {})", anchor + 1),
        )
    })?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return Err(FoamError::anchor(
            patch,
            format!("statistics line {} is too short: {:?}", anchor + 4, line),
        ));
    }

    Ok(YPlus {
        min: parse_field(fields[3], "y+ min")?,
        max: parse_field(fields[5], "y+ max")?,
        mean: parse_field(fields[7], "y+ mean")?,
    })
}

/// Cell counts of the first `hex` block in `blockMeshDict`.
///
/// The counts are the second parenthesised group of the block entry:
///     hex (0 1 2 3 4 5 6 7) (120 1 80) simpleGrading (1 1 1)
/// which may be split over several lines.
pub fn block_counts(text: &str) -> FoamResult<BlockCounts> {
    let block = read_block(text, "blocks")?;
    let joined = block.join(" ");

    let re = Regex::new(r"\(([^()]*)\)")
        .map_err(|e| FoamError::parse("block regex", e.to_string()))?;
    let counts = re
        .captures_iter(&joined)
        .nth(1)
        .and_then(|c| c.get(1))
        .ok_or_else(|| FoamError::anchor("blocks", "no (nx ny nz) group after hex vertices"))?
        .as_str();

    let n: Vec<&str> = counts.split_whitespace().collect();
    if n.len() != 3 {
        return Err(FoamError::parse("block cell counts", counts));
    }
    Ok(BlockCounts {
        nx: parse_field(n[0], "nx")?,
        ny: parse_field(n[1], "ny")?,
        nz: parse_field(n[2], "nz")?,
    })
}

/// Layer count and expansion ratio from `snappyHexMeshDict`.
pub fn layer_settings(text: &str) -> FoamResult<LayerSettings> {
    Ok(LayerSettings {
        n_layers: parse_field(&read_single_line_value(text, "nSurfaceLayers")?, "nSurfaceLayers")?,
        expansion_ratio: parse_field(
            &read_single_line_value(text, "expansionRatio")?,
            "expansionRatio",
        )?,
    })
}

/// Default time scheme from the `ddtSchemes` block of `fvSchemes`.
pub fn ddt_scheme(text: &str) -> FoamResult<String> {
    let block = read_block(text, "ddtSchemes")?;
    block
        .iter()
        .skip(1)
        .find_map(|l| {
            let mut fields = l.split_whitespace();
            (fields.next() == Some("default")).then(|| fields.next()).flatten()
        })
        .map(|v| v.trim_end_matches(';').to_string())
        .ok_or_else(|| FoamError::anchor("default", "ddtSchemes has no default entry"))
}

/// Time-step policy from `controlDict`.
pub fn time_step_policy(text: &str) -> FoamResult<TimeStepPolicy> {
    let adjust = read_single_line_value(text, "adjustTimeStep")
        .map(|v| matches!(v.as_str(), "yes" | "on" | "true"))
        .unwrap_or(false);

    if adjust {
        let max_co = parse_field(&read_single_line_value(text, "maxCo")?, "maxCo")?;
        Ok(TimeStepPolicy::Adaptive { max_co })
    } else {
        let delta_t = parse_field(&read_single_line_value(text, "deltaT")?, "deltaT")?;
        Ok(TimeStepPolicy::Fixed { delta_t })
    }
}

/// Value of the last line in a `funkyDoCalc` log whose first token is `key`.
///
/// `=` counts as whitespace and the value is the last token:
///     weightedAverage=0.0132
pub fn last_keyed_value(text: &str, key: &str) -> FoamResult<f64> {
    let mut found = None;
    for line in text.lines() {
        let line = line.replace('=', " ");
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.first() == Some(&key) {
            if let Some(raw) = fields.last() {
                found = Some(parse_field::<f64>(raw, key)?);
            }
        }
    }
    found.ok_or_else(|| FoamError::anchor(key, "not present in log"))
}
