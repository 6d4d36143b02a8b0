use crate::model::PerfReport;

/// Short text summary of a performance reduction.
pub fn perf_summary(report: &PerfReport) -> String {
    let mut out = format!(
        "Performance from {:.1}--{:.1} degrees:\n",
        report.start_angle_deg, report.max_angle_deg
    );
    match report.outcome.means() {
        Some(m) => {
            out.push_str(&format!("Mean TSR = {:.3}\n", m.tsr));
            out.push_str(&format!("Mean C_P = {:.3}\n", m.cp));
            out.push_str(&format!("Mean C_D = {:.3}\n", m.cd));
            if !report.outcome.is_settled() {
                out.push_str("(not settled: the rotor never reached the requested start angle)\n");
            }
        }
        None => {
            out.push_str("No samples past the start angle; no means computed.\n");
        }
    }
    out
}

pub fn print_perf_summary(report: &PerfReport) {
    print!("{}", perf_summary(report));
}
