//! Text exposition rendering (text format 0.0.4).

use std::fmt::Write as _;

use crate::snapshot::Snapshot;

/// Metric name emitted for every slot.
pub const METRIC_NAME: &str = "http_requests_count_total";

/// Content type advertised alongside the rendered text.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Render a snapshot in the text exposition format.
///
/// Output is fully determined by the snapshot: two comment lines, then one
/// line per slot in ascending slot order, zero counts included, two spaces
/// between the closing brace and the count. The unknown bucket renders its
/// table position in place of a status line.
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::with_capacity(64 * (snapshot.counts().len() + 2));
    let _ = writeln!(out, "# HELP {METRIC_NAME} The total number of HTTP requests.");
    let _ = writeln!(out, "# TYPE {METRIC_NAME} counter");
    for entry in snapshot.entries() {
        match entry.label {
            Some(label) => {
                let _ = writeln!(out, "{METRIC_NAME}{{status=\"{label}\"}}  {}", entry.count);
            }
            None => {
                let _ = writeln!(
                    out,
                    "{METRIC_NAME}{{status=\"unknown apache code {}\"}}  {}",
                    entry.slot, entry.count
                );
            }
        }
    }
    out
}
