//! Plain-text rendering of a finished run.

use std::fmt::Write as _;

use crate::domain::CombineConfig;
use crate::report::RunSummary;

/// Renders the end-of-run report printed to stdout.
pub fn format_run_summary(summary: &RunSummary, config: &CombineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== combination summary ===\n");
    let _ = writeln!(out, "strategy            : {:?}", config.strategy);
    let _ = writeln!(out, "ranking source      : {:?}", config.ranking);
    let _ = writeln!(out, "exclusion threshold : {}", summary.exclusion_threshold);
    let _ = writeln!(out, "models analysed     : {}", summary.n_models);
    let _ = writeln!(out, "models excluded     : {}", summary.n_excluded);
    let _ = writeln!(out, "invalid results     : {}", summary.n_invalid);
    let _ = writeln!(out, "insensitive models  : {}", summary.n_insensitive);
    let _ = writeln!(out, "rejected models     : {}", summary.rejections.len());

    if !summary.chosen_counts.is_empty() {
        out.push_str("\nbest region counts:\n");
        for (label, count) in &summary.chosen_counts {
            let _ = writeln!(out, "  {label:<40} {count}");
        }
    }

    if !summary.rejections.is_empty() {
        out.push_str("\nrejections:\n");
        for (model_id, reason) in &summary.rejections {
            let _ = writeln!(out, "  model {model_id}: {reason}");
        }
    }

    out
}
