use anyhow::Result;

use crate::commands::CommandReport;
use crate::inbox::config::load_config;
use crate::inbox::journal::append_to_month;

pub fn run(text: &str) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("note");

    if text.trim().is_empty() {
        report.issue("note text is empty");
        return Ok(report);
    }

    let stamp = cfg.zone.now();
    let out = append_to_month(&cfg.paths, &stamp, text, cfg.session_gap_hours)?;
    report.detail(format!("file={}", out.path.display()));
    report.detail(format!("new_section={}", out.new_section));
    report.detail(format!("bytes={}", out.bytes));
    Ok(report)
}
