use anyhow::Result;

use crate::commands::CommandReport;
use crate::inbox::catalog::list_logs;
use crate::inbox::config::load_config;

pub fn run() -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("ls");
    for name in list_logs(&cfg.paths)? {
        report.detail(name);
    }
    Ok(report)
}
