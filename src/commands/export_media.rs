use anyhow::Result;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::inbox::archive::export_media_archive;
use crate::inbox::audit;
use crate::inbox::config::load_config;

#[derive(Debug, Clone)]
pub struct ExportMediaOptions {
    pub dest: Option<PathBuf>,
}

pub fn run(opts: &ExportMediaOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("export-media");
    let now = cfg.zone.now();

    let dest = opts
        .dest
        .clone()
        .unwrap_or_else(|| PathBuf::from(cfg.paths.media_archive_name(&now.local)));
    report.detail(format!("media_root={}", cfg.paths.media_root.display()));

    let entries = export_media_archive(&cfg.paths.media_root, &dest)?;
    report.detail(format!("archive={}", dest.display()));
    report.detail(format!("entries={entries}"));
    audit::record(
        &cfg.paths,
        "export-media",
        "ok",
        &format!("dest={} entries={entries}", dest.display()),
    );
    Ok(report)
}
