use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use nous_notion::notion::{ImportError, ImportReport, ImportSettings, Importer, NotionMarkdown, ProgressReporter};
use nous_notion::storage::FsVault;

use crate::app::open_archives;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

/// Collects the report and draws a progress counter on stderr
struct TerminalReporter {
    report: ImportReport,
    show_progress: bool,
}

impl ProgressReporter for TerminalReporter {
    fn report_progress(&mut self, current: usize, total: usize) {
        self.report.report_progress(current, total);
        if self.show_progress {
            eprint!("\rImporting {}/{}", current, total);
            let _ = std::io::stderr().flush();
        }
    }

    fn report_skipped(&mut self, path: &str, reason: &str) {
        self.report.report_skipped(path, reason);
    }

    fn report_note_success(&mut self, path: &str) {
        self.report.report_note_success(path);
    }

    fn report_attachment_success(&mut self, path: &str) {
        self.report.report_attachment_success(path);
    }

    fn report_failed(&mut self, path: &str, error: &ImportError) {
        self.report.report_failed(path, error);
    }
}

pub fn run(
    archives: &[PathBuf],
    vault_path: &Path,
    settings: ImportSettings,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut sources = open_archives(archives)?;
    let vault = FsVault::new(vault_path.to_path_buf());
    let importer = Importer::new(&vault, &NotionMarkdown, settings);

    let mut reporter = TerminalReporter {
        report: ImportReport::new(),
        show_progress: matches!(format, OutputFormat::Plain) && std::io::stderr().is_terminal(),
    };
    importer
        .run(&mut sources, &mut reporter)
        .with_context(|| format!("Import into {} failed", vault_path.display()))?;
    if reporter.show_progress {
        eprintln!();
    }

    let mut report = reporter.report;
    report.finish();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => print_report(&report, use_color),
    }

    Ok(())
}

fn print_report(report: &ImportReport, use_color: bool) {
    for skipped in &report.skipped {
        println!(
            "{} {} ({})",
            paint("skipped", Color::YELLOW, use_color),
            skipped.path,
            skipped.reason
        );
    }
    for failed in &report.failed {
        println!("{} {}: {}", paint("failed", Color::RED, use_color), failed.path, failed.error);
    }

    let color = if report.has_failures() { Color::YELLOW } else { Color::GREEN };
    println!("{}", paint(&report.summary(), color, use_color));
}
