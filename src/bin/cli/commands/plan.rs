use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use nous_notion::notion::{ImportPlan, ImportReport, ImportSettings, Importer, NotionMarkdown};
use nous_notion::storage::FsVault;

use crate::app::open_archives;
use crate::render::terminal::{connector, continuation, paint, Color};
use crate::OutputFormat;

/// Planned vault paths arranged as a folder tree
#[derive(Default)]
struct TreeNode {
    folders: BTreeMap<String, TreeNode>,
    files: Vec<String>,
}

impl TreeNode {
    fn insert(&mut self, path: &str) {
        match path.split_once('/') {
            Some((folder, rest)) => self.folders.entry(folder.to_string()).or_default().insert(rest),
            None => self.files.push(path.to_string()),
        }
    }
}

pub fn run(
    archives: &[PathBuf],
    vault_path: Option<&Path>,
    settings: ImportSettings,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut sources = open_archives(archives)?;
    // Without a vault nothing exists yet; an empty temp dir stands in for it
    let scratch;
    let vault = match vault_path {
        Some(path) => FsVault::new(path.to_path_buf()),
        None => {
            scratch = tempfile::TempDir::new().context("Failed to create scratch folder")?;
            FsVault::new(scratch.path().to_path_buf())
        }
    };

    let importer = Importer::new(&vault, &NotionMarkdown, settings);
    let mut report = ImportReport::new();
    let plan = importer.plan(&mut sources, &mut report).context("Planning failed")?;
    let preview = plan.preview();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "preview": preview,
                "skipped": report.skipped,
                "failed": report.failed,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            print_tree(&plan, use_color);
            println!();
            println!(
                "{} pages, {} attachments, {} duplicates merged, {} database exports ignored",
                preview.page_count, preview.asset_count, preview.duplicate_count, preview.ignored_count
            );
            for skipped in &report.skipped {
                println!("{} {} ({})", paint("skipped", Color::YELLOW, use_color), skipped.path, skipped.reason);
            }
            for failed in &report.failed {
                println!("{} {}: {}", paint("failed", Color::RED, use_color), failed.path, failed.error);
            }
        }
    }

    Ok(())
}

fn print_tree(plan: &ImportPlan, use_color: bool) {
    let mut root = TreeNode::default();
    let documents = plan.index.documents().filter_map(|(_, d)| d.path.as_deref());
    let attachments = plan.index.attachments().filter_map(|(_, a)| a.path.as_deref());
    for path in documents.chain(attachments) {
        root.insert(path);
    }

    print_children(&root, "", use_color);
}

fn print_children(node: &TreeNode, prefix: &str, use_color: bool) {
    let total = node.folders.len() + node.files.len();
    let mut idx = 0;

    for (name, child) in &node.folders {
        idx += 1;
        let is_last = idx == total;
        println!(
            "{}{}{}",
            prefix,
            connector(is_last),
            paint(&format!("{}/", name), Color::BLUE, use_color)
        );
        print_children(child, &format!("{}{}", prefix, continuation(is_last)), use_color);
    }

    let mut files: Vec<&String> = node.files.iter().collect();
    files.sort();
    for file in files {
        idx += 1;
        println!("{}{}{}", prefix, connector(idx == total), file);
    }
}
