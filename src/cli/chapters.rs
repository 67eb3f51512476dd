use clap::Args;

use crate::chapters::{ChapterInfo, CATALOGUE};
use crate::cli::OutputFormat;
use crate::report::config::DEFAULT_SELECTION;

#[derive(Args)]
pub struct ChaptersArgs {
    /// Only list the chapters of this selection, in its order
    #[arg(long)]
    pub export: Option<String>,
}

fn listed(export: Option<&str>) -> Vec<&'static ChapterInfo> {
    match export {
        Some(selection) => selection
            .chars()
            .filter_map(|code| CATALOGUE.iter().find(|info| info.code == code))
            .collect(),
        None => CATALOGUE.iter().collect(),
    }
}

/// Execute chapters subcommand
///
/// # Errors
///
/// Returns an error if the JSON listing cannot be serialized.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ChaptersArgs, format: OutputFormat) -> anyhow::Result<()> {
    let infos = listed(args.export.as_deref());

    match format {
        OutputFormat::Text => {
            let name_width = infos.iter().map(|i| i.name.len()).max().unwrap_or(4).max(4);
            println!("{:<4} {:<name_width$} {}", "Code", "Name", "Subjects");
            for info in &infos {
                let marker = if DEFAULT_SELECTION.contains(info.code) { "*" } else { "" };
                println!(
                    "{:<4} {:<name_width$} {}{}",
                    info.code, info.name, info.subjects, marker
                );
            }
            println!();
            println!("* part of the default selection '{DEFAULT_SELECTION}'");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&infos)?);
        }
        OutputFormat::Tsv => {
            println!("code\tname\tsubjects");
            for info in &infos {
                println!("{}\t{}\t{}", info.code, info.name, info.subjects);
            }
        }
    }

    Ok(())
}
