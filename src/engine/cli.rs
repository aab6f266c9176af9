//! Updater CLI Module
//! Command-line interface for fetching and merging TS templates

pub mod formatter;

use crate::engine::merge::{ComponentSelection, MergeOptions, UpdateRequest};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ts-updater")]
#[command(version)]
#[command(about = "Fetch the latest Qt translation templates and merge them into your TS files")]
#[command(long_about = "Fetches the daily updated template files from http://l10n-files.qt.io \
and merges each template into the matching <component>_<language>.ts file.")]
#[command(after_help = "Read https://wiki.qt.io/Qt_Localization for information about how to translate.")]
pub struct Cli {
    /// Component to update, e.g. qtbase, qtscript, assistant, designer.
    /// Use `all` to update every known component.
    pub component: String,

    /// Target language of the translation files, e.g. zh_TW, zh_CN, ar, ko, pl
    pub language: String,

    /// Branch to fetch templates from, e.g. qt5-current, qt5-stable.
    /// Prompts for one when omitted or unknown.
    #[arg(long, value_name = "BRANCH_NAME")]
    pub branch: Option<String>,

    /// Only download the templates, don't merge them
    #[arg(long)]
    pub no_merge: bool,

    /// Remove <location> tags from merged files (use before pushing changes)
    #[arg(long)]
    pub clean_tags: bool,

    /// Don't back up translation files before merging (not recommended)
    #[arg(long)]
    pub no_backups: bool,

    /// Directory holding the TS files (defaults to current directory)
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Config file overriding server URLs, components or the merge program
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print debug logging to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn get_work_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            merge: !self.no_merge,
            backup: !self.no_backups,
            strip_locations: self.clean_tags,
        }
    }

    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest {
            selection: ComponentSelection::parse(&self.component),
            language: self.language.clone(),
            branch: self.branch.clone(),
            options: self.merge_options(),
        }
    }
}
