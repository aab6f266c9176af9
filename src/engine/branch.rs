//! Branch Resolution
//!
//! Parse the server's branch map and pick the branch whose templates are fetched.

use crate::engine::config::UpdaterConfig;
use crate::engine::fetch::{FetchError, RemoteSource};
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BranchError {
    #[error("Failed to fetch branch map: {0}")]
    Fetch(#[from] FetchError),
    #[error("No branch selected (input closed)")]
    Aborted,
    #[error("Terminal IO error: {0}")]
    Io(#[from] io::Error),
}

/// One selectable release line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRecord {
    /// e.g. `qt5-current`; used verbatim in download URLs
    pub id: String,
    /// e.g. `Qt 5.11`
    pub display_name: String,
}

impl BranchRecord {
    fn from_tokens(family: &str, version: &str, tag: &str) -> Self {
        Self {
            id: format!("{}-{}", family, tag),
            display_name: format!("{} {}", product_name(family), version),
        }
    }
}

/// `qt5` -> `Qt`
fn product_name(family: &str) -> String {
    let mut chars = family.chars();
    let mut name = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
        None => String::new(),
    };
    name.pop();
    name
}

/// Parse `<family> <version> <tag>` lines, keeping only families containing `marker`.
pub fn parse_branch_map(text: &str, marker: &str) -> Vec<BranchRecord> {
    let mut records = Vec::new();

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let family = match tokens.first() {
            Some(family) => *family,
            None => continue,
        };
        if !family.contains(marker) {
            continue;
        }
        if tokens.len() < 3 {
            tracing::warn!(%line, "skipping malformed branch map line");
            continue;
        }
        records.push(BranchRecord::from_tokens(family, tokens[1], tokens[2]));
    }

    records
}

/// Download and parse the configured branch map
pub fn fetch_branches<S: RemoteSource + ?Sized>(
    source: &S,
    config: &UpdaterConfig,
) -> Result<Vec<BranchRecord>, FetchError> {
    let text = source.fetch_text(&config.branch_map_url)?;
    let records = parse_branch_map(&text, &config.product_marker);
    tracing::debug!(count = records.len(), "parsed branch map");
    Ok(records)
}

/// Interactive selection states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    AwaitingInput,
    Validated(String),
    Aborted,
}

/// Drives branch selection over arbitrary line input / text output.
pub struct BranchPicker<'a> {
    records: &'a [BranchRecord],
    state: PromptState,
}

impl<'a> BranchPicker<'a> {
    pub fn new(records: &'a [BranchRecord]) -> Self {
        Self {
            records,
            state: PromptState::AwaitingInput,
        }
    }

    pub fn state(&self) -> &PromptState {
        &self.state
    }

    pub fn is_valid(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    /// Feed one line of user input (`None` = end of input).
    pub fn submit(&mut self, line: Option<&str>) -> &PromptState {
        if self.state != PromptState::AwaitingInput {
            return &self.state;
        }
        self.state = match line {
            None => PromptState::Aborted,
            Some(raw) => {
                let entered = raw.trim_end_matches(&['\n', '\r'][..]);
                if self.is_valid(entered) {
                    PromptState::Validated(entered.to_string())
                } else {
                    PromptState::AwaitingInput
                }
            }
        };
        &self.state
    }

    fn print_table<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "BranchName\tBranchID")?;
        for record in self.records {
            writeln!(out, "{}\t\t{}", record.display_name, record.id)?;
        }
        Ok(())
    }

    /// Return `requested` if it names a branch, otherwise prompt until a valid id is entered.
    pub fn resolve<R: BufRead, W: Write>(
        mut self,
        requested: Option<&str>,
        input: &mut R,
        out: &mut W,
    ) -> Result<String, BranchError> {
        if let Some(id) = requested {
            if self.is_valid(id) {
                return Ok(id.to_string());
            }
            tracing::debug!(branch = id, "requested branch not in branch map");
        }

        loop {
            self.print_table(out)?;
            write!(out, "Please input the BranchID that you want to merge: ")?;
            out.flush()?;

            let mut line = String::new();
            let read = input.read_line(&mut line)?;
            let submitted = if read == 0 { None } else { Some(line.as_str()) };

            match self.submit(submitted).clone() {
                PromptState::Validated(id) => return Ok(id),
                PromptState::Aborted => {
                    writeln!(out)?;
                    return Err(BranchError::Aborted);
                }
                PromptState::AwaitingInput => {
                    writeln!(out, "BranchID invalid: {}\n", line.trim_end_matches(&['\n', '\r'][..]))?;
                }
            }
        }
    }
}

/// Fetch the branch map, then validate or prompt for the branch id.
pub fn resolve_branch<S, R, W>(
    source: &S,
    config: &UpdaterConfig,
    requested: Option<&str>,
    input: &mut R,
    out: &mut W,
) -> Result<String, BranchError>
where
    S: RemoteSource + ?Sized,
    R: BufRead,
    W: Write,
{
    let records = fetch_branches(source, config)?;
    BranchPicker::new(&records).resolve(requested, input, out)
}
