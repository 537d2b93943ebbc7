//! File-level driver: load inputs, run the pipeline, write outline JSON.

use std::collections::hash_map::{Entry, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::OutlineConfig;
use crate::error::{Error, Result};
use crate::extract;
use crate::model::{DocumentInput, Outline};
use crate::pipeline::extract_outline;

/// What a single input file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    /// A serialized [`DocumentInput`].
    SpanDump,
}

/// Classify a path by extension (case-insensitive).
pub fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(InputKind::Pdf),
        "json" => Some(InputKind::SpanDump),
        _ => None,
    }
}

pub fn load_input(path: &Path) -> Result<DocumentInput> {
    match input_kind(path) {
        Some(InputKind::Pdf) => extract::load_pdf(path),
        Some(InputKind::SpanDump) => {
            let data = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        }
        None => Err(Error::UnsupportedInput(path.to_path_buf())),
    }
}

/// Load one input file and extract its outline.
pub fn process_file(path: &Path, config: &OutlineConfig) -> Result<Outline> {
    let input = load_input(path)?;
    log::debug!("{}: {} spans", path.display(), input.spans.len());
    extract_outline(&input, config)
}

/// Write an outline in the `{"title", "outline"}` format.
pub fn write_outline(outline: &Outline, path: &Path, pretty: bool) -> Result<()> {
    let record = outline.to_record();
    let json = if pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    fs::write(path, json)?;
    Ok(())
}

/// Supported files directly inside `dir`, sorted by path.
pub fn collect_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && input_kind(&path).is_some() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Output path for an input: `<output_dir>/<stem>.json`.
pub fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or(input.as_os_str());
    output_dir.join(stem).with_extension("json")
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Process documents on the rayon pool.
    pub parallel: bool,
    /// Pretty-print output JSON.
    pub pretty: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            pretty: true,
        }
    }
}

impl BatchOptions {
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Outcome of a directory run. Both lists are in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Extract every supported file in `input_dir` into `output_dir`.
///
/// A document that fails is logged and recorded in the report; the rest
/// still run. Only failures to list the input or create the output
/// directory abort the batch.
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    config: &OutlineConfig,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let inputs = collect_inputs(input_dir)?;
    fs::create_dir_all(output_dir)?;
    log::info!(
        "Processing {} documents from {}",
        inputs.len(),
        input_dir.display()
    );

    // The first input (in path order) claims each output file.
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let planned: Vec<(PathBuf, Result<PathBuf>)> = inputs
        .into_iter()
        .map(|input| {
            let target = output_path(&input, output_dir);
            let plan = match claimed.entry(target.clone()) {
                Entry::Occupied(first) => Err(Error::OutputConflict {
                    output: target,
                    first: first.get().clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(input.clone());
                    Ok(target)
                }
            };
            (input, plan)
        })
        .collect();

    let run = |(input, plan): (PathBuf, Result<PathBuf>)| -> (PathBuf, Result<PathBuf>) {
        let result = plan.and_then(|target| {
            let outline = process_file(&input, config)?;
            write_outline(&outline, &target, options.pretty)?;
            Ok(target)
        });
        (input, result)
    };

    let results: Vec<(PathBuf, Result<PathBuf>)> = if options.parallel {
        planned.into_par_iter().map(run).collect()
    } else {
        planned.into_iter().map(run).collect()
    };

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(target) => {
                log::info!("{} -> {}", input.display(), target.display());
                report.written.push(target);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", input.display(), e);
                report.failed.push((input, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind() {
        assert_eq!(input_kind(Path::new("a/report.PDF")), Some(InputKind::Pdf));
        assert_eq!(input_kind(Path::new("spans.json")), Some(InputKind::SpanDump));
        assert_eq!(input_kind(Path::new("notes.txt")), None);
        assert_eq!(input_kind(Path::new("README")), None);
    }

    #[test]
    fn test_output_path() {
        let path = output_path(Path::new("in/file02.pdf"), Path::new("out"));
        assert_eq!(path, PathBuf::from("out/file02.json"));
    }

    #[test]
    fn test_unsupported_input() {
        let err = load_input(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedInput(_)));
    }

    #[test]
    fn test_conflict_error_names_both_paths() {
        let err = Error::OutputConflict {
            output: PathBuf::from("out/a.json"),
            first: PathBuf::from("in/a.json"),
        };
        let message = err.to_string();
        assert!(message.contains("out/a.json"));
        assert!(message.contains("in/a.json"));
    }

    #[test]
    fn test_options_builder() {
        let options = BatchOptions::default().with_parallel(false).with_pretty(false);
        assert!(!options.parallel);
        assert!(!options.pretty);
    }
}
