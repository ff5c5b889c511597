use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::adapters::registry::{FormatId, available_formats};
use crate::document::candidate::parse_candidate;
use crate::document::document_model::TestDocument;
use crate::error::ForgeError;
use crate::generation::model_client::{ChatCompletionsClient, ModelClient, ModelConfig, ReplayClient};
use crate::generation::orchestrator::Orchestrator;
use crate::generation::request::{GenerationRequest, parse_tag_list, parse_variable};
use crate::validation::{ValidationResult, validate};

/// Scenario slugs are cut to this many characters before kebab-casing.
pub const SLUG_SOURCE_CHARS: usize = 50;

// ============================================================================
// generate subcommand
// ============================================================================

/// Generate one document, render it, print it and optionally write it.
pub fn cmd_generate(
    orchestrator: &Orchestrator<'_>,
    request: &GenerationRequest,
    output: Option<&str>,
) -> Result<String, ForgeError> {
    let rendered = generate_rendered(orchestrator, request)?;

    println!("{}", rendered.trim_end());
    if let Some(path) = output {
        write_output(&rendered, path)?;
        tracing::info!("wrote {}", path);
    }
    Ok(rendered)
}

/// Run the orchestrator and render the accepted document in the requested format.
pub fn generate_rendered(
    orchestrator: &Orchestrator<'_>,
    request: &GenerationRequest,
) -> Result<String, ForgeError> {
    let outcome = orchestrator.run(request)?;
    Ok(request.format.adapter().convert(&outcome.document))
}

// ============================================================================
// batch subcommand
// ============================================================================

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(String, ForgeError)>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Generate one file per scenario. A failing scenario is reported and the
/// batch moves on to the next one.
pub fn cmd_batch(
    orchestrator: &Orchestrator<'_>,
    template: &GenerationRequest,
    scenarios: &[String],
    output_dir: &str,
) -> Result<BatchSummary, ForgeError> {
    std::fs::create_dir_all(output_dir)
        .map_err(|e| ForgeError::io(format!("creating {}", output_dir), e))?;

    let extension = template.format.adapter().file_extension();
    let mut used: HashSet<String> = HashSet::new();
    let mut summary = BatchSummary::default();

    for (i, scenario) in scenarios.iter().enumerate() {
        tracing::info!("[{}/{}] {}", i + 1, scenarios.len(), scenario);

        let request = GenerationRequest {
            scenario: scenario.clone(),
            ..template.clone()
        };

        match generate_rendered(orchestrator, &request) {
            Ok(rendered) => {
                let name = unique_slug(&slugify(scenario), &mut used);
                let path = Path::new(output_dir).join(format!("{}{}", name, extension));
                write_output(&rendered, &path)?;
                println!("  Wrote: {}", path.display());
                summary.written.push(path);
            }
            Err(ForgeError::Cancelled) => return Err(ForgeError::Cancelled),
            Err(e) => {
                eprintln!("  Failed: {}: {}", scenario, e);
                summary.failed.push((scenario.clone(), e));
            }
        }
    }

    println!(
        "Generated {} of {} documents in {}/",
        summary.written.len(),
        scenarios.len(),
        output_dir
    );
    Ok(summary)
}

/// Read scenarios from a text file: one per line, blank lines and `#`
/// comments skipped.
pub fn read_scenarios(path: &str) -> Result<Vec<String>, ForgeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ForgeError::io(format!("reading {}", path), e))?;
    Ok(parse_scenarios(&content))
}

pub fn parse_scenarios(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Validate a native document file, print every violation and return whether
/// it is valid.
pub fn cmd_validate(path: &str, strict: bool) -> Result<bool, ForgeError> {
    let raw = read_file(path)?;
    let candidate = parse_candidate(&raw)?;
    let result = validate(&candidate, strict);

    print_violations(&result);
    if result.is_valid() {
        println!("{}: valid ({} warnings)", path, result.warnings().count());
    } else {
        println!("{}: {} errors", path, result.errors().count());
    }
    Ok(result.is_valid())
}

// ============================================================================
// convert subcommand
// ============================================================================

/// Render an existing native document in another format. The document must
/// pass validation first.
pub fn cmd_convert(
    path: &str,
    format: FormatId,
    output: Option<&str>,
    strict: bool,
) -> Result<String, ForgeError> {
    let document = load_document(path, strict)?;
    let rendered = format.adapter().convert(&document);

    match output {
        Some(out) => {
            write_output(&rendered, out)?;
            println!("Wrote: {}", out);
        }
        None => println!("{}", rendered.trim_end()),
    }
    Ok(rendered)
}

/// Parse and validate a native document file into the typed model.
pub fn load_document(path: &str, strict: bool) -> Result<TestDocument, ForgeError> {
    let raw = read_file(path)?;
    let candidate = parse_candidate(&raw)?;
    let result = validate(&candidate, strict);
    if !result.is_valid() {
        return Err(ForgeError::Schema {
            violations: result.into_errors(),
        });
    }
    TestDocument::from_candidate(&candidate)
}

// ============================================================================
// formats subcommand
// ============================================================================

pub fn cmd_formats() {
    for id in available_formats() {
        if let Ok(format) = id.parse::<FormatId>() {
            println!("{:<14} {}", id, format.adapter().file_extension());
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Build a request from raw CLI values.
pub fn build_request(
    scenario: &str,
    format: &str,
    base_url: Option<&str>,
    tags: Option<&str>,
    vars: &[String],
    strict: bool,
) -> Result<GenerationRequest, ForgeError> {
    let format: FormatId = format.parse()?;
    let mut request = GenerationRequest::new(scenario, format).strict(strict);

    if let Some(url) = base_url {
        request = request.with_base_url(url);
    }
    if let Some(csv) = tags {
        request = request.with_tags(parse_tag_list(csv));
    }
    for pair in vars {
        let (name, value) = parse_variable(pair)
            .ok_or_else(|| ForgeError::Config(format!("expected name=value, got '{}'", pair)))?;
        request = request.with_variable(name, value);
    }
    Ok(request)
}

/// The live endpoint client, or one that answers every prompt with a saved response.
pub fn build_client(
    config: &ModelConfig,
    replay: Option<&str>,
) -> Result<Box<dyn ModelClient>, ForgeError> {
    match replay {
        Some(path) => {
            let response = read_file(path)?;
            Ok(Box::new(ReplayClient::new(response)))
        }
        None => Ok(Box::new(ChatCompletionsClient::new(config.timeout)?)),
    }
}

/// Write rendered output, creating parent directories as needed.
pub fn write_output(content: &str, path: impl AsRef<Path>) -> Result<(), ForgeError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ForgeError::io(format!("creating {}", parent.display()), e))?;
    }
    std::fs::write(path, content)
        .map_err(|e| ForgeError::io(format!("writing {}", path.display()), e))
}

/// Kebab-case file stem from the first characters of a scenario.
pub fn slugify(scenario: &str) -> String {
    let mut slug = String::new();
    for c in scenario.chars().take(SLUG_SOURCE_CHARS) {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "scenario".to_string()
    } else {
        slug
    }
}

fn unique_slug(slug: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = slug.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}-{}", slug, n);
        n += 1;
    }
    candidate
}

fn read_file(path: &str) -> Result<String, ForgeError> {
    std::fs::read_to_string(path).map_err(|e| ForgeError::io(format!("reading {}", path), e))
}

fn print_violations(result: &ValidationResult) {
    for v in &result.violations {
        println!("  [{:?}] {}", v.severity, v);
    }
}
