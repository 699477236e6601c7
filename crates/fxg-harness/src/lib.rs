#![forbid(unsafe_code)]

pub mod run_log;

use fxg_expected::{Artifact, ExpectedFamily, ExpectedSink, FamilyRun, registry, run_family};
use fxg_input::InputCatalog;
use fxg_io::MatrixFileFormat;
use fxg_runtime::FamilySummary;
use run_log::{RunLogEntry, maybe_append_run_log};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

pub use run_log::set_run_log_path;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub format: MatrixFileFormat,
    /// Family names or prefixes to run; empty runs everything.
    pub family_filter: Vec<String>,
    pub read_inputs_from_disk: bool,
}

impl HarnessConfig {
    #[must_use]
    pub fn default_paths() -> Self {
        let fixture_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures");
        Self {
            input_root: fixture_root.join("inputs"),
            output_root: fixture_root.join("expected"),
            format: MatrixFileFormat::ArmaAscii,
            family_filter: Vec::new(),
            read_inputs_from_disk: false,
        }
    }

    /// Apply `FXG_INPUT_ROOT`, `FXG_OUTPUT_ROOT` and `FXG_FORMAT`.
    pub fn with_env_overrides(self) -> Result<Self, String> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        if let Some(root) = lookup("FXG_INPUT_ROOT") {
            self.input_root = PathBuf::from(root);
        }
        if let Some(root) = lookup("FXG_OUTPUT_ROOT") {
            self.output_root = PathBuf::from(root);
        }
        if let Some(token) = lookup("FXG_FORMAT") {
            self.format = MatrixFileFormat::from_token(&token)
                .map_err(|err| format!("FXG_FORMAT: {err}"))?;
        }
        Ok(self)
    }

    pub fn with_cli(mut self, options: &CliOptions) -> Result<Self, String> {
        if let Some(root) = &options.input_root {
            self.input_root.clone_from(root);
        }
        if let Some(root) = &options.output_root {
            self.output_root.clone_from(root);
        }
        if let Some(token) = &options.format {
            self.format =
                MatrixFileFormat::from_token(token).map_err(|err| format!("--format: {err}"))?;
        }
        if !options.families.is_empty() {
            self.family_filter.clone_from(&options.families);
        }
        self.read_inputs_from_disk |= options.from_disk;
        Ok(self)
    }

    #[must_use]
    pub fn selects(&self, family: &dyn ExpectedFamily) -> bool {
        self.family_filter.is_empty()
            || self
                .family_filter
                .iter()
                .any(|wanted| wanted == family.name() || *wanted == family.prefix())
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::default_paths()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub input_root: Option<PathBuf>,
    pub output_root: Option<PathBuf>,
    pub format: Option<String>,
    pub families: Vec<String>,
    pub from_disk: bool,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Run(CliOptions),
    Help,
}

/// Parse the flags shared by every binary. `--family` may repeat.
pub fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliCommand, String> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--input-root" => options.input_root = Some(PathBuf::from(value("--input-root")?)),
            "--output-root" => options.output_root = Some(PathBuf::from(value("--output-root")?)),
            "--format" => options.format = Some(value("--format")?),
            "--family" => options.families.push(value("--family")?),
            "--log-path" => options.log_path = Some(PathBuf::from(value("--log-path")?)),
            "--from-disk" => options.from_disk = true,
            "--help" | "-h" => return Ok(CliCommand::Help),
            unknown => return Err(format!("unknown argument: {unknown}")),
        }
    }
    Ok(CliCommand::Run(options))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub suite: &'static str,
    pub case_count: usize,
    pub pass_count: usize,
    pub failures: Vec<String>,
}

impl SuiteReport {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.case_count == self.pass_count && self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub format: MatrixFileFormat,
    pub runs: Vec<FamilyRun>,
    pub summary: Vec<FamilySummary>,
    pub reasons: BTreeMap<&'static str, usize>,
    pub artifacts: Vec<Artifact>,
}

impl GenerationReport {
    #[must_use]
    pub fn written(&self) -> usize {
        self.summary.iter().map(|s| s.written).sum()
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.summary.iter().map(|s| s.skipped).sum()
    }

    #[must_use]
    pub fn suppressed(&self) -> usize {
        self.summary.iter().map(|s| s.suppressed).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    pub file: String,
    pub prefix: String,
    pub op: String,
    pub suffix: String,
    pub rows: usize,
    pub cols: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFamily {
    pub prefix: String,
    pub written: usize,
    pub skipped: usize,
    pub suppressed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureManifest {
    pub schema_version: u32,
    pub format: String,
    pub artifacts: Vec<ManifestArtifact>,
    pub families: Vec<ManifestFamily>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

fn file_digest(path: &Path) -> Result<String, String> {
    let bytes =
        fs::read(path).map_err(|err| format!("failed reading {}: {err}", path.display()))?;
    Ok(sha256_hex(&bytes))
}

/// Write every matrix-valued input to `cfg.input_root`. Returns the file count.
pub fn generate_inputs(cfg: &HarnessConfig) -> Result<usize, String> {
    let written = InputCatalog::in_memory()
        .write_directory(&cfg.input_root, cfg.format)
        .map_err(|err| format!("writing inputs: {err}"))?;
    Ok(written.len())
}

fn load_catalog(cfg: &HarnessConfig) -> Result<InputCatalog, String> {
    if cfg.read_inputs_from_disk {
        InputCatalog::from_directory(&cfg.input_root, cfg.format).map_err(|err| {
            format!(
                "reading inputs from {}: {err} (run generate_inputs first)",
                cfg.input_root.display()
            )
        })
    } else {
        Ok(InputCatalog::in_memory())
    }
}

/// Run every selected family and write its artifacts under `cfg.output_root`.
pub fn generate_expected(cfg: &HarnessConfig) -> Result<GenerationReport, String> {
    let catalog = load_catalog(cfg)?;
    let mut sink = ExpectedSink::new(&cfg.output_root, cfg.format);
    let mut runs = Vec::new();

    for family in registry() {
        if !cfg.selects(family.as_ref()) {
            continue;
        }
        let run = run_family(family.as_ref(), &catalog, &mut sink).map_err(|err| {
            format!("family {} ({}): {err}", family.name(), family.prefix())
        })?;
        maybe_append_run_log(&RunLogEntry::from_run(&run, cfg.format.as_str()))?;
        runs.push(run);
    }

    if runs.is_empty() && !cfg.family_filter.is_empty() {
        return Err(format!(
            "family filter {:?} matched no registered family",
            cfg.family_filter
        ));
    }

    let summary = sink.ledger().summary();
    let reasons = sink.ledger().reason_histogram();
    let (_, artifacts) = sink.into_parts();
    Ok(GenerationReport {
        format: cfg.format,
        runs,
        summary,
        reasons,
        artifacts,
    })
}

/// Hash every artifact in `report` and write `manifest.json` next to them.
pub fn write_manifest(cfg: &HarnessConfig, report: &GenerationReport) -> Result<PathBuf, String> {
    let artifacts = report
        .artifacts
        .iter()
        .map(|artifact| {
            Ok(ManifestArtifact {
                file: artifact.file.clone(),
                prefix: artifact.prefix.clone(),
                op: artifact.op.clone(),
                suffix: artifact.suffix.clone(),
                rows: artifact.rows,
                cols: artifact.cols,
                sha256: file_digest(&artifact.path)?,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    let families = report
        .summary
        .iter()
        .map(|s| ManifestFamily {
            prefix: s.prefix.clone(),
            written: s.written,
            skipped: s.skipped,
            suppressed: s.suppressed,
        })
        .collect();
    let manifest = FixtureManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        format: report.format.as_str().to_string(),
        artifacts,
        families,
    };

    fs::create_dir_all(&cfg.output_root)
        .map_err(|err| format!("failed creating {}: {err}", cfg.output_root.display()))?;
    let path = cfg.output_root.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)
        .map_err(|err| format!("failed serializing manifest: {err}"))?;
    fs::write(&path, json).map_err(|err| format!("failed writing {}: {err}", path.display()))?;
    Ok(path)
}

pub fn load_manifest(cfg: &HarnessConfig) -> Result<FixtureManifest, String> {
    let path = cfg.output_root.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&path)
        .map_err(|err| format!("failed reading {}: {err}", path.display()))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid manifest {}: {err}", path.display()))
}

/// Re-hash every artifact listed in the manifest.
pub fn verify_manifest(cfg: &HarnessConfig) -> Result<SuiteReport, String> {
    let manifest = load_manifest(cfg)?;
    let mut failures = Vec::new();
    let mut pass_count = 0usize;

    if manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        failures.push(format!(
            "manifest schema_version {} != {MANIFEST_SCHEMA_VERSION}",
            manifest.schema_version
        ));
    }

    for artifact in &manifest.artifacts {
        let path = cfg.output_root.join(&artifact.file);
        if !path.exists() {
            failures.push(format!("{}: missing", artifact.file));
            continue;
        }
        let digest = file_digest(&path)?;
        if digest == artifact.sha256 {
            pass_count += 1;
        } else {
            failures.push(format!(
                "{}: sha256 mismatch expected={} actual={digest}",
                artifact.file, artifact.sha256
            ));
        }
    }

    Ok(SuiteReport {
        suite: "fixture_manifest",
        case_count: manifest.artifacts.len(),
        pass_count,
        failures,
    })
}
