use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use jrewrite_config::{init_tracing, load_for_dir, ConfigDiagnostics, JrewriteConfig};
use jrewrite_recipe::{Change, Recipe, RecipeRegistry, RewriteRule};
use jrewrite_syntax::{parse_java, print_java, render_outline, ParseError};
use serde::Serialize;
use similar::TextDiff;

#[derive(Parser)]
#[command(name = "jrewrite", version, about = "Migrate JUnit 4 tests to JUnit 5")]
struct Cli {
    /// Config file to use instead of the discovered `jrewrite.toml`
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a recipe to Java files, rewriting them in place
    Rewrite(RewriteArgs),
    /// Print the effective annotation rules
    Rules(RulesArgs),
    /// Print the parsed structure of a single file
    Parse(ParseArgs),
}

#[derive(Args)]
struct RewriteArgs {
    /// Files or directories (searched for `*.java`)
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Recipe to run (defaults to `recipe.name` from the config)
    #[arg(long)]
    recipe: Option<String>,
    /// Write nothing; exit with 1 if any file would change
    #[arg(long)]
    check: bool,
    /// Print a unified diff for every changed file
    #[arg(long)]
    diff: bool,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RulesArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ParseArgs {
    file: PathBuf,
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Rewrite(args) => rewrite(&config, args),
        Command::Rules(args) => {
            let rules = config
                .recipe
                .rule_table()
                .context("invalid rule configuration")?;
            if args.json {
                let rules: Vec<&RewriteRule> = rules.iter().collect();
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                for rule in rules.iter() {
                    println!("{rule} ({})", rule.modifier_policy());
                }
            }
            Ok(0)
        }
        Command::Parse(args) => {
            let text = read_source(&args.file)?;
            match parse_java(&text) {
                Ok(unit) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&unit)?);
                    } else {
                        print!("{}", render_outline(&unit));
                    }
                    Ok(0)
                }
                Err(err) => {
                    let failure = ParseFailure::new(&args.file, &text, &err);
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&failure)?);
                    } else {
                        println!("{failure}");
                    }
                    Ok(1)
                }
            }
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<JrewriteConfig> {
    let (config, path, diagnostics) = match explicit {
        Some(path) => {
            let (config, diagnostics) = JrewriteConfig::load_from_path_with_diagnostics(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            (config, Some(path.to_path_buf()), diagnostics)
        }
        None => {
            let cwd = std::env::current_dir().context("failed to read the current directory")?;
            load_for_dir(&cwd).context("failed to load jrewrite.toml")?
        }
    };

    init_tracing(&config.logging);
    if let Some(path) = &path {
        tracing::debug!(target: "jrewrite.cli", path = %path.display(), "loaded config");
    }
    report_diagnostics(&diagnostics);
    Ok(config)
}

fn report_diagnostics(diagnostics: &ConfigDiagnostics) {
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "jrewrite.cli", key = %key, "unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "jrewrite.cli", "{warning}");
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum FileStatus {
    Changed,
    Unchanged,
    Failed,
}

#[derive(Debug, Serialize)]
struct FileOutcome {
    path: String,
    status: FileStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct RewriteSummary {
    recipe: String,
    check: bool,
    changed: usize,
    failed: usize,
    files: Vec<FileOutcome>,
}

fn rewrite(config: &JrewriteConfig, args: RewriteArgs) -> Result<i32> {
    let rules = config
        .recipe
        .rule_table()
        .context("invalid rule configuration")?;
    let registry = RecipeRegistry::with_defaults(rules);
    let name = args.recipe.as_deref().unwrap_or(&config.recipe.name);
    let recipe = registry.get(name).with_context(|| {
        let available: Vec<&str> = registry.names().collect();
        format!("unknown recipe `{name}` (available: {})", available.join(", "))
    })?;

    let files = collect_java_files(&args.paths)?;
    tracing::debug!(target: "jrewrite.cli", recipe = name, files = files.len(), "rewriting");

    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let text = read_source(path)?;
        let outcome = rewrite_file(recipe, path, &text, &args)?;
        outcomes.push(outcome);
    }

    let summary = RewriteSummary {
        recipe: recipe.name().to_string(),
        check: args.check,
        changed: count(&outcomes, |s| matches!(s, FileStatus::Changed)),
        failed: count(&outcomes, |s| matches!(s, FileStatus::Failed)),
        files: outcomes,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    let exit = if summary.failed > 0 || (args.check && summary.changed > 0) {
        1
    } else {
        0
    };
    Ok(exit)
}

fn count(outcomes: &[FileOutcome], pred: impl Fn(&FileStatus) -> bool) -> usize {
    outcomes.iter().filter(|o| pred(&o.status)).count()
}

fn rewrite_file(
    recipe: &dyn Recipe,
    path: &Path,
    text: &str,
    args: &RewriteArgs,
) -> Result<FileOutcome> {
    let display = path.display().to_string();
    let failed = |error: String| FileOutcome {
        path: display.clone(),
        status: FileStatus::Failed,
        changes: Vec::new(),
        diff: None,
        error: Some(error),
    };

    let mut unit = match parse_java(text) {
        Ok(unit) => unit,
        Err(err) => {
            let pos = err.line_col(text);
            tracing::warn!(target: "jrewrite.cli", path = %path.display(), error = %err, "parse failed");
            return Ok(failed(format!("{pos}: {err}")));
        }
    };

    let report = match recipe.apply(&mut unit) {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!(target: "jrewrite.cli", path = %path.display(), error = %err, "rewrite failed");
            return Ok(failed(err.to_string()));
        }
    };

    let rewritten = print_java(&unit).with_context(|| format!("failed to print {display}"))?;
    if report.is_empty() || rewritten == text {
        return Ok(FileOutcome {
            path: display,
            status: FileStatus::Unchanged,
            changes: Vec::new(),
            diff: None,
            error: None,
        });
    }

    if !args.check {
        std::fs::write(path, &rewritten).with_context(|| format!("failed to write {display}"))?;
    }
    tracing::info!(target: "jrewrite.cli", path = %path.display(), changes = report.len(), "rewrote file");

    let diff = args.diff.then(|| {
        TextDiff::from_lines(text, &rewritten)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{display}"), &format!("b/{display}"))
            .to_string()
    });

    Ok(FileOutcome {
        path: display,
        status: FileStatus::Changed,
        changes: report.changes,
        diff,
        error: None,
    })
}

fn print_summary(summary: &RewriteSummary) {
    let verb = if summary.check { "would rewrite" } else { "rewrote" };
    for file in &summary.files {
        match file.status {
            FileStatus::Unchanged => {}
            FileStatus::Changed => {
                println!("{verb} {}", file.path);
                for change in &file.changes {
                    println!("  {change}");
                }
                if let Some(diff) = &file.diff {
                    print!("{diff}");
                }
            }
            FileStatus::Failed => {
                eprintln!(
                    "error: {}: {}",
                    file.path,
                    file.error.as_deref().unwrap_or("failed")
                );
            }
        }
    }
    let changed = if summary.check { "would change" } else { "changed" };
    println!(
        "{}: {} {changed}, {} failed, {} total",
        summary.recipe,
        summary.changed,
        summary.failed,
        summary.files.len()
    );
}

fn collect_java_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("no such file or directory: {}", path.display());
        }
        let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension() == Some(OsStr::new("java")))
            .map(walkdir::DirEntry::into_path)
            .collect();
        found.sort();
        files.extend(found);
    }
    files.dedup();
    Ok(files)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[derive(Debug, Serialize)]
struct ParseFailure {
    path: String,
    line: u32,
    column: u32,
    message: String,
}

impl ParseFailure {
    fn new(path: &Path, text: &str, err: &ParseError) -> Self {
        let pos = err.line_col(text);
        Self {
            path: path.display().to_string(),
            line: pos.line + 1,
            column: pos.col + 1,
            message: err.message.clone(),
        }
    }
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}: error: {}", self.path, self.line, self.column, self.message)
    }
}
