use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use flatland_core::{FlatPair, Schema, Value, validate_schema};
use flatland_defs::{FormDefinition, SchemaRegistry};

/// Encoding for flat `(key, text)` pairs.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PairFormat {
    /// One `key=text` per line.
    Lines,
    /// A JSON array of `[key, text]` arrays.
    Json,
}

/// Encoding for native documents.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum DocumentFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "flatland")]
#[command(about = "Bind, flatten and validate form data against schema definitions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Flatten a JSON document into form pairs.
    Flatten(FlattenArgs),
    /// Rehydrate form pairs into a document.
    Unflatten(UnflattenArgs),
    /// Validate form pairs and report every failure.
    Validate(ValidateArgs),
    /// Check definition files and directories for errors.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct FormArgs {
    /// Definition file (YAML or JSON).
    #[arg(long, conflicts_with = "registry")]
    definition: Option<PathBuf>,
    /// Directory of definition files; use with --form.
    #[arg(long, requires = "form")]
    registry: Option<PathBuf>,
    /// Form name within the registry.
    #[arg(long)]
    form: Option<String>,
    /// Separator overriding the definition's own.
    #[arg(long)]
    separator: Option<char>,
}

#[derive(Debug, Args)]
struct FlattenArgs {
    #[command(flatten)]
    form: FormArgs,
    /// JSON document to read (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output encoding.
    #[arg(long, default_value = "lines")]
    format: PairFormat,
}

#[derive(Debug, Args)]
struct UnflattenArgs {
    #[command(flatten)]
    form: FormArgs,
    /// Pairs to read (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Input encoding.
    #[arg(long, default_value = "lines")]
    input_format: PairFormat,
    /// Output encoding.
    #[arg(long, default_value = "json")]
    format: DocumentFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    form: FormArgs,
    /// Pairs to read (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Input encoding.
    #[arg(long, default_value = "lines")]
    input_format: PairFormat,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Definition files and/or directories of definition files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

struct LoadedForm {
    schema: Schema,
    separator: char,
}

impl FormArgs {
    fn load(&self) -> Result<LoadedForm, String> {
        let definition = match (&self.definition, &self.registry, &self.form) {
            (Some(path), _, _) => FormDefinition::load(path)
                .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?,
            (None, Some(dir), Some(name)) => SchemaRegistry::from_dir(dir)
                .map_err(|err| format!("Failed to load registry '{}': {err}", dir.display()))?
                .get(name)
                .cloned()
                .ok_or_else(|| format!("Unknown form '{name}' in '{}'", dir.display()))?,
            _ => return Err("Specify --definition, or --registry with --form".to_string()),
        };
        let schema = definition.to_schema().map_err(|err| err.to_string())?;
        Ok(LoadedForm {
            schema,
            separator: self.separator.unwrap_or(definition.separator),
        })
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Flatten(args) => run_flatten(args),
        Command::Unflatten(args) => run_unflatten(args),
        Command::Validate(args) => run_validate(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_flatten(args: FlattenArgs) -> Result<(), String> {
    let form = args.form.load()?;
    let raw = read_input(args.input.as_deref())?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).map_err(|err| format!("Invalid JSON input: {err}"))?;

    let el = form
        .schema
        .create_with(Value::from(json))
        .map_err(|err| err.to_string())?;
    print!("{}", format_pairs(&el.flatten_with(form.separator), args.format)?);
    Ok(())
}

fn run_unflatten(args: UnflattenArgs) -> Result<(), String> {
    let form = args.form.load()?;
    let raw = read_input(args.input.as_deref())?;
    let pairs = parse_pairs(&raw, args.input_format)?;

    let el = form
        .schema
        .from_flat_with(pairs, form.separator)
        .map_err(|err| err.to_string())?;
    let document = el.value().to_json();
    let out = match args.format {
        DocumentFormat::Json => serde_json::to_string_pretty(&document)
            .map(|s| s + "\n")
            .map_err(|err| format!("Failed to serialize output: {err}"))?,
        DocumentFormat::Yaml => serde_yaml::to_string(&document)
            .map_err(|err| format!("Failed to serialize output: {err}"))?,
    };
    print!("{out}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let form = args.form.load()?;
    let raw = read_input(args.input.as_deref())?;
    let pairs = parse_pairs(&raw, args.input_format)?;

    let mut el = form
        .schema
        .from_flat_with(pairs, form.separator)
        .map_err(|err| err.to_string())?;
    if el.validate() {
        println!("valid");
        return Ok(());
    }

    let errors = el.all_errors();
    for (name, message) in &errors {
        let name = if name.is_empty() { "<form>" } else { name.as_str() };
        println!("{name}: {message}");
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let mut checked = 0usize;
    let mut problems = 0usize;

    for input in &args.inputs {
        let definitions: Vec<(String, FormDefinition)> = if input.is_dir() {
            let registry = SchemaRegistry::from_dir(input)
                .map_err(|err| format!("Failed to load registry '{}': {err}", input.display()))?;
            registry
                .names()
                .into_iter()
                .filter_map(|name| registry.get(name).map(|def| (name.to_string(), def.clone())))
                .collect()
        } else {
            let definition = FormDefinition::load(input)
                .map_err(|err| format!("Failed to load '{}': {err}", input.display()))?;
            vec![(input.display().to_string(), definition)]
        };

        for (label, definition) in definitions {
            checked += 1;
            let schema = match definition.to_schema() {
                Ok(schema) => schema,
                Err(err) => {
                    println!("{label}: {err}");
                    problems += 1;
                    continue;
                }
            };
            for issue in validate_schema(&schema) {
                let path = if issue.path.is_empty() { "<root>" } else { issue.path.as_str() };
                println!("{label}: {path}: {}", issue.message);
                problems += 1;
            }
        }
    }

    if problems > 0 {
        return Err(format!("{problems} problem(s) in {checked} definition(s)"));
    }
    println!("Checked {checked} definition(s).");
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(raw)
        }
    }
}

fn parse_pairs(raw: &str, format: PairFormat) -> Result<Vec<FlatPair>, String> {
    match format {
        PairFormat::Lines => Ok(raw
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once('=') {
                Some((key, text)) => (key.to_string(), text.to_string()),
                None => (line.to_string(), String::new()),
            })
            .collect()),
        PairFormat::Json => serde_json::from_str(raw).map_err(|err| format!("Invalid pair list: {err}")),
    }
}

fn format_pairs(pairs: &[FlatPair], format: PairFormat) -> Result<String, String> {
    match format {
        PairFormat::Lines => Ok(pairs
            .iter()
            .map(|(key, text)| format!("{key}={text}\n"))
            .collect()),
        PairFormat::Json => serde_json::to_string_pretty(pairs)
            .map(|s| s + "\n")
            .map_err(|err| format!("Failed to serialize output: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let pairs = parse_pairs("a=1\r\n\nb\nc=x=y\n", PairFormat::Lines).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), String::new()),
                ("c".to_string(), "x=y".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_json_pairs() {
        let pairs = parse_pairs(r#"[["a", "1"], ["a", "2"]]"#, PairFormat::Json).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(parse_pairs(r#"{"a": "1"}"#, PairFormat::Json).is_err());
    }

    #[test]
    fn test_format_lines() {
        let pairs = vec![("a".to_string(), "1".to_string())];
        assert_eq!(format_pairs(&pairs, PairFormat::Lines).unwrap(), "a=1\n");
    }
}
