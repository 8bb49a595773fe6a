//! # Validate Subcommand
//!
//! `jsv validate --schema <file> <instance>...`
//!
//! The schema file is registered under `jsv://local/<filename>`, next to
//! any schemas loaded with `--schema-dir`, so relative `$ref`s such as
//! `"address.schema.json"` resolve to files in that directory.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Args, ValueEnum};
use jsv_schema::options::DEFAULT_MAX_REFERENCE_DEPTH;
use jsv_schema::{load_dir, load_document, SchemaRegistry, ValidationResult, Validator};
use serde::Serialize;

use crate::Outcome;

/// Arguments for the validate subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Schema file to validate against (JSON or YAML).
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Documents to validate (JSON, or YAML by `.yaml`/`.yml` extension).
    #[arg(required = true)]
    pub instances: Vec<PathBuf>,

    /// Directory of schemas available to cross-file `$ref`s.
    #[arg(long, env = "JSV_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Treat recognized `format` values as assertions.
    #[arg(long, env = "JSV_ASSERT_FORMATS")]
    pub assert_formats: bool,

    /// Maximum nesting of `$ref` followed in one run.
    #[arg(long, default_value_t = DEFAULT_MAX_REFERENCE_DEPTH)]
    pub max_reference_depth: usize,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Include collected annotations in the report.
    #[arg(long)]
    pub annotations: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One line of `--output json`.
#[derive(Serialize)]
struct Report<'a> {
    instance: String,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

/// Validate every instance and write a report to `out`.
///
/// # Errors
///
/// Fails if the schema directory, the schema or an instance cannot be
/// loaded, or the schema fails load-time checks, including a `$ref` that
/// no loaded schema satisfies.
pub fn run_validate(args: &ValidateArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let validator = build_validator(args)?;

    let mut outcome = Outcome::Valid;
    for path in &args.instances {
        let instance = load_document(path)?;
        let result = validator.validate(&instance);
        tracing::debug!(
            instance = %path.display(),
            valid = result.is_valid(),
            errors = result.errors().len(),
            "validated document"
        );
        if !result.is_valid() {
            outcome = Outcome::Invalid;
        }
        match args.output {
            OutputFormat::Text => write_text(out, path, &result, args.annotations)?,
            OutputFormat::Json => {
                let report = Report {
                    instance: path.display().to_string(),
                    result: &result,
                };
                let mut line = serde_json::to_value(&report)?;
                if !args.annotations {
                    if let Some(object) = line.as_object_mut() {
                        object.remove("annotations");
                    }
                }
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(outcome)
}

fn build_validator(args: &ValidateArgs) -> anyhow::Result<Validator> {
    let mut registry = match &args.schema_dir {
        Some(dir) => load_dir(dir)?,
        None => SchemaRegistry::new(),
    };

    let name = file_name(&args.schema)?;
    let schema = load_document(&args.schema)?;
    registry
        .add_document(name, schema)
        .with_context(|| format!("schema '{}' is invalid", args.schema.display()))?;

    let mut opts = jsv_schema::options();
    opts.with_registry(Arc::new(registry))
        .assert_formats(args.assert_formats)
        .max_reference_depth(args.max_reference_depth)
        .collect_annotations(args.annotations);
    Ok(opts.build_for_uri(name)?)
}

fn file_name(path: &Path) -> anyhow::Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("'{}' does not name a file", path.display()))
}

fn write_text(
    out: &mut dyn Write,
    path: &Path,
    result: &ValidationResult,
    annotations: bool,
) -> std::io::Result<()> {
    if result.is_valid() {
        writeln!(out, "{}: valid", path.display())?;
    } else {
        writeln!(out, "{}: invalid", path.display())?;
        writeln!(out, "{}", result.violations())?;
    }
    if annotations {
        for annotation in result.annotations() {
            let at = annotation.instance_path.to_string();
            writeln!(
                out,
                "  {} {}: {}",
                if at.is_empty() { "(root)" } else { at.as_str() },
                annotation.keyword,
                annotation.value
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &serde_json::Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(value).unwrap()).unwrap();
        path
    }

    fn args(schema: PathBuf, instances: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            schema,
            instances,
            schema_dir: None,
            assert_formats: false,
            max_reference_depth: DEFAULT_MAX_REFERENCE_DEPTH,
            output: OutputFormat::Text,
            annotations: false,
        }
    }

    fn run(args: &ValidateArgs) -> (anyhow::Result<Outcome>, String) {
        let mut out = Vec::new();
        let outcome = run_validate(args, &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_valid_and_invalid_instances() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(
            dir.path(),
            "login.schema.json",
            &json!({"type": "object", "required": ["username", "password"]}),
        );
        let good = write(dir.path(), "good.json", &json!({"username": "a", "password": "b"}));
        let bad = write(dir.path(), "bad.json", &json!({"username": "AUser", "location": "UK"}));

        let (outcome, text) = run(&args(schema.clone(), vec![good.clone()]));
        assert_eq!(outcome.unwrap(), Outcome::Valid);
        assert!(text.ends_with("good.json: valid\n"));

        let (outcome, text) = run(&args(schema, vec![good, bad]));
        assert_eq!(outcome.unwrap(), Outcome::Invalid);
        assert!(text.contains("bad.json: invalid\n  (root): \"password\" is a required property"));
    }

    #[test]
    fn test_schema_dir_references() {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        std::fs::create_dir(&schemas).unwrap();
        write(&schemas, "name.schema.json", &json!({"type": "string", "minLength": 1}));
        let schema = write(
            dir.path(),
            "person.schema.json",
            &json!({"properties": {"name": {"$ref": "name.schema.json"}}}),
        );
        let doc = write(dir.path(), "doc.json", &json!({"name": ""}));

        let mut a = args(schema, vec![doc]);
        let (outcome, text) = run(&a);
        let err = outcome.unwrap_err().to_string();
        assert!(err.contains("unresolvable reference"), "{err}");
        assert!(err.contains("name.schema.json"), "{err}");
        assert!(text.is_empty());

        a.schema_dir = Some(schemas);
        let (outcome, text) = run(&a);
        assert_eq!(outcome.unwrap(), Outcome::Invalid);
        assert!(text.contains("/name: \"\" is shorter than 1 character"));
    }

    #[test]
    fn test_json_output() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "n.json", &json!({"type": "number", "title": "N"}));
        let doc = write(dir.path(), "doc.json", &json!("seven"));
        let mut a = args(schema, vec![doc]);
        a.output = OutputFormat::Json;

        let (_, text) = run(&a);
        let line: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(line["valid"], json!(false));
        assert_eq!(line["errors"][0]["keyword"], json!("type"));
        assert!(line.get("annotations").is_none());
    }

    #[test]
    fn test_annotations_flag() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "n.json", &json!({"type": "number", "title": "Amount"}));
        let doc = write(dir.path(), "doc.json", &json!(7));
        let mut a = args(schema, vec![doc]);
        a.annotations = true;
        let (_, text) = run(&a);
        assert!(text.contains("  (root) title: \"Amount\""));
    }

    #[test]
    fn test_yaml_instance() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "s.json", &json!({"required": ["name"]}));
        let doc = dir.path().join("doc.yaml");
        std::fs::write(&doc, "name: Ada\n").unwrap();
        let (outcome, _) = run(&args(schema, vec![doc]));
        assert_eq!(outcome.unwrap(), Outcome::Valid);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let schema = write(dir.path(), "bad.json", &json!({"minLength": -1}));
        let doc = write(dir.path(), "doc.json", &json!(1));
        let (outcome, _) = run(&args(schema, vec![doc.clone()]));
        assert!(outcome.unwrap_err().to_string().contains("is invalid"));

        let schema = write(dir.path(), "ok.json", &json!({}));
        let (outcome, _) = run(&args(schema, vec![dir.path().join("missing.json")]));
        assert!(outcome.is_err());
    }
}
