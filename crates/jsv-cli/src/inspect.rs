//! # Schema Inspection Subcommands
//!
//! `jsv check-schema <file>...` compiles schema files and reports load-time
//! errors. `jsv list --schema-dir <dir>` lists a schema directory.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use jsv_schema::{load_document, SchemaCatalog, SchemaRegistry};

use crate::Outcome;

/// Arguments for the check-schema subcommand.
#[derive(Args, Debug)]
pub struct CheckSchemaArgs {
    /// Schema files to check.
    #[arg(required = true)]
    pub schemas: Vec<PathBuf>,
}

/// Arguments for the list subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory of schemas.
    #[arg(long, env = "JSV_SCHEMA_DIR")]
    pub schema_dir: PathBuf,
}

/// Compile each schema on its own and report the first load-time error of
/// each. A `$ref` into the schema itself must resolve; references to other
/// files are not followed.
///
/// # Errors
///
/// Fails if a file cannot be read or is not JSON/YAML.
pub fn run_check_schema(args: &CheckSchemaArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let mut outcome = Outcome::Valid;
    for path in &args.schemas {
        let document = load_document(path)?;
        let uri = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("schema.json");
        match SchemaRegistry::new().add_document(uri, document) {
            Ok(_) => writeln!(out, "{}: ok", path.display())?,
            Err(e) => {
                outcome = Outcome::Invalid;
                writeln!(out, "{}: {} [{}]", path.display(), e, e.code())?;
            }
        }
    }
    Ok(outcome)
}

/// Load a schema directory and list each schema with its `$id`.
///
/// # Errors
///
/// Fails if the directory or any schema in it cannot be loaded.
pub fn run_list(args: &ListArgs, out: &mut dyn Write) -> anyhow::Result<Outcome> {
    let catalog = SchemaCatalog::new(&args.schema_dir)?;
    writeln!(
        out,
        "{} schema(s) in {}",
        catalog.schema_count(),
        catalog.schema_dir().display()
    )?;
    for name in catalog.schema_names() {
        let id = catalog
            .get_schema(name)
            .and_then(|schema| schema.get("$id"))
            .and_then(|id| id.as_str());
        match id {
            Some(id) => writeln!(out, "  {name}  {id}")?,
            None => writeln!(out, "  {name}")?,
        }
    }
    Ok(Outcome::Valid)
}
