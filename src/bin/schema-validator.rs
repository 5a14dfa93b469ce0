//! # Plan Validator
//!
//! A command-line utility that checks plan documents against the plan schema
//! before they are sent to a server.
//!
//! ## Usage
//!
//! ### Validate a Single Plan
//!
//! ```bash
//! cargo run --bin schema-validator plans/plan.json
//! ```
//!
//! ### Validate All Plans in a Directory
//!
//! ```bash
//! cargo run --bin schema-validator ./plans/
//! ```
//!
//! ### Validate Against Another Schema Definition
//!
//! ```bash
//! cargo run --bin schema-validator --schema my-schema.json ./plans/
//! ```
//!
//! ## Output Examples
//!
//! ```text
//! Validating plan file: plans/plan.json
//! ✓ Plan is valid!
//!   objectId: 12xvxc345ssdsds-508
//!   planType: inNetwork
//!   Linked plan services: 2
//!   ETag once stored: "k3w...Q"
//! ```
//!
//! ```text
//! Validating plan file: plans/broken.json
//! ❌ Plan is invalid (2 violation(s)):
//!     - planCostShares.copay: expected integer, got string
//!     - linkedPlanServices[0].linkedService.name: is required
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: All plans are valid
//! - `1`: One or more plans are invalid or could not be read

use clap::Parser;
use plan_server::resource::{HttpVersion, RawVersion};
use plan_server::schema::{AcceptedPlan, GateError, PlanSchema};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "schema-validator", about = "Validate plan documents against the plan schema")]
struct Args {
    /// Plan JSON file, or a directory of them
    path: PathBuf,

    /// Schema definition to use instead of the embedded plan schema
    #[arg(long)]
    schema: Option<PathBuf>,
}

enum FileError {
    Unreadable(String),
    Invalid(Vec<String>),
}

fn main() {
    let args = Args::parse();

    let schema = match load_schema(args.schema.as_deref()) {
        Ok(schema) => schema,
        Err(e) => {
            eprintln!("Error: failed to load schema: {}", e);
            process::exit(1);
        }
    };

    let path = args.path.as_path();
    let ok = if path.is_file() {
        validate_single_file(&schema, path)
    } else if path.is_dir() {
        validate_directory(&schema, path)
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        false
    };

    if !ok {
        process::exit(1);
    }
}

fn load_schema(path: Option<&Path>) -> Result<PlanSchema, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(PlanSchema::from_json(&fs::read_to_string(path)?)?),
        None => Ok(PlanSchema::new()?),
    }
}

fn validate_single_file(schema: &PlanSchema, file_path: &Path) -> bool {
    println!("Validating plan file: {}", file_path.display());

    match load_and_validate_plan(schema, file_path) {
        Ok(accepted) => {
            println!("✓ Plan is valid!");
            print_plan_summary(&accepted);
            true
        }
        Err(e) => {
            report_failure(&e, "");
            false
        }
    }
}

fn validate_directory(schema: &PlanSchema, dir_path: &Path) -> bool {
    println!("Validating plans in directory: {}", dir_path.display());

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            return false;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut valid_count = 0;
    let mut error_count = 0;

    for path in &paths {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("\nValidating: {}", name);

        match load_and_validate_plan(schema, path) {
            Ok(accepted) => {
                println!("  ✓ Valid - {}", accepted.object_id());
                valid_count += 1;
            }
            Err(e) => {
                report_failure(&e, "  ");
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid plans: {}", valid_count);
    println!("  Invalid plans: {}", error_count);

    error_count == 0
}

fn load_and_validate_plan(schema: &PlanSchema, path: &Path) -> Result<AcceptedPlan, FileError> {
    let content = fs::read_to_string(path).map_err(|e| FileError::Unreadable(e.to_string()))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| FileError::Unreadable(format!("invalid JSON: {}", e)))?;

    schema.validate(&document).map_err(|rejection| match rejection {
        GateError::Rejected(errors) => {
            FileError::Invalid(errors.into_iter().map(|v| v.to_string()).collect())
        }
        GateError::ModelMismatch(detail) => FileError::Invalid(vec![detail]),
    })
}

fn report_failure(error: &FileError, indent: &str) {
    match error {
        FileError::Unreadable(message) => {
            eprintln!("{}❌ Could not read plan: {}", indent, message);
        }
        FileError::Invalid(violations) => {
            eprintln!(
                "{}❌ Plan is invalid ({} violation(s)):",
                indent,
                violations.len()
            );
            for violation in violations {
                eprintln!("{}    - {}", indent, violation);
            }
        }
    }
}

fn print_plan_summary(accepted: &AcceptedPlan) {
    let plan = accepted.plan();
    println!("  objectId: {}", plan.object_id);
    println!("  planType: {}", plan.plan_type);
    println!("  Linked plan services: {}", plan.linked_plan_services.len());
    if !plan.extra.is_empty() {
        let extra: Vec<&str> = plan.extra.keys().map(String::as_str).collect();
        println!("  Additional members: {}", extra.join(", "));
    }
    println!(
        "  ETag once stored: {}",
        HttpVersion::from(RawVersion::from_content(accepted.canonical_bytes()))
    );
}
