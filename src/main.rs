use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ifc_checker::config::CheckerConfig;
use ifc_checker::export::{export_ifc, export_result_csv, export_result_json, ExportMode};
use ifc_checker::format::parse_literal;
use ifc_checker::ids::load_ids;
use ifc_checker::model::{EditHistory, PropertyValue};
use ifc_checker::parser::load_model;
use ifc_checker::validation::{builtin::basic_pack, spawn_validation, RulePack, ValidationResult};

#[derive(Parser, Debug)]
#[command(name = "ifc-checker")]
#[command(about = "IFC Checker - validate and edit property sets in IFC files")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to ./.ifccheck.json if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a short summary of a model
    Inspect {
        /// Path to IFC file
        file: PathBuf,
    },

    /// Check a model against a rule pack
    Validate {
        /// Path to IFC file
        file: PathBuf,

        /// JSON rule pack
        #[arg(long, value_name = "FILE", conflicts_with = "ids")]
        rules: Option<PathBuf>,

        /// IDS document, converted to a rule pack
        #[arg(long, value_name = "FILE")]
        ids: Option<PathBuf>,

        /// Write the result as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Write the issues as CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },

    /// Apply property edits and write a new IFC file
    Export {
        /// Path to IFC file
        file: PathBuf,

        /// Output IFC file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Edit as <expressId>:<Pset>.<Property>=<value>
        #[arg(long = "set", value_name = "EDIT", value_parser = parse_edit)]
        edits: Vec<PropertyEdit>,

        /// Regenerate edited records instead of patching in place
        #[arg(long)]
        rewrite: bool,
    },
}

#[derive(Debug, Clone)]
struct PropertyEdit {
    express_id: u64,
    pset: String,
    property: String,
    value: PropertyValue,
}

fn parse_edit(s: &str) -> Result<PropertyEdit, String> {
    let (id, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("expected <expressId>:<Pset>.<Property>=<value>, got '{s}'"))?;
    let express_id = id
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("invalid express id '{id}'"))?;
    let (path, raw) = rest
        .split_once('=')
        .ok_or_else(|| format!("missing '=' in '{s}'"))?;
    let (pset, property) = path
        .split_once('.')
        .ok_or_else(|| format!("expected <Pset>.<Property>, got '{path}'"))?;

    // STEP literals are taken as such, anything else is a plain string
    let value = parse_literal(raw).unwrap_or_else(|| PropertyValue::String(raw.to_string()));

    Ok(PropertyEdit {
        express_id,
        pset: pset.to_string(),
        property: property.to_string(),
        value,
    })
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = CheckerConfig::resolve(args.config.as_deref())?;

    match args.command {
        Command::Inspect { file } => inspect(&file),
        Command::Validate {
            file,
            rules,
            ids,
            json,
            csv,
        } => {
            let pack = select_rule_pack(rules.as_deref(), ids.as_deref(), &config)?;
            let result = run_validation(&file, pack, &config)?;

            if let Some(json_path) = &json {
                export_result_json(&result, json_path)?;
                println!("Exported to JSON: {}", json_path.display());
            }
            if let Some(csv_path) = &csv {
                export_result_csv(&result, csv_path)?;
                println!("Exported to CSV: {}", csv_path.display());
            }
            if result.has_errors() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Export {
            file,
            output,
            edits,
            rewrite,
        } => {
            let mode = if rewrite {
                ExportMode::Rewrite
            } else {
                config.export_mode
            };
            export(&file, &output, &edits, mode)
        }
    }
}

fn inspect(file: &Path) -> Result<()> {
    let model = load_model(file)?;
    println!("File:     {}", model.file_path);
    println!("Schema:   {}", model.schema);
    println!("Elements: {}", model.total_elements());
    println!("Editable property sets: {}", model.editable_property_sets());
    Ok(())
}

fn select_rule_pack(
    rules: Option<&Path>,
    ids: Option<&Path>,
    config: &CheckerConfig,
) -> Result<RulePack> {
    if let Some(ids_path) = ids {
        let conversion = load_ids(ids_path)?;
        for warning in &conversion.warnings {
            eprintln!("warning: {warning}");
        }
        return Ok(conversion.pack);
    }

    match rules.or(config.default_rule_pack.as_deref()) {
        Some(path) => RulePack::load(path)
            .wrap_err_with(|| format!("loading rule pack {}", path.display())),
        None => Ok(basic_pack()),
    }
}

fn run_validation(file: &Path, pack: RulePack, config: &CheckerConfig) -> Result<ValidationResult> {
    let model = load_model(file)?;
    println!(
        "Validating {} elements against '{}' ({} rules)",
        model.total_elements(),
        pack.name,
        pack.rules.len()
    );

    let task = spawn_validation(model.snapshot(), pack, config.progress_interval);
    let result = task.wait(|percent| eprint!("\rProgress: {percent:>3}%"))?;
    eprintln!();

    println!(
        "{} passed, {} failed ({} errors, {} warnings)",
        result.passed,
        result.failed(),
        result.errors,
        result.warnings
    );
    for issue in &result.issues {
        println!(
            "  #{} {} [{}] {}: expected {}, got {}",
            issue.express_id,
            issue.ifc_class,
            issue.rule_id,
            issue.property_path,
            issue.expected,
            issue.actual
        );
    }
    Ok(result)
}

fn export(file: &Path, output: &Path, edits: &[PropertyEdit], mode: ExportMode) -> Result<()> {
    if edits.is_empty() {
        return Err(eyre!("nothing to export, pass at least one --set"));
    }

    let mut model = load_model(file)?;
    let mut history = EditHistory::new();
    for edit in edits {
        history
            .apply(
                &mut model,
                &[edit.express_id],
                &edit.pset,
                &edit.property,
                edit.value.clone(),
            )
            .wrap_err_with(|| format!("applying edit to #{}", edit.express_id))?;
    }

    let blob = export_ifc(&model, mode)?;
    blob.write_to(output)?;
    println!(
        "Exported to IFC ({:?}): {}",
        blob.strategy,
        output.display()
    );
    Ok(())
}
