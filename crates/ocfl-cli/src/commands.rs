use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use ocfl_build::{BuildPolicy, ObjectBuilder, ObjectOptions, UpdateOptions, VersionMeta};
use ocfl_inventory::{Inventory, User};
use ocfl_store::{read_to_vec, FsStorage, Storage};
use ocfl_types::DigestAlgorithm;
use ocfl_validate::{ObjectValidator, Severity, ValidationOptions};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Create(args) => cmd_create(args, format),
        Command::Build(args) => cmd_build(args, format),
        Command::Update(args) => cmd_update(args, format),
        Command::Validate(args) => cmd_validate(args, format),
        Command::Show(args) => cmd_show(args, format),
    }
}

fn meta(args: &MetaArgs) -> VersionMeta {
    VersionMeta {
        created: None,
        message: args.message.clone(),
        user: args
            .user_name
            .clone()
            .map(|name| User::new(name, args.user_address.clone())),
    }
}

fn parse_algorithm(name: &str) -> anyhow::Result<DigestAlgorithm> {
    name.parse()
        .with_context(|| format!("unknown digest algorithm {name:?}"))
}

fn report_created(inventory: &Inventory, format: OutputFormat) {
    let head = inventory
        .head()
        .map(|v| v.to_string())
        .unwrap_or_default();
    match format {
        OutputFormat::Text => println!(
            "{} {} at {}",
            "✓".green().bold(),
            inventory.id().bold(),
            head.yellow()
        ),
        OutputFormat::Json => println!(
            "{}",
            json!({ "id": inventory.id(), "head": head, "versions": inventory.versions().len() })
        ),
    }
}

fn cmd_create(args: CreateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let target = FsStorage::create(&args.object)?;
    let source = FsStorage::new(&args.source)?;

    let mut opts = ObjectOptions::new(args.id);
    opts.digest_algorithm = parse_algorithm(&args.digest_algorithm)?;
    opts.content_directory = args.content_directory;
    opts.zero_padding_width = args.padding;
    opts.meta = meta(&args.meta);

    let inventory = ObjectBuilder::new(&target, "").create(&source, &opts)?;
    report_created(&inventory, format);
    Ok(())
}

fn cmd_build(args: BuildArgs, format: OutputFormat) -> anyhow::Result<()> {
    let target = FsStorage::create(&args.object)?;
    let source = FsStorage::new(&args.source)?;

    let mut opts = ObjectOptions::new(args.id);
    opts.digest_algorithm = parse_algorithm(&args.digest_algorithm)?;
    opts.content_directory = args.content_directory;
    opts.zero_padding_width = args.padding;
    opts.meta = meta(&args.meta);

    let inventory = ObjectBuilder::new(&target, "").build(&source, &opts)?;
    report_created(&inventory, format);
    Ok(())
}

fn cmd_update(args: UpdateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let target = FsStorage::new(&args.object)?;
    let source = match &args.source {
        Some(path) => Some(FsStorage::new(path)?),
        None => None,
    };

    let opts = UpdateOptions {
        policy: BuildPolicy {
            forward_delta: !args.no_forward_delta,
            dedupe: !args.no_dedupe,
            ..Default::default()
        },
        meta: meta(&args.meta),
        digest_algorithm: args
            .digest_algorithm
            .as_deref()
            .map(parse_algorithm)
            .transpose()?,
        add_fixity: args
            .add_fixity
            .iter()
            .map(|name| parse_algorithm(name))
            .collect::<anyhow::Result<_>>()?,
    };

    let inventory = ObjectBuilder::new(&target, "")
        .update(source.as_ref().map(|s| s as &dyn Storage), &opts)?;
    report_created(&inventory, format);
    Ok(())
}

fn cmd_validate(args: ValidateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let storage = FsStorage::new(&args.object)?;
    let opts = ValidationOptions {
        lax_digests: args.lax_digests,
        max_diagnostics: args.max_diagnostics,
    };
    let report = ObjectValidator::new(&storage, opts).validate_object("")?;

    match format {
        OutputFormat::Text => {
            for diagnostic in report.log.diagnostics() {
                let code = match diagnostic.severity {
                    Severity::Error => diagnostic.code.to_string().red().bold(),
                    Severity::Warning => diagnostic.code.to_string().yellow(),
                };
                let params: Vec<String> = diagnostic
                    .params
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                println!("  {} {}", code, params.join(" "));
            }
            if report.log.truncated() {
                println!("  (diagnostic list truncated)");
            }
            let verdict = if report.passed() {
                "valid".green().bold()
            } else {
                "invalid".red().bold()
            };
            println!(
                "{} {} ({} error(s), {} warning(s))",
                verdict,
                report.id.as_deref().unwrap_or(&args.object).bold(),
                report.log.error_count(),
                report.log.warning_count()
            );
        }
        OutputFormat::Json => {
            let diagnostics: Vec<_> = report
                .log
                .diagnostics()
                .iter()
                .map(|d| json!({ "code": d.code.to_string(), "params": d.params }))
                .collect();
            println!(
                "{}",
                json!({
                    "id": report.id,
                    "passed": report.passed(),
                    "errors": report.log.error_count(),
                    "warnings": report.log.warning_count(),
                    "truncated": report.log.truncated(),
                    "diagnostics": diagnostics,
                })
            );
        }
    }

    if !report.passed() {
        anyhow::bail!(
            "object failed validation with {} error(s)",
            report.log.error_count()
        );
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let storage = FsStorage::new(&args.object)?;
    let bytes = read_to_vec(&storage, "inventory.json")?;
    let inventory = Inventory::from_slice(&bytes)?;

    match format {
        OutputFormat::Text => {
            println!("{}", inventory.id().bold());
            println!("  algorithm: {}", inventory.digest_algorithm());
            println!("  spec: {}", inventory.spec_version().inventory_type());
            if let Some(head) = inventory.head() {
                println!("  head: {}", head.to_string().yellow());
            }
            for (vnum, version) in inventory.versions() {
                println!(
                    "  {}  {}  {}",
                    vnum.to_string().yellow(),
                    version.created.to_rfc3339().dimmed(),
                    version.message.as_deref().unwrap_or("")
                );
            }
        }
        OutputFormat::Json => {
            let versions: Vec<_> = inventory
                .versions()
                .iter()
                .map(|(vnum, version)| {
                    json!({
                        "version": vnum.to_string(),
                        "created": version.created.to_rfc3339(),
                        "message": version.message,
                        "files": version.logical_paths().len(),
                    })
                })
                .collect();
            println!(
                "{}",
                json!({
                    "id": inventory.id(),
                    "digestAlgorithm": inventory.digest_algorithm().as_str(),
                    "head": inventory.head().map(|v| v.to_string()),
                    "versions": versions,
                })
            );
        }
    }
    Ok(())
}
