//! rstatus CLI
//!
//! Entry point for the `rstatus` command-line tool.

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use resource_status::config::{
    overlay_from_pairs, EffectiveConfig, OutputFormat, Settings, PROJECT_CONFIG_PATH,
};
use resource_status::error::Error;
use resource_status::fieldmask::Mask;
use resource_status::model::{
    AnyResource, AuditEventExport, CapacityBlockGroup, CapacityInterval, Endpoint,
    FullUpdateResetMask, Job, Resource, ResourceKind, ResourceMetadata, StateInfo, Transition,
    TransitionPolicy,
};
use resource_status::store::StoreError;
use resource_status::{ensure_reset_mask, logging, FileStore, Metadata, Observer, StoredRecord};

#[derive(Parser)]
#[command(name = "rstatus")]
#[command(about = "Lifecycle status of AI/compute resources", version)]
struct Cli {
    /// Path to project config file (default: .rstatus.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Record store directory (overrides store.root)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Override a config key, e.g. --set log.level=debug
    #[arg(long = "set", value_name = "KEY=VALUE", global = true, value_parser = parse_key_value)]
    set: Vec<(String, String)>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lifecycle table of a resource kind
    States {
        /// Resource kind (job, endpoint, capacity_block_group, ...)
        kind: ResourceKind,
    },

    /// Create a record from a JSON document with `metadata` and `spec`
    Create {
        kind: ResourceKind,

        /// JSON file, or - for stdin
        #[arg(long, short = 'f')]
        file: PathBuf,
    },

    /// Show one record
    Show { kind: ResourceKind, id: String },

    /// List records of a kind
    List { kind: ResourceKind },

    /// Apply an observed status to a record
    Observe {
        kind: ResourceKind,
        id: String,

        /// Status JSON file, or - for stdin
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Transition policy (overrides observe.policy)
        #[arg(long)]
        policy: Option<TransitionPolicy>,
    },

    /// Delete a record
    Delete { kind: ResourceKind, id: String },

    /// Field mask utilities
    Mask {
        #[command(subcommand)]
        action: MaskCommands,
    },

    /// Print the effective configuration with provenance
    Config,
}

#[derive(Subcommand)]
enum MaskCommands {
    /// Parse a mask and print its normal form
    Parse { mask: String },

    /// Print the full-update reset mask of a spec
    Reset {
        kind: ResourceKind,

        /// Spec JSON file, or - for stdin
        #[arg(long, short = 'f')]
        file: PathBuf,
    },
}

/// Loaded configuration shared by every command
struct Context {
    config: EffectiveConfig,
    settings: Settings,
}

impl Context {
    fn json(&self) -> bool {
        self.settings.output == OutputFormat::Json
    }

    fn store(&self) -> Result<FileStore, Error> {
        Ok(FileStore::open(&self.settings.store_root)?)
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' in '{}'", s))?;
    if key.trim().is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() {
    let cli = Cli::parse();

    let ctx = match load_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    };

    logging::init(&ctx.settings.log_level, ctx.settings.log_format);
    tracing::debug!(store = %ctx.settings.store_root.display(), policy = %ctx.settings.policy, "configuration loaded");

    let result = match cli.command {
        Commands::States { kind } => run_states(&ctx, kind),
        Commands::Create { kind, file } => run_create(&ctx, kind, &file),
        Commands::Show { kind, id } => run_show(&ctx, kind, &id),
        Commands::List { kind } => run_list(&ctx, kind),
        Commands::Observe {
            kind,
            id,
            file,
            policy,
        } => run_observe(&ctx, kind, &id, &file, policy),
        Commands::Delete { kind, id } => run_delete(&ctx, kind, &id),
        Commands::Mask { action } => match action {
            MaskCommands::Parse { mask } => run_mask_parse(&ctx, &mask),
            MaskCommands::Reset { kind, file } => run_mask_reset(&ctx, kind, &file),
        },
        Commands::Config => run_config(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn load_context(cli: &Cli) -> Result<Context, Error> {
    if let Some(ref path) = cli.config {
        if !path.exists() {
            return Err(Error::Usage(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }
    let project_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_PATH));
    let user_path = EffectiveConfig::user_config_path();

    let store_root = cli.store.as_ref().map(|p| p.display().to_string());
    let mut pairs: Vec<(&str, &str)> = cli
        .set
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    if let Some(ref root) = store_root {
        pairs.push(("store.root", root.as_str()));
    }
    if cli.json {
        pairs.push(("output.format", "json"));
    }
    let overrides = (!pairs.is_empty()).then(|| overlay_from_pairs(pairs));

    let config = EffectiveConfig::build(user_path.as_deref(), Some(&project_path), overrides)?;
    let settings = config.settings()?;
    Ok(Context { config, settings })
}

fn read_json(path: &Path) -> Result<Value, Error> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_states(ctx: &Context, kind: ResourceKind) -> Result<(), Error> {
    let states = kind.states();
    let instance_states = kind.instance_states();

    if ctx.json() {
        return print_json(&json!({
            "kind": kind,
            "states": states,
            "instance_states": instance_states,
        }));
    }

    println!("{} states:\n", kind);
    print_state_table(&states);
    if let Some(instance_states) = instance_states {
        println!("\ninstance states:\n");
        print_state_table(&instance_states);
    }
    Ok(())
}

fn print_state_table(states: &[StateInfo]) {
    for state in states {
        let flag = if state.terminal {
            "terminal"
        } else if state.transient {
            "transient"
        } else {
            ""
        };
        let next = if state.successors.is_empty() {
            "-".to_string()
        } else {
            state.successors.join(", ")
        };
        println!("  {:>2}  {:<20} {:<10} -> {}", state.value, state.name, flag, next);
    }
}

fn run_create(ctx: &Context, kind: ResourceKind, file: &Path) -> Result<(), Error> {
    let mut document = read_json(file)?;
    let Some(object) = document.as_object_mut() else {
        return Err(Error::Usage(
            "expected a JSON object with `metadata` and `spec`".to_string(),
        ));
    };
    if object.get("status").is_some_and(|s| !s.is_null()) {
        return Err(StoreError::StatusOnCreate(kind).into());
    }

    let metadata: ResourceMetadata = match object.remove("metadata") {
        Some(value) => serde_json::from_value(value)?,
        None => ResourceMetadata::default(),
    };
    let spec = object.remove("spec").unwrap_or_else(|| json!({}));

    let resource = AnyResource::from_spec_json(kind, metadata, spec)?;
    let record = ctx.store()?.create(resource)?;
    tracing::info!(kind = %kind, id = record.resource.id().unwrap_or_default(), "created record");

    if ctx.json() {
        print_json(&record)
    } else {
        println!("Created {} {}", kind, record.resource.id().unwrap_or_default());
        Ok(())
    }
}

fn run_show(ctx: &Context, kind: ResourceKind, id: &str) -> Result<(), Error> {
    let record = ctx.store()?.get(kind, id)?;
    if ctx.json() {
        return print_json(&record);
    }
    print_record(&record);
    Ok(())
}

fn print_record(record: &StoredRecord) {
    let resource = &record.resource;
    println!("{} {}", resource.kind(), resource.id().unwrap_or("-"));

    if let Some(meta) = resource.metadata() {
        if let Some(ref name) = meta.name {
            println!("  Name: {}", name);
        }
        if let Some(ref parent) = meta.parent_id {
            println!("  Parent: {}", parent);
        }
        if let Some(version) = meta.resource_version {
            println!("  Version: {}", version);
        }
        if let Some(created) = meta.created_at {
            println!("  Created: {}", created.to_rfc3339());
        }
        if !meta.labels.is_empty() {
            let labels: Vec<String> = meta
                .labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("  Labels: {}", labels.join(", "));
        }
    }

    let suffix = if resource.is_terminal() { " (terminal)" } else { "" };
    println!("  State: {}{}", resource.state_name(), suffix);
    println!("  Updated: {} (seq {})", record.updated_at.to_rfc3339(), record.seq);

    let instances = resource.instances();
    if !instances.is_empty() {
        println!("  Instances:");
        for instance in instances {
            println!(
                "    {} {}",
                instance.id.as_deref().unwrap_or("-"),
                instance.state()
            );
        }
    }
}

fn run_list(ctx: &Context, kind: ResourceKind) -> Result<(), Error> {
    let records = ctx.store()?.list(kind)?;

    if ctx.json() {
        return print_json(&records);
    }

    if records.is_empty() {
        println!("No {} records.", kind);
        return Ok(());
    }

    println!("{} records ({} total):\n", kind, records.len());
    for record in &records {
        let resource = &record.resource;
        let name = resource
            .metadata()
            .and_then(|m| m.name.as_deref())
            .unwrap_or("-");
        println!(
            "  {:<40} {:<24} {}",
            resource.id().unwrap_or("-"),
            name,
            resource.state_name()
        );
    }
    Ok(())
}

fn run_observe(
    ctx: &Context,
    kind: ResourceKind,
    id: &str,
    file: &Path,
    policy: Option<TransitionPolicy>,
) -> Result<(), Error> {
    let status = read_json(file)?;
    let observer = Observer::new(ctx.store()?, policy.unwrap_or(ctx.settings.policy));
    let (transition, record) = observer.observe(kind, id, status)?;

    if ctx.json() {
        return print_json(&json!({
            "kind": kind,
            "id": id,
            "policy": observer.policy(),
            "changed": transition.changed(),
            "transition": transition,
            "seq": record.seq,
        }));
    }

    print_transition(id, &transition);
    Ok(())
}

fn print_transition(id: &str, transition: &Transition) {
    if transition.changed() {
        println!("{}: {} -> {}", id, transition.from, transition.to);
    } else {
        println!("{}: {} (unchanged)", id, transition.to);
    }
    for instance in &transition.instances {
        println!(
            "  instance {}: {} -> {}",
            instance.id,
            instance.from.unwrap_or("new"),
            instance.to
        );
    }
    for dropped in &transition.dropped {
        println!("  instance {}: no longer reported", dropped);
    }
    for retained in &transition.retained {
        println!("  instance {}: terminal, retained", retained);
    }
}

fn run_delete(ctx: &Context, kind: ResourceKind, id: &str) -> Result<(), Error> {
    let record = ctx.store()?.delete(kind, id)?;
    tracing::info!(kind = %kind, id = %id, "deleted record");

    if ctx.json() {
        print_json(&record)
    } else {
        println!("Deleted {} {}", kind, id);
        Ok(())
    }
}

fn run_mask_parse(ctx: &Context, source: &str) -> Result<(), Error> {
    let mask = Mask::unmarshal(source)?;
    let normal = mask.marshal();

    if ctx.json() {
        return print_json(&json!({
            "mask": normal,
            "empty": mask.is_empty(),
            "field_path": mask.is_field_path(),
        }));
    }
    println!("{}", normal);
    Ok(())
}

fn reset_headers<S>(spec: Value) -> Result<(String, Metadata), Error>
where
    S: FullUpdateResetMask + DeserializeOwned,
{
    let spec: S = serde_json::from_value(spec)?;
    let mut headers = Metadata::new();
    ensure_reset_mask(&spec, &mut headers);
    Ok((spec.full_update_reset_mask().marshal(), headers))
}

fn run_mask_reset(ctx: &Context, kind: ResourceKind, file: &Path) -> Result<(), Error> {
    let spec = read_json(file)?;
    let (mask, headers) = match kind {
        ResourceKind::Job => reset_headers::<<Job as Resource>::Spec>(spec)?,
        ResourceKind::Endpoint => reset_headers::<<Endpoint as Resource>::Spec>(spec)?,
        ResourceKind::CapacityBlockGroup => {
            reset_headers::<<CapacityBlockGroup as Resource>::Spec>(spec)?
        }
        ResourceKind::CapacityInterval => {
            reset_headers::<<CapacityInterval as Resource>::Spec>(spec)?
        }
        ResourceKind::AuditEventExport => {
            reset_headers::<<AuditEventExport as Resource>::Spec>(spec)?
        }
    };

    if ctx.json() {
        let headers: Vec<Value> = headers
            .iter()
            .map(|(k, v)| json!({"key": k, "value": v}))
            .collect();
        return print_json(&json!({ "kind": kind, "mask": mask, "headers": headers }));
    }
    println!("{}", mask);
    print!("{}", headers);
    Ok(())
}

fn run_config(ctx: &Context) -> Result<(), Error> {
    if ctx.json() {
        println!("{}", ctx.config.to_json()?);
        return Ok(());
    }

    println!("Effective configuration ({}):\n", ctx.config.schema_id);
    println!("  store.root     = {}", ctx.settings.store_root.display());
    println!("  observe.policy = {}", ctx.settings.policy);
    println!("  log.level      = {}", ctx.settings.log_level);
    println!("  log.format     = {:?}", ctx.settings.log_format);
    println!("  output.format  = {:?}", ctx.settings.output);

    println!("\nSources (lowest precedence first):");
    for source in &ctx.config.sources {
        let path = source
            .path
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        match source.digest {
            Some(ref digest) => println!("  {:?} {} sha256:{}", source.origin, path, digest),
            None => println!("  {:?} {}", source.origin, path),
        }
    }
    if !ctx.config.redactions.is_empty() {
        println!("\nRedacted: {}", ctx.config.redactions.join(", "));
    }
    Ok(())
}

