//! Module administration commands.
//!
//! Each command bootstraps the module system from the persisted store with
//! auto-enable off, so listing never changes state.

use std::path::Path;

use keystone_modules::{InitReport, ModuleManifest, ModuleView, ModulesService};
use keystone_server::bootstrap::{module_store, modules_service};
use keystone_server::{builtin_catalog, KeystoneConfig};

use crate::error::{CtlError, CtlResult};
use crate::output;
use crate::ModuleCommands;

pub(crate) async fn handle_modules_command(
    cmd: ModuleCommands,
    config: &KeystoneConfig,
) -> CtlResult<()> {
    match cmd {
        ModuleCommands::List { json } => list_modules(config, json).await,
        ModuleCommands::Validate { path } => validate_module(Path::new(&path)),
        ModuleCommands::Order => show_load_order(config).await,
        ModuleCommands::Enable { id } => enable_module(config, &id).await,
        ModuleCommands::Disable { id } => disable_module(config, &id).await,
    }
}

async fn open_service(config: &KeystoneConfig) -> CtlResult<(ModulesService, InitReport)> {
    let mut config = config.clone();
    config.modules.auto_enable = Some(false);
    let store = module_store(&config.modules);
    let service = modules_service(&config, builtin_catalog(), store);
    let report = service.bootstrap().await?;
    Ok((service, report.init))
}

async fn list_modules(config: &KeystoneConfig, json: bool) -> CtlResult<()> {
    let (service, _) = open_service(config).await?;
    let modules = service.find_all().await?;

    if json {
        output::plain(serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    if modules.is_empty() {
        output::warning("No modules discovered.");
        output::blank();
        output::plain("Searched paths:");
        for path in &config.modules.module_paths {
            output::plain(format!("  - {path}"));
        }
        return Ok(());
    }

    output::header("Discovered modules:");
    output::blank();
    for module in &modules {
        print_module(module);
    }
    Ok(())
}

fn print_module(module: &ModuleView) {
    output::status_icon(
        module.enabled,
        format!("{} (v{}) [{}]", module.id, module.version, module.name),
    );
    if let Some(description) = &module.description {
        output::dim(format!("      {description}"));
    }
    if let Some(category) = &module.category {
        output::label("    Category", category);
    }
    if !module.depends.is_empty() {
        output::label("    Depends", module.depends.join(", "));
    }
    if let Some(installed_at) = module.installed_at {
        output::label("    Installed", installed_at.to_rfc3339());
    }
    output::label("    Path", module.path.display());
    output::blank();
}

fn validate_module(dir: &Path) -> CtlResult<()> {
    if !dir.is_dir() {
        return Err(CtlError::InvalidInput(format!(
            "'{}' is not a directory",
            dir.display()
        )));
    }

    let manifest = ModuleManifest::load(dir)?;
    output::success(format!("Module manifest loaded: {}", manifest.name));
    output::label("  Version", &manifest.version);
    if let Some(category) = &manifest.category {
        output::label("  Category", category);
    }
    output::label("  Installable", manifest.installable);
    output::label("  Controllers", manifest.controllers().len());
    output::label("  Services", manifest.services().len());
    output::label("  Models", manifest.models().len());
    output::label("  Frontend plugins", manifest.frontend_plugins().len());

    let errors = manifest.validate(dir);
    output::blank();
    if errors.is_empty() {
        output::success("Validation passed.");
        return Ok(());
    }

    output::error("Validation errors:");
    for err in &errors {
        output::error(format!("  - {err}"));
    }
    Err(CtlError::Validation(errors.len()))
}

async fn show_load_order(config: &KeystoneConfig) -> CtlResult<()> {
    let (service, report) = open_service(config).await?;
    for check in &report.dependency_warnings {
        output::warning(format!(
            "{} is missing dependencies: {}",
            check.module_id,
            check.missing.join(", ")
        ));
    }

    let enabled = service.enabled_ids().await;
    output::header("Load order:");
    for (position, module_id) in service.load_order().await?.iter().enumerate() {
        let marker = if enabled.contains(module_id) {
            "enabled"
        } else {
            "disabled"
        };
        output::item(format!("{}. {module_id} ({marker})", position + 1));
    }
    Ok(())
}

async fn enable_module(config: &KeystoneConfig, module_id: &str) -> CtlResult<()> {
    let (service, _) = open_service(config).await?;
    let action = service.enable(module_id).await?;
    output::success(action.message);
    if config.modules.store_path.is_none() {
        output::warning("No store path configured; the change is not persisted.");
    }
    Ok(())
}

async fn disable_module(config: &KeystoneConfig, module_id: &str) -> CtlResult<()> {
    let (service, _) = open_service(config).await?;
    let action = service.disable(module_id).await?;
    output::success(action.message);
    if config.modules.store_path.is_none() {
        output::warning("No store path configured; the change is not persisted.");
    }
    Ok(())
}
