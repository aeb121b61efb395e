//! Command implementations

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::path::PathBuf;
use tpb_config::{calculate_build_jobs, Config};
use tpb_deps::{BuildGroup, RecordingBuilder, Registry};
use tpb_env::{
    dump_env_vars_to_log, env_var_name_and_value, get_dir_list_from_env_var,
    unset_env_var_if_set_and_log, with_env_vars, write_env_vars, EnvOverrides, MemoryEnv,
    ProcessEnv,
};
use tpb_errors::{ConfigError, Error};
use tracing::info;

pub fn list(registry: &Registry, group: Option<BuildGroup>, json: bool) -> Result<(), Error> {
    let definitions = match group {
        Some(group) => registry.in_group(group),
        None => registry.all(),
    };

    if json {
        let deps: Vec<_> = definitions.iter().map(|d| d.dependency()).collect();
        println!("{}", to_json(&deps)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Version", "Group", "URL"]);
    for definition in definitions {
        let dep = definition.dependency();
        table.add_row(vec![
            dep.name.clone(),
            dep.version.clone(),
            dep.build_group.to_string(),
            dep.download_url()?,
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Run a definition against a recording builder
///
/// The build sees a snapshot of the environment with the variables listed in
/// `env.unset_before_build` removed; the process environment is untouched.
pub fn plan(registry: &Registry, config: &Config, name: &str, json: bool) -> Result<(), Error> {
    let definition = registry.get(name)?;
    let dep = definition.dependency();

    let mut build_env = MemoryEnv::from_process();
    for var in &config.env.unset_before_build {
        unset_env_var_if_set_and_log(&mut build_env, var)?;
    }

    let mut builder = RecordingBuilder::new(config.install_prefix())
        .with_pkg_config_path(get_dir_list_from_env_var(&build_env, "PKG_CONFIG_PATH"));
    definition.build(&mut builder)?;

    if json {
        println!("{}", to_json(builder.invocations())?);
        return Ok(());
    }

    println!("{} {} ({})", dep.name, dep.version, dep.build_group);
    println!("  download: {}", dep.download_url()?);
    println!("  archive:  {}", dep.archive_name()?);
    println!("  copy sources: {}", dep.copy_sources);
    println!("  jobs: {}", calculate_build_jobs(config.build.build_jobs));
    for invocation in builder.invocations() {
        println!("  {}:", invocation.tool);
        for arg in &invocation.args {
            println!("    {arg}");
        }
    }
    Ok(())
}

pub fn env(program: Option<&str>) {
    dump_env_vars_to_log(&ProcessEnv, program);
}

pub fn save_env(config: &Config, path: Option<PathBuf>) -> Result<(), Error> {
    let path = path.unwrap_or_else(|| config.env_file_path(&config.build_root()));
    write_env_vars(&ProcessEnv, &config.save_filter(), &path)?;
    info!(path = %path.display(), "environment saved");
    println!("{}", path.display());
    Ok(())
}

pub fn with_env(set: &[String], unset: &[String]) -> Result<(), Error> {
    let mut named = Vec::with_capacity(set.len() + unset.len());
    for assignment in set {
        let (name, value) =
            assignment
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "--set".to_string(),
                    value: assignment.clone(),
                })?;
        named.push((name.to_string(), Some(value.to_string())));
    }
    named.extend(unset.iter().map(|name| (name.clone(), None::<String>)));

    let overrides = EnvOverrides::new().merge_named(named);
    let names: Vec<String> = overrides.iter().map(|(name, _)| name.to_string()).collect();

    with_env_vars(ProcessEnv, &overrides, |env| {
        println!("inside scope:");
        for name in &names {
            println!("  {}", env_var_name_and_value(&*env, name));
        }
    })?;

    println!("after scope:");
    for name in &names {
        println!("  {}", env_var_name_and_value(&ProcessEnv, name));
    }
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::internal(format!("failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tpb_env::EnvStore;

    #[test]
    fn test_plan_unknown_dependency() {
        let err = plan(&Registry::builtin(), &Config::default(), "nope", false).unwrap_err();
        assert!(matches!(err, Error::Build(_)));
    }

    #[test]
    fn test_with_env_rejects_malformed_assignment() {
        let err = with_env(&["NO_EQUALS_SIGN".to_string()], &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { .. })
        ));
        assert!(!ProcessEnv.contains("NO_EQUALS_SIGN"));
    }
}
