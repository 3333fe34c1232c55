//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::ConfigArgs;
use covlog::PipelineConfig;

/// Execute the config command
///
/// With no flag the effective configuration is shown.
pub fn execute_config(config: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    if args.show || !args.defaults {
        print!("{}", render_config(config)?);
    }

    if args.defaults {
        println!("# built-in defaults");
        print!("{}", PipelineConfig::default().to_yaml()?);
    }
    Ok(())
}

/// Effective configuration as YAML preceded by the CLI settings
pub fn render_config(config: &CliConfig) -> CliResult<String> {
    let mut out = String::new();
    out.push_str(&format!("# verbosity: {:?}\n", config.verbosity));
    out.push_str(&format!("# color: {:?}\n", config.color));
    out.push_str(&format!("# capture jobs: {}\n", config.pipeline.effective_jobs()));
    out.push_str(&config.pipeline.to_yaml()?);
    Ok(out)
}
