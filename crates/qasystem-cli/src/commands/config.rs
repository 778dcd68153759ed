//! Config command

use crate::app::ConfigArgs;
use anyhow::Result;
use qasystem_core::Config;
use std::path::Path;

pub fn run(args: ConfigArgs, config: &Config, path: Option<&Path>) -> Result<()> {
    print!("{}", serde_yaml::to_string(config)?);

    if args.save {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Config::default_path);
        config.save_to(&path)?;
        eprintln!("Saved configuration to {}", path.display());
    }
    Ok(())
}
