//! Config command: print the effective or example configuration.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

pub fn execute(config: &Config, example: bool, output: Option<&Path>) -> Result<()> {
    let config = if example { Config::default() } else { config.clone() };

    match output {
        Some(path) => {
            config.save_to_file(path)?;
            log::info!("Configuration written to: {}", path.display());
        }
        None if example => print!("{}", Config::example_toml()?),
        None => print!("{}", toml::to_string_pretty(&config)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_effective_config() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("housemap.toml");
        let mut config = Config::default();
        config.map.jump_zoom = 17.0;

        execute(&config, false, Some(&path))?;
        assert_eq!(Config::load_from_file(&path)?.map.jump_zoom, 17.0);

        execute(&config, true, Some(&path))?;
        assert_eq!(Config::load_from_file(&path)?.map.jump_zoom, 16.0);
        Ok(())
    }
}
