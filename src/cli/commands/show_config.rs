use anyhow::Result;

use crate::config::UpdataConfig;

pub struct ShowConfigCommand;

impl ShowConfigCommand {
    pub fn execute(&self, config: &UpdataConfig) -> Result<()> {
        print!("{}", config.to_toml()?);
        Ok(())
    }
}
