use anyhow::Result;

use crate::cli::GraphFormat;
use crate::state::{render_dot, render_markdown};

pub struct GraphCommand {
    pub format: GraphFormat,
}

impl GraphCommand {
    pub fn new(format: GraphFormat) -> Self {
        Self { format }
    }

    pub fn render(&self) -> String {
        match self.format {
            GraphFormat::Dot => render_dot(),
            GraphFormat::Markdown => render_markdown(),
        }
    }

    pub fn execute(&self) -> Result<()> {
        print!("{}", self.render());
        Ok(())
    }
}
