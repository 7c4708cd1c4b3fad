//! Optimizer that shells out to external tools.

use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use tracing::debug;

use super::{OptimizeError, Optimizer};
use crate::raster::TileFormat;

/// One external program invocation. The file path is appended as the last
/// argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl OptimizerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn run(&self, path: &Path) -> Result<(), OptimizeError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| OptimizeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(OptimizeError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Parses a whitespace separated command line, e.g. `"optipng -quiet -o2"`.
impl FromStr for OptimizerCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "optimizer command is empty".to_string())?;

        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

/// Runs a chain of commands per format family.
///
/// Commands run in order; the first failure stops the chain.
#[derive(Debug, Clone, Default)]
pub struct CommandOptimizer {
    png: Vec<OptimizerCommand>,
    jpeg: Vec<OptimizerCommand>,
}

impl CommandOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_png(mut self, command: OptimizerCommand) -> Self {
        self.png.push(command);
        self
    }

    pub fn with_jpeg(mut self, command: OptimizerCommand) -> Self {
        self.jpeg.push(command);
        self
    }

    pub fn commands_for(&self, format: TileFormat) -> &[OptimizerCommand] {
        match format {
            TileFormat::Png => &self.png,
            TileFormat::Jpeg => &self.jpeg,
        }
    }
}

impl Optimizer for CommandOptimizer {
    fn optimize(&self, path: &Path, format: TileFormat) -> Result<(), OptimizeError> {
        for command in self.commands_for(format) {
            debug!("optimizing {} with {}", path.display(), command.program);
            command.run(path)?;
        }
        Ok(())
    }
}
