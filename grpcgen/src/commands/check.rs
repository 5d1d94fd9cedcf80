use std::path::PathBuf;

use clap::Args;
use eyre::{Context, Result};
use grpcgen_ir::{ProtoDefinition, ReflectionNode};

use super::UnwrapOrExit;
use crate::config::{GrpcgenToml, Overrides, Settings};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to grpcgen.toml (defaults to ./grpcgen.toml)
    #[arg(short, long, default_value = "grpcgen.toml")]
    pub config: PathBuf,

    /// Path to the protobuf.js JSON descriptor
    #[arg(short, long)]
    pub descriptor: Option<PathBuf>,
}

impl CheckCommand {
    /// Build the definition model and report resolution problems without
    /// emitting anything.
    pub fn run(&self) -> Result<()> {
        let config = GrpcgenToml::load(&self.config).unwrap_or_exit();
        let settings = Settings::resolve(
            config,
            Overrides {
                descriptor: self.descriptor.clone(),
                ..Overrides::default()
            },
        )?;

        let content = std::fs::read_to_string(&settings.descriptor)
            .wrap_err_with(|| format!("failed to read {}", settings.descriptor.display()))?;
        let descriptor: serde_json::Value = serde_json::from_str(&content)
            .wrap_err_with(|| format!("{} is not valid JSON", settings.descriptor.display()))?;
        let root = ReflectionNode::from_descriptor(&descriptor)
            .wrap_err("descriptor does not look like a protobuf.js namespace tree")?;

        let definition = match ProtoDefinition::from_reflection(&root) {
            Ok(definition) => definition,
            Err(error) => {
                eprintln!("error: {error}");
                std::process::exit(1);
            }
        };

        println!("✓ {} is valid", settings.descriptor.display());
        println!(
            "  {} message{}, {} enum{}, {} service{}",
            definition.messages().count(),
            if definition.messages().count() == 1 { "" } else { "s" },
            definition.enums().count(),
            if definition.enums().count() == 1 { "" } else { "s" },
            definition.services().count(),
            if definition.services().count() == 1 { "" } else { "s" },
        );
        for service in definition.services() {
            println!(
                "  service {} ({} method{})",
                service.symbol.assemble(),
                service.methods.len(),
                if service.methods.len() == 1 { "" } else { "s" }
            );
        }
        Ok(())
    }
}
