use std::path::PathBuf;

use clap::Args;
use eyre::{Context, Result};
use grpcgen_codegen::DefaultTransformer;
use grpcgen_codegen_typescript::TsCodeWriter;
use grpcgen_ir::{ProtoDefinition, ReflectionNode};

use super::UnwrapOrExit;
use crate::config::{GrpcgenToml, Overrides, Settings};

#[derive(Args)]
pub struct GenerateCommand {
    /// Path to grpcgen.toml (defaults to ./grpcgen.toml)
    #[arg(short, long, default_value = "grpcgen.toml")]
    pub config: PathBuf,

    /// Path to the protobuf.js JSON descriptor
    #[arg(short, long)]
    pub descriptor: Option<PathBuf>,

    /// Output directory for the generated tree
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Name the generated server class is derived from
    #[arg(long)]
    pub server_name: Option<String>,

    /// Spread request fields as handler parameters
    #[arg(long)]
    pub request_body_as_parameters: Option<bool>,

    /// File stem for the root output module
    #[arg(long)]
    pub default_module: Option<String>,

    /// List the files that would be written without writing them
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateCommand {
    pub fn run(&self) -> Result<()> {
        let config = GrpcgenToml::load(&self.config).unwrap_or_exit();
        let settings = Settings::resolve(config, self.overrides())?;

        let content = std::fs::read_to_string(&settings.descriptor)
            .wrap_err_with(|| format!("failed to read {}", settings.descriptor.display()))?;
        let descriptor: serde_json::Value = serde_json::from_str(&content)
            .wrap_err_with(|| format!("{} is not valid JSON", settings.descriptor.display()))?;
        let root = ReflectionNode::from_descriptor(&descriptor)
            .wrap_err("descriptor does not look like a protobuf.js namespace tree")?;
        let definition = ProtoDefinition::from_reflection(&root)?;

        let options = settings.generation_options();
        let transformer = DefaultTransformer;
        let writer = TsCodeWriter::new(&definition, &transformer, &options);
        let vd = writer.generate(&descriptor)?;

        let entries = vd.flat_entries();
        if self.dry_run {
            println!(
                "would write {} file{} to {}:",
                entries.len(),
                if entries.len() == 1 { "" } else { "s" },
                settings.out_dir.display()
            );
            for (path, file) in &entries {
                println!("  {} ({} bytes)", path.display(), file.len());
            }
            return Ok(());
        }

        vd.write_to(&settings.out_dir)?;
        println!(
            "✓ wrote {} file{} to {}",
            entries.len(),
            if entries.len() == 1 { "" } else { "s" },
            settings.out_dir.display()
        );
        Ok(())
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            descriptor: self.descriptor.clone(),
            out_dir: self.out_dir.clone(),
            server_name: self.server_name.clone(),
            request_body_as_parameters: self.request_body_as_parameters,
            default_module: self.default_module.clone(),
        }
    }
}
