//! The `grpcgen.toml` configuration layer.
//!
//! Configuration is optional; every option can also be supplied as a CLI
//! flag, and flags win over the file. Parse and validation failures are
//! reported as miette diagnostics against the file source.

use std::path::{Path, PathBuf};

use eyre::eyre;
use grpcgen_codegen_typescript::GenerationOptions;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

/// Result type for configuration operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(help("create a grpcgen.toml or pass options as flags"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse grpcgen.toml")]
    #[diagnostic(code(grpcgen::parse_error))]
    Parse {
        #[source_code]
        src: NamedSource<String>,
        #[label("parse error here")]
        span: Option<SourceSpan>,
        #[source]
        source: toml::de::Error,
    },

    #[error("{message}")]
    #[diagnostic(code(grpcgen::validation_error))]
    Validation {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
    },
}

/// Raw contents of `grpcgen.toml`. Every field is optional; defaults are
/// applied during [`Settings::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrpcgenToml {
    /// Path to the protobuf.js JSON descriptor.
    pub descriptor: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    /// Display name the generated server class is derived from.
    pub server_name: Option<String>,
    /// Spread request fields as handler parameters instead of passing the
    /// whole request object.
    pub request_body_as_parameters: Option<bool>,
    /// File stem for the root output module.
    pub default_module: Option<String>,
}

impl GrpcgenToml {
    /// Load from `path`. A missing file is not an error; all options can
    /// come from flags.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str, filename: &str) -> Result<Self> {
        let named_source = || NamedSource::new(filename, content.to_string());
        let config: Self = toml::from_str(content).map_err(|source| {
            Box::new(Error::Parse {
                src: named_source(),
                span: source.span().map(SourceSpan::from),
                source,
            })
        })?;

        let invalid = |message: String| {
            Box::new(Error::Validation {
                src: named_source(),
                span: None,
                message,
            })
        };
        if let Some(name) = &config.server_name
            && !is_identifier(name)
        {
            return Err(invalid(format!(
                "server_name '{name}' is not a valid identifier"
            )));
        }
        if let Some(module) = &config.default_module
            && (module.is_empty() || module.contains(['/', '\\']))
        {
            return Err(invalid(format!(
                "default_module '{module}' must be a bare file stem"
            )));
        }
        Ok(config)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// CLI flag values that override the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub descriptor: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub server_name: Option<String>,
    pub request_body_as_parameters: Option<bool>,
    pub default_module: Option<String>,
}

/// Fully resolved configuration: file merged with flags, defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub descriptor: PathBuf,
    pub out_dir: PathBuf,
    pub server_name: String,
    pub request_body_as_parameters: bool,
    pub default_module: String,
}

impl Settings {
    pub fn resolve(config: GrpcgenToml, overrides: Overrides) -> eyre::Result<Self> {
        let descriptor = overrides
            .descriptor
            .or(config.descriptor)
            .ok_or_else(|| {
                eyre!("no descriptor given; set `descriptor` in grpcgen.toml or pass --descriptor")
            })?;
        Ok(Self {
            descriptor,
            out_dir: overrides
                .out_dir
                .or(config.out_dir)
                .unwrap_or_else(|| PathBuf::from("generated")),
            server_name: overrides
                .server_name
                .or(config.server_name)
                .unwrap_or_else(|| "Proto".to_string()),
            request_body_as_parameters: overrides
                .request_body_as_parameters
                .or(config.request_body_as_parameters)
                .unwrap_or(true),
            default_module: overrides
                .default_module
                .or(config.default_module)
                .unwrap_or_else(|| "index".to_string()),
        })
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            server_name: self.server_name.clone(),
            request_body_as_parameters: self.request_body_as_parameters,
            default_module: self.default_module.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = GrpcgenToml::parse(
            "descriptor = \"proto.json\"\n\
             out_dir = \"src/generated\"\n\
             server_name = \"Backend\"\n\
             request_body_as_parameters = false\n\
             default_module = \"root\"\n",
            "grpcgen.toml",
        )
        .unwrap();
        assert_eq!(config.descriptor, Some(PathBuf::from("proto.json")));
        assert_eq!(config.server_name.as_deref(), Some("Backend"));
        assert_eq!(config.request_body_as_parameters, Some(false));
    }

    #[test]
    fn test_parse_error_carries_span() {
        let error = GrpcgenToml::parse("descriptor = [", "grpcgen.toml").unwrap_err();
        assert!(matches!(*error, Error::Parse { .. }));
    }

    #[test]
    fn test_invalid_server_name_is_rejected() {
        let error =
            GrpcgenToml::parse("server_name = \"My Server\"", "grpcgen.toml").unwrap_err();
        assert!(matches!(*error, Error::Validation { .. }));
    }

    #[test]
    fn test_default_module_must_be_a_file_stem() {
        let error =
            GrpcgenToml::parse("default_module = \"a/b\"", "grpcgen.toml").unwrap_err();
        assert!(matches!(*error, Error::Validation { .. }));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let error = GrpcgenToml::parse("serverName = \"X\"", "grpcgen.toml").unwrap_err();
        assert!(matches!(*error, Error::Parse { .. }));
    }

    #[test]
    fn test_flags_win_over_file() {
        let config = GrpcgenToml::parse(
            "descriptor = \"from_file.json\"\nserver_name = \"FromFile\"",
            "grpcgen.toml",
        )
        .unwrap();
        let settings = Settings::resolve(
            config,
            Overrides {
                server_name: Some("FromFlag".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(settings.descriptor, PathBuf::from("from_file.json"));
        assert_eq!(settings.server_name, "FromFlag");
        assert!(settings.request_body_as_parameters);
        assert_eq!(settings.default_module, "index");
    }

    #[test]
    fn test_missing_descriptor_is_an_error() {
        assert!(Settings::resolve(GrpcgenToml::default(), Overrides::default()).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grpcgen.toml");
        std::fs::write(&path, "descriptor = \"proto.json\"").unwrap();
        let config = GrpcgenToml::load(&path).unwrap();
        assert_eq!(config.descriptor, Some(PathBuf::from("proto.json")));
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let config = GrpcgenToml::load(Path::new("does/not/exist.toml")).unwrap();
        assert!(config.descriptor.is_none());
    }
}
