//! Grouping code generator.
//!
//! Emitted lines are accumulated under a grouping key (the transformed
//! namespace path), together with the imports each group needs from other
//! groups. [`GroupingGenerator::generate`] then materializes every
//! non-empty group as one file: imports first, grouped by source module,
//! then the buffered lines. The root group (empty path) maps to the
//! configured default module name.

use eyre::Result;
use grpcgen_codegen::{LineWriter, NamingTransformer};
use grpcgen_core::VirtualDirectory;
use grpcgen_ir::{NamespacedSymbol, Symbol};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupingError {
    /// The same name was imported from the same module under two different
    /// aliases. Conflicting consumer expectations within one output file.
    #[error("conflicting aliases for import `{name}` from module `{module}`")]
    ImportConflict { module: String, name: String },
}

#[derive(Debug, Default)]
struct Group {
    writer: LineWriter,
    /// Source module path -> imported name -> alias.
    imports: IndexMap<Vec<String>, IndexMap<String, Option<String>>>,
}

impl Group {
    fn is_empty(&self) -> bool {
        self.writer.is_empty() && self.imports.is_empty()
    }
}

/// Line buffer with grouping, indentation and import tracking.
pub struct GroupingGenerator<'a> {
    transformer: &'a dyn NamingTransformer,
    default_module: String,
    groups: IndexMap<Vec<String>, Group>,
    current: Vec<String>,
}

impl<'a> GroupingGenerator<'a> {
    pub fn new(transformer: &'a dyn NamingTransformer, default_module: impl Into<String>) -> Self {
        Self {
            transformer,
            default_module: default_module.into(),
            groups: IndexMap::new(),
            current: Vec::new(),
        }
    }

    /// The transformed path of the group currently being written to.
    pub fn current_path(&self) -> &[String] {
        &self.current
    }

    fn transform_path(&self, path: &[Symbol]) -> Result<Vec<String>> {
        path.iter()
            .map(|symbol| Ok(self.transformer.convert_symbol(symbol)?))
            .collect()
    }

    fn current_group(&mut self) -> &mut Group {
        self.groups.entry(self.current.clone()).or_default()
    }

    /// Run `body` with the active group switched to `path`, restoring the
    /// previously active group afterwards. Nested and repeated calls are
    /// allowed; re-entering a group accumulates onto it.
    pub fn group(
        &mut self,
        path: &[Symbol],
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let transformed = self.transform_path(path)?;
        let previous = std::mem::replace(&mut self.current, transformed);
        let result = body(self);
        self.current = previous;
        result
    }

    /// Append a line to the active group at its current indentation.
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.current_group().writer.add_line(line);
    }

    pub fn indent(&mut self) {
        self.current_group().writer.indent();
    }

    pub fn unindent(&mut self) -> Result<()> {
        Ok(self.current_group().writer.unindent()?)
    }

    /// Emit an `export interface` block around `body`.
    pub fn define_interface(
        &mut self,
        symbol: &Symbol,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let name = self.transformer.convert_symbol(symbol)?;
        self.add_line(format!("export interface {name} {{"));
        self.indent();
        body(self)?;
        self.unindent()?;
        self.add_line("}");
        Ok(())
    }

    /// Emit an `export enum` block around `body`.
    pub fn define_enum(
        &mut self,
        symbol: &Symbol,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let name = self.transformer.convert_symbol(symbol)?;
        self.add_line(format!("export enum {name} {{"));
        self.indent();
        body(self)?;
        self.unindent()?;
        self.add_line("}");
        Ok(())
    }

    /// Record that the active group imports `symbol` from the module its
    /// namespace maps to. Re-importing the same name with the same alias is
    /// a no-op; a conflicting alias is fatal.
    pub fn add_import(&mut self, symbol: &NamespacedSymbol, alias: Option<&str>) -> Result<()> {
        let module = self.transform_path(symbol.namespace())?;
        let name = self.transformer.convert_symbol(symbol.name())?;
        let alias = alias.map(str::to_string);

        let names = self.current_group().imports.entry(module).or_default();
        match names.get(&name) {
            None => {
                names.insert(name, alias);
            }
            Some(existing) if *existing == alias => {}
            Some(_) => {
                return Err(GroupingError::ImportConflict {
                    module: symbol
                        .namespace()
                        .iter()
                        .map(Symbol::name)
                        .collect::<Vec<_>>()
                        .join("."),
                    name,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Materialize every non-empty group into `vd`, in sorted group order.
    pub fn generate(&self, vd: &mut VirtualDirectory) -> Result<()> {
        let mut keys: Vec<&Vec<String>> = self.groups.keys().collect();
        keys.sort();

        for key in keys {
            let group = &self.groups[key];
            if group.is_empty() {
                continue;
            }

            let mut header = LineWriter::new();
            let mut modules: Vec<&Vec<String>> = group.imports.keys().collect();
            modules.sort();
            for module in modules {
                let mut names: Vec<(&String, &Option<String>)> =
                    group.imports[module].iter().collect();
                names.sort_by(|a, b| a.0.cmp(b.0));
                let list = names
                    .iter()
                    .map(|(name, alias)| match alias {
                        Some(alias) => format!("{name} as {alias}"),
                        None => (*name).clone(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let specifier = relative_specifier(key, module, &self.default_module);
                header.add_line(format!("import {{ {list} }} from \"{specifier}\";"));
            }

            let body = group.writer.render();
            let content = if header.is_empty() {
                format!("{body}\n")
            } else if body.is_empty() {
                format!("{}\n", header.render())
            } else {
                format!("{}\n\n{body}\n", header.render())
            };

            let mut path = match key.split_last() {
                Some((stem, dirs)) => {
                    let mut path: Vec<String> = dirs.to_vec();
                    path.push(stem.clone());
                    path
                }
                None => vec![self.default_module.clone()],
            };
            if let Some(stem) = path.last_mut() {
                stem.push_str(".ts");
            }
            vd.add_deep_entry(&path, content)?;
        }
        Ok(())
    }
}

/// Compute the host-relative import specifier from the module file at
/// `consumer` to the module file at `target`. The consumer's directory is
/// its path minus the final segment; a target equal to that directory gets
/// the `./../<target>` form (the target file names the directory itself).
/// The root module file is named by `default_module`.
pub fn relative_specifier(consumer: &[String], target: &[String], default_module: &str) -> String {
    let dir = &consumer[..consumer.len().saturating_sub(1)];

    if dir == target {
        if target.is_empty() {
            return format!("./{default_module}");
        }
        let mut out = String::from("./..");
        for segment in target {
            out.push('/');
            out.push_str(segment);
        }
        return out;
    }

    let shared = dir
        .iter()
        .zip(target)
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = Vec::new();
    for _ in shared..dir.len() {
        parts.push("..");
    }
    for segment in &target[shared..] {
        parts.push(segment);
    }
    format!("./{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use grpcgen_codegen::DefaultTransformer;
    use grpcgen_ir::SymbolRole;

    use super::*;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_relative_specifier_from_root() {
        assert_eq!(
            relative_specifier(&[], &path(&["foo", "bar"]), "index"),
            "./foo/bar"
        );
    }

    #[test]
    fn test_relative_specifier_to_root() {
        assert_eq!(
            relative_specifier(&path(&["foo", "bar"]), &[], "index"),
            "./.."
        );
    }

    #[test]
    fn test_relative_specifier_target_names_own_directory() {
        assert_eq!(
            relative_specifier(&path(&["foo", "bar"]), &path(&["foo"]), "index"),
            "./../foo"
        );
    }

    #[test]
    fn test_relative_specifier_sibling_module() {
        assert_eq!(
            relative_specifier(&path(&["foo", "bar"]), &path(&["foo", "baz"]), "index"),
            "./baz"
        );
    }

    #[test]
    fn test_relative_specifier_root_to_root_uses_default_module() {
        assert_eq!(relative_specifier(&path(&["server"]), &[], "index"), "./index");
    }

    #[test]
    fn test_group_restores_previous_group() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");

        generator.add_line("at root");
        let inner = [Symbol::new("foo", SymbolRole::Namespace)];
        generator
            .group(&inner, |generator| {
                assert_eq!(generator.current_path(), ["Foo"]);
                generator.add_line("in foo");
                Ok(())
            })
            .unwrap();
        assert_eq!(generator.current_path(), Vec::<String>::new());
        generator.add_line("back at root");

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert_eq!(vd.get_file(&["index.ts"]), Some("at root\nback at root\n"));
        assert_eq!(vd.get_file(&["Foo.ts"]), Some("in foo\n"));
    }

    #[test]
    fn test_reentering_a_group_accumulates() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");
        let ns = [Symbol::new("foo", SymbolRole::Namespace)];

        generator
            .group(&ns, |generator| {
                generator.add_line("first");
                Ok(())
            })
            .unwrap();
        generator
            .group(&ns, |generator| {
                generator.add_line("second");
                Ok(())
            })
            .unwrap();

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert_eq!(vd.get_file(&["Foo.ts"]), Some("first\nsecond\n"));
    }

    #[test]
    fn test_nested_groups_emit_nested_files() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");
        let outer = [
            Symbol::new("foo", SymbolRole::Namespace),
            Symbol::new("bar", SymbolRole::Namespace),
        ];
        generator
            .group(&outer, |generator| {
                generator.add_line("deep");
                Ok(())
            })
            .unwrap();

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert_eq!(vd.get_file(&["Foo", "Bar.ts"]), Some("deep\n"));
    }

    #[test]
    fn test_import_rendering_and_deduplication() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");

        let target = NamespacedSymbol::from_dotted("foo.baz.some_message", SymbolRole::Message);
        let consumer = [
            Symbol::new("foo", SymbolRole::Namespace),
            Symbol::new("bar", SymbolRole::Namespace),
        ];
        generator
            .group(&consumer, |generator| {
                generator.add_import(&target, Some("ALIAS"))?;
                // same name + alias again is a no-op
                generator.add_import(&target, Some("ALIAS"))?;
                generator.add_line("const x: ALIAS | undefined = undefined;");
                Ok(())
            })
            .unwrap();

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert_eq!(
            vd.get_file(&["Foo", "Bar.ts"]),
            Some(
                "import { SomeMessage as ALIAS } from \"./Baz\";\n\n\
                 const x: ALIAS | undefined = undefined;\n"
            )
        );
    }

    #[test]
    fn test_conflicting_import_alias_is_fatal() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");
        let target = NamespacedSymbol::from_dotted("foo.some_message", SymbolRole::Message);

        generator.add_import(&target, Some("A")).unwrap();
        let error = generator.add_import(&target, Some("B")).unwrap_err();
        let grouping = error.downcast_ref::<GroupingError>().unwrap();
        assert!(matches!(
            grouping,
            GroupingError::ImportConflict { module, name }
                if module == "foo" && name == "SomeMessage"
        ));

        // aliased vs unaliased also conflicts
        let mut generator = GroupingGenerator::new(&transformer, "index");
        generator.add_import(&target, Some("A")).unwrap();
        assert!(generator.add_import(&target, None).is_err());
    }

    #[test]
    fn test_imports_sorted_by_module_then_name() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");

        generator
            .add_import(
                &NamespacedSymbol::from_dotted("zeta.z_thing", SymbolRole::Message),
                None,
            )
            .unwrap();
        generator
            .add_import(
                &NamespacedSymbol::from_dotted("alpha.b_thing", SymbolRole::Message),
                None,
            )
            .unwrap();
        generator
            .add_import(
                &NamespacedSymbol::from_dotted("alpha.a_thing", SymbolRole::Message),
                None,
            )
            .unwrap();

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert_eq!(
            vd.get_file(&["index.ts"]),
            Some(
                "import { AThing, BThing } from \"./Alpha\";\n\
                 import { ZThing } from \"./Zeta\";\n"
            )
        );
    }

    #[test]
    fn test_empty_groups_emit_nothing() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");
        generator
            .group(&[Symbol::new("foo", SymbolRole::Namespace)], |_| Ok(()))
            .unwrap();

        let mut vd = VirtualDirectory::new();
        generator.generate(&mut vd).unwrap();
        assert!(vd.flat_entries().is_empty());
    }

    #[test]
    fn test_unindent_past_zero_is_fatal() {
        let transformer = DefaultTransformer;
        let mut generator = GroupingGenerator::new(&transformer, "index");
        assert!(generator.unindent().is_err());
    }
}
