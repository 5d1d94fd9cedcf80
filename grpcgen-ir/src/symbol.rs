//! Symbol and namespace path model for proto declarations.
//!
//! Every named entity in a compilation unit is represented as a [`Symbol`]
//! (a raw name plus its syntactic role) or a [`NamespacedSymbol`] (a
//! namespace path plus a leaf symbol). The role never changes the name
//! itself; it selects the naming convention applied later by a naming
//! transformer.

/// Syntactic role of a symbol, used to pick a naming convention.
///
/// Marked non-exhaustive so naming transformers in downstream crates must
/// carry an explicit arm for roles they do not know how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SymbolRole {
    Namespace,
    Enum,
    EnumValue,
    Service,
    Procedure,
    Field,
    Message,
    /// Synthesized names (file stems, generated class names) that naming
    /// transformers pass through unmodified.
    Special,
}

/// A named entity together with its syntactic role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: String,
    role: SymbolRole,
}

impl Symbol {
    pub fn new(name: impl Into<String>, role: SymbolRole) -> Self {
        Self {
            name: name.into(),
            role,
        }
    }

    /// The raw declared name, exactly as it appeared in the input.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> SymbolRole {
        self.role
    }

    /// Split the name into a normalized lowercase word sequence.
    ///
    /// Handles snake_case, camelCase, PascalCase, SCREAMING_SNAKE_CASE and
    /// mixtures of them. A run of underscores attached to the following
    /// segment is preserved as a leading-underscore prefix on that word, so
    /// `__foo__bar_baz` decomposes to `["__foo", "_bar", "baz"]`. A single
    /// trailing underscore is a separator with nothing after it and yields
    /// no word.
    pub fn decompose(&self) -> Vec<String> {
        if self.name.is_empty() {
            return Vec::new();
        }

        let segments = split_underscore_segments(&self.name);

        // SCREAMING_SNAKE names carry no camel boundaries worth splitting.
        if self.name.chars().all(|c| !c.is_lowercase()) {
            return segments.iter().map(|s| s.to_lowercase()).collect();
        }

        segments
            .iter()
            .flat_map(|segment| split_camel_words(segment))
            .map(|word| word.to_lowercase())
            .collect()
    }
}

/// Split on single underscores, folding extra underscores into a prefix of
/// the following segment. `"_"` stays a segment of its own.
fn split_underscore_segments(name: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for c in name.chars() {
        if c == '_' && current.chars().any(|c| c != '_') {
            segments.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Split a single segment at uppercase boundaries, keeping any leading
/// underscore run attached to the first word.
fn split_camel_words(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut acc = String::new();
    for c in segment.chars() {
        if c != '_' && !c.is_lowercase() && acc.chars().any(|c| c != '_') {
            words.push(std::mem::take(&mut acc));
        }
        acc.push(c);
    }
    if !acc.is_empty() {
        words.push(acc);
    }
    words
}

/// A symbol qualified by the namespace path it was declared under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedSymbol {
    namespace: Vec<Symbol>,
    name: Symbol,
}

impl NamespacedSymbol {
    pub fn new(namespace: Vec<Symbol>, name: Symbol) -> Self {
        Self { namespace, name }
    }

    /// Parse a dotted access string. All but the last segment become
    /// [`SymbolRole::Namespace`] symbols; the last gets the given role.
    pub fn from_dotted(full_name: &str, role: SymbolRole) -> Self {
        let mut parts: Vec<&str> = full_name.split('.').collect();
        // split always yields at least one element
        let name = parts.pop().unwrap_or_default();
        Self {
            namespace: parts
                .into_iter()
                .map(|part| Symbol::new(part, SymbolRole::Namespace))
                .collect(),
            name: Symbol::new(name, role),
        }
    }

    /// Rejoin namespace and leaf name with `.`. Inverse of [`Self::from_dotted`].
    pub fn assemble(&self) -> String {
        let mut out = String::new();
        for part in &self.namespace {
            out.push_str(part.name());
            out.push('.');
        }
        out.push_str(self.name.name());
        out
    }

    pub fn namespace(&self) -> &[Symbol] {
        &self.namespace
    }

    pub fn name(&self) -> &Symbol {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decompose(name: &str) -> Vec<String> {
        Symbol::new(name, SymbolRole::Special).decompose()
    }

    #[test]
    fn test_decompose_casing_styles() {
        for name in ["test_case", "testCase", "TestCase", "TEST_CASE"] {
            assert_eq!(decompose(name), ["test", "case"], "failed for {name}");
        }
    }

    #[test]
    fn test_decompose_simple() {
        assert_eq!(decompose("FooBarBaz"), ["foo", "bar", "baz"]);
        assert_eq!(decompose("snake_case"), ["snake", "case"]);
        assert_eq!(decompose("SCREAMING_SNAKE_CASE"), ["screaming", "snake", "case"]);
        assert_eq!(decompose("Snakey_Pascal_Case"), ["snakey", "pascal", "case"]);
        assert_eq!(decompose("InconsistentCasing_example"), ["inconsistent", "casing", "example"]);
        assert_eq!(decompose("testingName_CasingTest"), ["testing", "name", "casing", "test"]);
    }

    #[test]
    fn test_decompose_non_ascii() {
        assert_eq!(decompose("æøåÆøåØåæøÅøæ"), ["æøå", "æøå", "øåæø", "åøæ"]);
    }

    #[test]
    fn test_decompose_underscore_runs() {
        assert_eq!(decompose("_foo_bar_baz"), ["_foo", "bar", "baz"]);
        assert_eq!(decompose("__foo_bar_baz"), ["__foo", "bar", "baz"]);
        assert_eq!(decompose("__foo__bar_baz"), ["__foo", "_bar", "baz"]);
    }

    #[test]
    fn test_decompose_trailing_underscores() {
        // One trailing underscore separates nothing and yields no word; a
        // longer run keeps the remainder as an underscore-only word.
        assert_eq!(decompose("foo_"), ["foo"]);
        assert_eq!(decompose("FOO_"), ["foo"]);
        assert_eq!(decompose("foo__"), ["foo", "_"]);
        assert_eq!(decompose("FOO___"), ["foo", "__"]);
    }

    #[test]
    fn test_decompose_edge_cases() {
        assert_eq!(decompose(""), Vec::<String>::new());
        assert_eq!(decompose("a"), ["a"]);
        assert_eq!(decompose("A"), ["a"]);
        assert_eq!(decompose("_"), ["_"]);
    }

    #[test]
    fn test_from_dotted_plain_name() {
        let symbol = NamespacedSymbol::from_dotted("foo", SymbolRole::Field);
        assert!(symbol.namespace().is_empty());
        assert_eq!(symbol.name().name(), "foo");
        assert_eq!(symbol.name().role(), SymbolRole::Field);
    }

    #[test]
    fn test_from_dotted_nested() {
        let symbol = NamespacedSymbol::from_dotted("foo.bar.baz", SymbolRole::Message);
        assert_eq!(symbol.namespace().len(), 2);
        assert_eq!(symbol.namespace()[0].name(), "foo");
        assert_eq!(symbol.namespace()[1].name(), "bar");
        assert_eq!(symbol.namespace()[0].role(), SymbolRole::Namespace);
        assert_eq!(symbol.name().name(), "baz");
    }

    #[test]
    fn test_assemble_round_trip() {
        let samples = [
            "foo.bar.baz",
            "foo.bar",
            "foo",
            "foo..",
            ".foo..",
            "...",
            ".",
            "Foo_Bar.__B___az",
            "",
        ];
        for sample in samples {
            let symbol = NamespacedSymbol::from_dotted(sample, SymbolRole::Field);
            assert_eq!(symbol.assemble(), sample, "round trip failed for {sample:?}");
        }
    }
}
