//! Casing helpers over decomposed word sequences.
//!
//! Unlike string-to-string converters, these take the word sequence a
//! symbol decomposes into, so the split policy lives with the symbol model
//! and the same words can be recomposed into any convention.

/// Uppercase the first character of a word, leaving the rest as-is.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

/// Recompose words as PascalCase (e.g. `["hello", "world"]` -> "HelloWorld").
pub fn to_pascal_case<S: AsRef<str>>(words: &[S]) -> String {
    words.iter().map(|word| capitalize(word.as_ref())).collect()
}

/// Recompose words as camelCase (e.g. `["hello", "world"]` -> "helloWorld").
pub fn to_camel_case<S: AsRef<str>>(words: &[S]) -> String {
    let mut parts = words.iter();
    let mut out = match parts.next() {
        None => return String::new(),
        Some(first) => first.as_ref().to_string(),
    };
    for word in parts {
        out.push_str(&capitalize(word.as_ref()));
    }
    out
}

/// Recompose words as snake_case (e.g. `["hello", "world"]` -> "hello_world").
pub fn to_snake_case<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| word.as_ref())
        .collect::<Vec<_>>()
        .join("_")
}

/// Recompose words as SCREAMING_SNAKE_CASE.
pub fn to_screaming_snake_case<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|word| word.as_ref().to_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}
