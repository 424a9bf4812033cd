//! Identifier Allocator
//!
//! Deterministic naming for generated code. Every function here is pure:
//! the same input always yields the same names, and collisions are resolved
//! by appending `_` until the name is free, scanning left to right.

use std::collections::BTreeSet;

/// Rust keywords, strict and reserved (2021 edition).
pub const KEYWORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Check whether `name` is a Rust keyword.
#[must_use]
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Check whether `name` can be written as a plain identifier.
///
/// The lone wildcard `_` is not an identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && name != "_"
}

/// Upper-case the first letter of `name`.
#[must_use]
pub fn exported(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `ReadWriter` → `read_writer`: every upper-case letter after the first
/// becomes `_` followed by its lower-case form.
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// `read_all` → `ReadAll`: the exported form of each `_`-separated segment.
#[must_use]
pub fn camel_case(name: &str) -> String {
    name.split('_').map(exported).collect()
}

/// Names for a parameter list.
///
/// Anonymous slots (empty, `_`, or not a plain identifier) become `p0`,
/// `p1`, … by position.
#[must_use]
pub fn param_names(names: &[&str], reserved: &[&str]) -> Vec<String> {
    allocate(names, reserved, |i, name| {
        if is_identifier(name) {
            name.to_string()
        } else {
            format!("p{i}")
        }
    })
}

/// Names for result slots.
///
/// Anonymous slots become `r0`, `r1`, …; a slot named `error` becomes `err`
/// so it never shadows the type of the same name.
#[must_use]
pub fn result_names(names: &[&str], reserved: &[&str]) -> Vec<String> {
    allocate(names, reserved, |i, name| {
        if name == "error" {
            "err".to_string()
        } else if is_identifier(name) {
            name.to_string()
        } else {
            format!("r{i}")
        }
    })
}

/// Append `_` to `name` until it is not in `taken`, then claim it.
pub fn claim(name: &str, taken: &mut BTreeSet<String>) -> String {
    let mut name = name.to_string();
    while taken.contains(&name) {
        name.push('_');
    }
    taken.insert(name.clone());
    name
}

fn allocate<F>(names: &[&str], reserved: &[&str], base: F) -> Vec<String>
where
    F: Fn(usize, &str) -> String,
{
    let mut taken: BTreeSet<String> = reserved.iter().map(|s| (*s).to_string()).collect();
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let mut name = base(i, name);
            if is_keyword(&name) {
                name.push('_');
            }
            claim(&name, &mut taken)
        })
        .collect()
}
