//! Artifact Renderer
//!
//! Turns a [`TypeShape`] into Rust source for a test double. The artifact is
//! meant to be included as a child module of the module declaring the target
//! type (`#[cfg(test)] mod engine_mock;`), hence `use super::*;`.
//!
//! For a target `Engine` the artifact holds:
//!
//! - one `EngineGetCall`-style record struct per method, owning a copy of
//!   the arguments of a single call;
//! - `MockEngine`, wrapping an `Engine` by value, with one forwarding method
//!   and one `<method>_mock()` accessor per method, plus a
//!   `<method>_return(..)` helper for methods with results;
//! - one `impl Trait for MockEngine` per capability.
//!
//! Output is deterministic: the same shape always renders byte-identical
//! text.

use crate::extract::{MethodShape, MethodSignature, Parameter, TypeShape};
use crate::ident;
use std::collections::BTreeSet;
use std::fmt::Write;

/// First line of every artifact; the source scanner skips such files.
pub const GENERATED_MARKER: &str = "// Code generated by doppel";

const RUNTIME: &str = "::doppel";

/// Wrapper API names the double always defines.
const WRAPPER_API: &[&str] = &["new", "inner", "inner_mut", "into_inner"];

/// Rendered test double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Target type
    pub type_name: String,
    /// File name the artifact should be written to
    pub file_name: String,
    /// Rust source
    pub contents: String,
}

/// `ReadWriter` → `read_writer_mock.rs`.
#[must_use]
pub fn artifact_file_name(type_name: &str) -> String {
    format!("{}_mock.rs", ident::snake_case(type_name))
}

/// Name of the double generated for `type_name`.
#[must_use]
pub fn mock_name(type_name: &str) -> String {
    format!("Mock{type_name}")
}

/// Render the double for `shape`.
#[must_use]
pub fn render(shape: &TypeShape) -> Artifact {
    let plan = Plan::new(shape);
    let mut out = String::new();

    write_header(&mut out, shape);
    for (method, names) in shape.methods.iter().zip(&plan.methods) {
        write_record(&mut out, &method.signature, names);
    }
    write_struct(&mut out, shape, &plan);
    write_inherent(&mut out, shape, &plan);
    write_from(&mut out, shape, &plan);
    for capability in shape.capabilities() {
        write_capability(&mut out, shape, &plan, capability);
    }

    tracing::debug!(
        target_type = %shape.type_name,
        methods = shape.methods.len(),
        bytes = out.len(),
        "rendered double"
    );
    Artifact {
        type_name: shape.type_name.clone(),
        file_name: artifact_file_name(&shape.type_name),
        contents: out,
    }
}

// =============================================================================
// Naming plan
// =============================================================================

#[derive(Debug)]
struct MethodNames {
    record: String,
    field: String,
    accessor: String,
    returner: Option<String>,
}

#[derive(Debug)]
struct Plan {
    mock: String,
    api: Vec<String>,
    methods: Vec<MethodNames>,
}

impl Plan {
    // Method names are fixed by the target; generated helpers yield to them.
    fn new(shape: &TypeShape) -> Self {
        let mut taken: BTreeSet<String> = shape
            .methods
            .iter()
            .map(|m| m.signature.name.clone())
            .collect();
        let mock = mock_name(&shape.type_name);
        // Type names live apart from method names.
        let mut types: BTreeSet<String> = [shape.type_name.clone(), mock.clone()].into();
        let api = WRAPPER_API
            .iter()
            .map(|name| ident::claim(name, &mut taken))
            .collect();
        let methods = shape
            .methods
            .iter()
            .map(|m| {
                let name = &m.signature.name;
                MethodNames {
                    record: ident::claim(
                        &format!("{}{}Call", shape.type_name, ident::camel_case(name)),
                        &mut types,
                    ),
                    field: format!("{name}_mock"),
                    accessor: ident::claim(&format!("{name}_mock"), &mut taken),
                    returner: (!m.signature.results.is_empty())
                        .then(|| ident::claim(&format!("{name}_return"), &mut taken)),
                }
            })
            .collect();
        Self {
            mock,
            api,
            methods,
        }
    }

    fn api(&self, index: usize) -> &str {
        &self.api[index]
    }
}

// =============================================================================
// Type helpers
// =============================================================================

fn param_type(sig: &MethodSignature, param: &Parameter) -> String {
    if sig.variadic && param.index + 1 == sig.params.len() {
        format!("&[{}]", param.type_ref)
    } else {
        param.type_ref.clone()
    }
}

fn referent(ty: &str) -> Option<&str> {
    let rest = ty.strip_prefix('&')?;
    let rest = rest.strip_prefix("'static ").unwrap_or(rest);
    Some(rest.strip_prefix("mut ").unwrap_or(rest).trim_start())
}

// `Option<&str>` with head `Option` → `&str`. Matches on the last path segment.
fn type_arg<'a>(ty: &'a str, head: &str) -> Option<&'a str> {
    let open = ty.find('<')?;
    let segment = ty[..open].rsplit("::").next()?;
    if segment != head {
        return None;
    }
    let arg = ty[open + 1..].strip_suffix('>')?.trim();
    Some(arg.strip_prefix("'static,").map_or(arg, str::trim_start))
}

fn slice_elem(ty: &str) -> Option<&str> {
    ty.strip_prefix('[')?
        .strip_suffix(']')
        .filter(|elem| !elem.contains(';'))
}

// Owned counterpart of the unsized or borrowed referent `ty`.
fn owned_type(ty: &str) -> String {
    if ty == "str" {
        return "String".to_string();
    }
    match slice_elem(ty) {
        Some(elem) => format!("Vec<{elem}>"),
        None => format!("<{ty} as ::std::borrow::ToOwned>::Owned"),
    }
}

/// How one argument is copied into a call record.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Capture {
    /// Stored as declared; the delegate gets it back from the record.
    Moved,
    /// Stored as an owned copy; the delegate gets the original argument.
    Owned {
        /// Field type in the record
        record: String,
        /// Expression producing the copy from the argument
        expr: String,
    },
}

fn capture(ty: &str, name: &str) -> Capture {
    if let Some(inner) = referent(ty) {
        if let Some(elem) = slice_elem(inner).and_then(referent) {
            if !elem.contains('&') {
                return Capture::Owned {
                    record: format!("Vec<{}>", owned_type(elem)),
                    expr: format!(
                        "{name}.iter().map(|v| ::std::borrow::ToOwned::to_owned(*v)).collect()"
                    ),
                };
            }
        } else if !inner.contains('&') {
            return Capture::Owned {
                record: owned_type(inner),
                expr: format!("::std::borrow::ToOwned::to_owned(&*{name})"),
            };
        }
        return Capture::Moved;
    }
    if let Some(inner) = type_arg(ty, "Option").and_then(referent) {
        if !inner.contains('&') {
            return Capture::Owned {
                record: format!("Option<{}>", owned_type(inner)),
                expr: format!("{name}.as_deref().map(::std::borrow::ToOwned::to_owned)"),
            };
        }
    }
    if let Some(inner) = type_arg(ty, "Cow") {
        return Capture::Owned {
            record: owned_type(inner),
            expr: format!("::std::borrow::ToOwned::to_owned(&*{name})"),
        };
    }
    Capture::Moved
}

// What a call record stores for a parameter of type `ty`.
fn record_type(ty: &str) -> String {
    match capture(ty, "_") {
        Capture::Moved => ty.to_string(),
        Capture::Owned { record, .. } => record,
    }
}

fn result_type(sig: &MethodSignature) -> String {
    match sig.results.as_slice() {
        [] => "()".to_string(),
        [only] => only.type_ref.clone(),
        many => format!(
            "({})",
            many.iter()
                .map(|r| r.type_ref.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn is_result(ty: &str) -> bool {
    let head = ty.split('<').next().unwrap_or(ty).trim();
    head.rsplit("::").next() == Some("Result")
}

fn zero_value(ty: &str) -> &'static str {
    if is_result(ty) {
        "Ok(Default::default())"
    } else if ty == "()" {
        "()"
    } else {
        "Default::default()"
    }
}

fn default_closure(sig: &MethodSignature) -> String {
    match sig.results.as_slice() {
        [] => "|| ()".to_string(),
        [only] => format!("|| {}", zero_value(&only.type_ref)),
        many => format!(
            "|| ({})",
            many.iter()
                .map(|r| zero_value(&r.type_ref))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn mock_type(sig: &MethodSignature, names: &MethodNames) -> String {
    format!(
        "{RUNTIME}::MethodMock<{}, {}>",
        names.record,
        result_type(sig)
    )
}

fn fn_signature(sig: &MethodSignature, name: &str, public: bool) -> String {
    let mut text = String::new();
    if public {
        text.push_str("pub ");
    }
    let _ = write!(text, "fn {name}({}", sig.receiver.as_str());
    for param in &sig.params {
        let _ = write!(text, ", {}: {}", param.name, param_type(sig, param));
    }
    text.push(')');
    if !sig.results.is_empty() {
        let _ = write!(text, " -> {}", result_type(sig));
    }
    text
}

// =============================================================================
// Sections
// =============================================================================

fn write_header(out: &mut String, shape: &TypeShape) {
    let _ = writeln!(
        out,
        "{GENERATED_MARKER} {}. DO NOT EDIT.",
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out, "// Regenerate with: doppel {}", shape.type_name);
    out.push('\n');
    out.push_str(
        "#![allow(dead_code, non_camel_case_types, non_snake_case, clippy::all, clippy::pedantic, clippy::nursery)]\n\n",
    );
    out.push_str("use super::*;\n");
}

fn write_record(out: &mut String, sig: &MethodSignature, names: &MethodNames) {
    out.push('\n');
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    if sig.params.is_empty() {
        let _ = writeln!(out, "pub struct {} {{}}", names.record);
        return;
    }
    let _ = writeln!(out, "pub struct {} {{", names.record);
    for param in &sig.params {
        let _ = writeln!(
            out,
            "    pub {}: {},",
            param.name,
            record_type(&param_type(sig, param))
        );
    }
    out.push_str("}\n");
}

fn write_struct(out: &mut String, shape: &TypeShape, plan: &Plan) {
    out.push('\n');
    let _ = writeln!(out, "/// Test double for [`{}`].", shape.type_name);
    let _ = writeln!(out, "pub struct {} {{", plan.mock);
    let _ = writeln!(out, "    inner: {},", shape.type_name);
    for (method, names) in shape.methods.iter().zip(&plan.methods) {
        let _ = writeln!(
            out,
            "    {}: {},",
            names.field,
            mock_type(&method.signature, names)
        );
    }
    out.push_str("}\n");
}

fn write_inherent(out: &mut String, shape: &TypeShape, plan: &Plan) {
    let target = &shape.type_name;
    out.push('\n');
    let _ = writeln!(out, "impl {} {{", plan.mock);

    let _ = writeln!(out, "    pub fn {}(inner: {target}) -> Self {{", plan.api(0));
    out.push_str("        Self {\n            inner,\n");
    for (method, names) in shape.methods.iter().zip(&plan.methods) {
        let constructor = if method.delegate.is_some() {
            "new"
        } else {
            "without_delegate"
        };
        let _ = writeln!(
            out,
            "            {}: {RUNTIME}::MethodMock::{constructor}(",
            names.field
        );
        let _ = writeln!(
            out,
            "                {RUNTIME}::MethodKey::of::<{target}>(\"{}\"),",
            method.signature.name
        );
        let _ = writeln!(
            out,
            "                {},",
            default_closure(&method.signature)
        );
        out.push_str("            ),\n");
    }
    out.push_str("        }\n    }\n\n");

    let _ = writeln!(out, "    pub fn {}(&self) -> &{target} {{", plan.api(1));
    out.push_str("        &self.inner\n    }\n\n");
    let _ = writeln!(out, "    pub fn {}(&mut self) -> &mut {target} {{", plan.api(2));
    out.push_str("        &mut self.inner\n    }\n\n");
    let _ = writeln!(out, "    pub fn {}(self) -> {target} {{", plan.api(3));
    out.push_str("        self.inner\n    }\n");

    for (method, names) in shape.methods.iter().zip(&plan.methods) {
        write_method(out, method, names);
    }
    out.push_str("}\n");
}

fn write_method(out: &mut String, method: &MethodShape, names: &MethodNames) {
    let sig = &method.signature;

    out.push('\n');
    let _ = writeln!(out, "    {} {{", fn_signature(sig, &sig.name, true));
    if sig.params.is_empty() {
        let _ = writeln!(out, "        let call = {} {{}};", names.record);
    } else {
        let _ = writeln!(out, "        let call = {} {{", names.record);
        for param in &sig.params {
            match capture(&param_type(sig, param), &param.name) {
                Capture::Owned { expr, .. } => {
                    let _ = writeln!(out, "            {}: {expr},", param.name);
                }
                Capture::Moved => {
                    let _ = writeln!(out, "            {},", param.name);
                }
            }
        }
        out.push_str("        };\n");
    }

    match &method.delegate {
        None => {
            let _ = writeln!(out, "        self.{}.invoke_stubbed(call)", names.field);
        }
        Some(delegate) => {
            let mut takes_owned = false;
            let args: Vec<String> = sig
                .params
                .iter()
                .map(|param| match capture(&param_type(sig, param), &param.name) {
                    Capture::Owned { .. } => param.name.clone(),
                    Capture::Moved => {
                        takes_owned = true;
                        format!("call.{}", param.name)
                    }
                })
                .collect();
            let binding = if takes_owned { "call" } else { "_call" };
            let _ = writeln!(out, "        self.{}", names.field);
            let _ = writeln!(
                out,
                "            .invoke(call, |{binding}| self.inner.{}.{}({}))",
                delegate.field,
                sig.name,
                args.join(", ")
            );
        }
    }
    out.push_str("    }\n\n");

    let _ = writeln!(
        out,
        "    pub fn {}(&self) -> &{} {{",
        names.accessor,
        mock_type(sig, names)
    );
    let _ = writeln!(out, "        &self.{}", names.field);
    out.push_str("    }\n");

    if let Some(returner) = &names.returner {
        let params: Vec<String> = sig
            .results
            .iter()
            .map(|r| format!("{}: {}", r.name, r.type_ref))
            .collect();
        let values: Vec<&str> = sig.results.iter().map(|r| r.name.as_str()).collect();
        let value = if values.len() == 1 {
            values[0].to_string()
        } else {
            format!("({})", values.join(", "))
        };
        out.push('\n');
        let _ = writeln!(
            out,
            "    pub fn {returner}(&self, {}) {{",
            params.join(", ")
        );
        let _ = writeln!(out, "        self.{}.return_values({value});", names.field);
        out.push_str("    }\n");
    }
}

fn write_from(out: &mut String, shape: &TypeShape, plan: &Plan) {
    out.push('\n');
    let _ = writeln!(
        out,
        "impl From<{}> for {} {{",
        shape.type_name, plan.mock
    );
    let _ = writeln!(out, "    fn from(inner: {}) -> Self {{", shape.type_name);
    let _ = writeln!(out, "        Self::{}(inner)", plan.api(0));
    out.push_str("    }\n}\n");
}

fn write_capability(out: &mut String, shape: &TypeShape, plan: &Plan, capability: &str) {
    out.push('\n');
    let _ = writeln!(out, "impl {capability} for {} {{", plan.mock);
    let mut first = true;
    for method in shape
        .methods
        .iter()
        .filter(|m| m.signature.capability.as_deref() == Some(capability))
    {
        let sig = &method.signature;
        if !first {
            out.push('\n');
        }
        first = false;
        let args: Vec<&str> = std::iter::once("self")
            .chain(sig.params.iter().map(|p| p.name.as_str()))
            .collect();
        let _ = writeln!(out, "    {} {{", fn_signature(sig, &sig.name, false));
        let _ = writeln!(out, "        Self::{}({})", sig.name, args.join(", "));
        out.push_str("    }\n");
    }
    out.push_str("}\n");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::Receiver;
    use crate::extract::{DelegateBinding, ResultSlot};
    use pretty_assertions::assert_eq;

    fn param(name: &str, ty: &str, index: usize) -> Parameter {
        Parameter {
            name: name.to_string(),
            type_ref: ty.to_string(),
            index,
        }
    }

    fn result(name: &str, ty: &str, index: usize) -> ResultSlot {
        ResultSlot {
            name: name.to_string(),
            type_ref: ty.to_string(),
            index,
        }
    }

    fn sig(name: &str) -> MethodSignature {
        MethodSignature {
            name: name.to_string(),
            receiver: Receiver::Ref,
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
            capability: None,
        }
    }

    #[test]
    fn test_file_and_mock_names() {
        assert_eq!(artifact_file_name("ReadWriter"), "read_writer_mock.rs");
        assert_eq!(mock_name("Engine"), "MockEngine");
    }

    #[test]
    fn test_record_types() {
        assert_eq!(record_type("&str"), "String");
        assert_eq!(record_type("&mut [u8]"), "Vec<u8>");
        assert_eq!(record_type("&'static str"), "String");
        assert_eq!(record_type("&Path"), "<Path as ::std::borrow::ToOwned>::Owned");
        assert_eq!(record_type("&[u8; 4]"), "<[u8; 4] as ::std::borrow::ToOwned>::Owned");
        assert_eq!(record_type("Vec<u8>"), "Vec<u8>");
        assert_eq!(record_type("Option<String>"), "Option<String>");
    }

    #[test]
    fn test_nested_borrows_are_recorded_owned() {
        assert_eq!(record_type("&[&str]"), "Vec<String>");
        assert_eq!(
            record_type("&[&Path]"),
            "Vec<<Path as ::std::borrow::ToOwned>::Owned>"
        );
        assert_eq!(record_type("Option<&str>"), "Option<String>");
        assert_eq!(record_type("Option<&mut [u8]>"), "Option<Vec<u8>>");
        assert_eq!(record_type("Cow<str>"), "String");
        assert_eq!(record_type("std::borrow::Cow<'static, [u8]>"), "Vec<u8>");

        assert_eq!(
            capture("&[&str]", "tags"),
            Capture::Owned {
                record: "Vec<String>".to_string(),
                expr: "tags.iter().map(|v| ::std::borrow::ToOwned::to_owned(*v)).collect()"
                    .to_string(),
            }
        );
        assert_eq!(
            capture("Option<&str>", "prefix"),
            Capture::Owned {
                record: "Option<String>".to_string(),
                expr: "prefix.as_deref().map(::std::borrow::ToOwned::to_owned)".to_string(),
            }
        );
        assert_eq!(
            capture("Cow<str>", "key"),
            Capture::Owned {
                record: "String".to_string(),
                expr: "::std::borrow::ToOwned::to_owned(&*key)".to_string(),
            }
        );
        assert_eq!(capture("u64", "n"), Capture::Moved);
    }

    #[test]
    fn test_delegate_receives_borrowed_arguments() {
        let mut scan = sig("scan");
        scan.params = vec![
            param("prefix", "Option<&str>", 0),
            param("tags", "&[&str]", 1),
            param("limit", "usize", 2),
        ];
        scan.results = vec![result("r0", "usize", 0)];
        let shape = TypeShape {
            type_name: "Index".to_string(),
            methods: vec![MethodShape {
                signature: scan,
                delegate: Some(DelegateBinding {
                    field: "store".to_string(),
                    embedded: "Store".to_string(),
                }),
            }],
        };
        let contents = render(&shape).contents;
        assert!(contents.contains("    pub prefix: Option<String>,\n"));
        assert!(contents.contains("    pub tags: Vec<String>,\n"));
        assert!(contents.contains("    pub limit: usize,\n"));
        assert!(contents.contains(
            "            prefix: prefix.as_deref().map(::std::borrow::ToOwned::to_owned),\n"
        ));
        assert!(contents.contains(".invoke(call, |call| self.inner.store.scan(prefix, tags, call.limit))"));
    }

    #[test]
    fn test_zero_values() {
        let mut s = sig("m");
        assert_eq!(default_closure(&s), "|| ()");
        s.results = vec![result("r0", "io::Result<u8>", 0)];
        assert_eq!(default_closure(&s), "|| Ok(Default::default())");
        s.results.push(result("r1", "Option<String>", 1));
        assert_eq!(
            default_closure(&s),
            "|| (Ok(Default::default()), Default::default())"
        );
        assert!(is_result("std::result::Result<(), String>"));
        assert!(is_result("fmt::Result"));
        assert!(!is_result("ResultSet"));
    }

    #[test]
    fn test_signature_rendering() {
        let mut s = sig("write");
        s.receiver = Receiver::Mut;
        s.variadic = true;
        s.params = vec![param("tag", "u8", 0), param("parts", "String", 1)];
        s.results = vec![result("r0", "usize", 0), result("err", "Option<String>", 1)];
        assert_eq!(
            fn_signature(&s, "write", true),
            "pub fn write(&mut self, tag: u8, parts: &[String]) -> (usize, Option<String>)"
        );
        assert_eq!(
            record_type(&param_type(&s, &s.params[1])),
            "Vec<String>"
        );
    }

    #[test]
    fn test_helper_names_yield_to_methods() {
        let mut inner = sig("inner");
        inner.results = vec![result("r0", "u8", 0)];
        let shape = TypeShape {
            type_name: "Box2".to_string(),
            methods: vec![
                MethodShape {
                    signature: inner,
                    delegate: None,
                },
                MethodShape {
                    signature: sig("inner_mock"),
                    delegate: None,
                },
            ],
        };
        let plan = Plan::new(&shape);
        assert_eq!(plan.api, vec!["new", "inner_", "inner_mut", "into_inner"]);
        assert_eq!(plan.methods[0].accessor, "inner_mock_");
        assert_eq!(plan.methods[0].field, "inner_mock");
        assert_eq!(plan.methods[1].accessor, "inner_mock_mock");
        assert_eq!(plan.methods[0].returner.as_deref(), Some("inner_return"));
        assert_eq!(plan.methods[1].returner, None);
        assert_eq!(plan.methods[1].record, "Box2InnerMockCall");
    }

    #[test]
    fn test_record_names_are_unique() {
        let shape = TypeShape {
            type_name: "Engine".to_string(),
            methods: ["get_x", "getX", "get_x_", "mock"]
                .into_iter()
                .map(|name| MethodShape {
                    signature: sig(name),
                    delegate: None,
                })
                .collect(),
        };
        let plan = Plan::new(&shape);
        let records: Vec<&str> = plan.methods.iter().map(|m| m.record.as_str()).collect();
        assert_eq!(
            records,
            vec!["EngineGetXCall", "EngineGetXCall_", "EngineGetXCall__", "EngineMockCall"]
        );
        assert_eq!(plan.mock, "MockEngine");
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut get = sig("get");
        get.params = vec![param("key", "&str", 0)];
        get.results = vec![result("r0", "Option<String>", 0)];
        get.capability = Some("Store".to_string());
        let shape = TypeShape {
            type_name: "Engine".to_string(),
            methods: vec![MethodShape {
                signature: get,
                delegate: Some(DelegateBinding {
                    field: "store".to_string(),
                    embedded: "Store".to_string(),
                }),
            }],
        };
        let first = render(&shape);
        assert_eq!(first, render(&shape));
        assert_eq!(first.file_name, "engine_mock.rs");
        assert!(first.contents.starts_with(GENERATED_MARKER));
        assert!(first.contents.contains("impl Store for MockEngine {"));
    }
}
