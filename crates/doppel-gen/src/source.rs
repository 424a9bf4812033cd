//! Source Catalog
//!
//! Builds a [`TypeCatalog`] by parsing Rust sources with `syn`.
//!
//! ## What is collected
//!
//! - `struct` items with their fields; `trait` items with their `&self` /
//!   `&mut self` methods; other type items as [`TypeKind::Other`].
//! - Methods of inherent impls (any `pub` visibility counts as exported) and
//!   of trait impls (exported, tagged with the trait as capability).
//! - `impl Deref for X { type Target = T; }` marks the field of type `T`
//!   (optionally boxed) as an embedding of `T`.
//! - Trait-object fields (`Box<dyn T>`, `Arc<dyn T>`, `Rc<dyn T>`, `&dyn T`)
//!   embed the trait `T`.
//!
//! Methods a wrapper cannot forward are left out with a debug log line:
//! generic methods, methods without a `&self`/`&mut self` receiver,
//! `async`/`unsafe`/`extern` methods, `impl Trait` in any position, results
//! that borrow, and parameters a call record cannot own (a borrow nested
//! anywhere other than `&T`, `&[&T]`, `Option<&T>` or `Cow<T>`, or a trait
//! object).
//!
//! A trait that loses a required item this way, or that has supertraits, is
//! recorded as incomplete so no double claims to implement it. A trait impl
//! that loses a method keeps its other methods as plain methods.
//!
//! When a name is declared more than once the first declaration, in sorted
//! path order, wins.

use crate::catalog::{FieldDecl, MemoryCatalog, MethodDecl, ParamDecl, TypeCatalog, TypeDecl, TypeKind};
use crate::error::{GenError, GenResult};
use crate::render::GENERATED_MARKER;
use quote::ToTokens;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use syn::visit::{self, Visit};
use syn::{
    Fields, FnArg, GenericArgument, GenericParam, ImplItem, ItemEnum, ItemImpl, ItemStruct,
    ItemTrait, ItemType, ItemUnion, Pat, PathArguments, ReturnType, Signature, TraitItem, Type,
    TypeParamBound, Visibility, WherePredicate,
};

/// Trait impls that never form a mockable capability.
const IGNORED_TRAITS: &[&str] = &[
    "Add", "AsMut", "AsRef", "Borrow", "BorrowMut", "Clone", "Copy", "Debug", "Default",
    "DerefMut", "Deserialize", "Display", "Div", "DoubleEndedIterator", "Drop", "Eq", "Error",
    "ExactSizeIterator", "Extend", "Fn", "FnMut", "FnOnce", "From", "FromIterator", "FromStr",
    "Future", "Hash", "Index", "IndexMut", "Into", "IntoIterator", "Iterator", "Mul", "Neg",
    "Not", "Ord", "PartialEq", "PartialOrd", "Rem", "Send", "Serialize", "Sub", "Sync",
    "ToString", "TryFrom", "TryInto", "Unpin",
];

/// Bounds that never name the embedded capability of a trait object.
const AUTO_TRAITS: &[&str] = &["Send", "Sync", "Unpin", "UnwindSafe", "RefUnwindSafe"];

/// Smart pointers whose trait-object payload counts as an embedding.
const POINTERS: &[&str] = &["Box", "Arc", "Rc"];

/// Catalog parsed from Rust source files.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    files: Vec<PathBuf>,
    types: MemoryCatalog,
}

impl SourceCatalog {
    /// Parse every `.rs` file under `root`.
    ///
    /// `target/` and hidden directories are skipped, as are files produced
    /// by this generator. Unparseable files are skipped with a warning.
    pub fn scan(root: impl AsRef<Path>) -> GenResult<Self> {
        let root = root.as_ref();
        let meta = std::fs::metadata(root).map_err(|e| GenError::io(root, e))?;
        if !meta.is_dir() {
            return Err(GenError::catalog(format!(
                "{}: not a directory",
                root.display()
            )));
        }

        let pattern = format!(
            "{}/**/*.rs",
            glob::Pattern::escape(&root.to_string_lossy())
        );
        let entries = glob::glob(&pattern)
            .map_err(|e| GenError::catalog(format!("bad source pattern {pattern}: {e}")))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!(path = %e.path().display(), error = %e.error(), "unreadable path");
                    None
                }
            })
            .filter(|path| !is_ignored(root, path))
            .collect();
        paths.sort();

        let mut collector = Collector::default();
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable source file");
                    continue;
                }
            };
            if source.starts_with(GENERATED_MARKER) {
                tracing::debug!(path = %path.display(), "skipping generated file");
                continue;
            }
            match syn::parse_file(&source) {
                Ok(file) => {
                    collector.visit_file(&file);
                    files.push(path);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = e.span().start().line,
                        error = %e,
                        "skipping unparseable source file"
                    );
                }
            }
        }

        let types = collector.finish();
        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            types = types.len(),
            "scanned sources"
        );
        Ok(Self { files, types })
    }

    /// Parse a single source text.
    pub fn parse_str(source: &str) -> GenResult<Self> {
        let file = syn::parse_file(source).map_err(|e| {
            GenError::catalog(format!(
                "parse error at line {}: {e}",
                e.span().start().line
            ))
        })?;
        let mut collector = Collector::default();
        collector.visit_file(&file);
        Ok(Self {
            files: Vec::new(),
            types: collector.finish(),
        })
    }

    /// Files that were parsed, in scan order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// The collected declarations.
    #[must_use]
    pub const fn catalog(&self) -> &MemoryCatalog {
        &self.types
    }

    /// Take the collected declarations.
    #[must_use]
    pub fn into_catalog(self) -> MemoryCatalog {
        self.types
    }
}

impl TypeCatalog for SourceCatalog {
    fn lookup(&self, name: &str) -> Option<&TypeDecl> {
        self.types.lookup(name)
    }
}

fn is_ignored(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| match component {
        Component::Normal(part) => {
            let part = part.to_string_lossy();
            part == "target" || part.starts_with('.')
        }
        _ => false,
    })
}

// =============================================================================
// Collection
// =============================================================================

#[derive(Debug, Default)]
struct FieldHint {
    deref_candidate: Option<String>,
    trait_object: Option<String>,
}

#[derive(Debug, Default)]
struct Collector {
    types: MemoryCatalog,
    hints: BTreeMap<String, Vec<FieldHint>>,
    impl_methods: Vec<(String, Vec<MethodDecl>)>,
    deref_targets: BTreeMap<String, String>,
}

impl Collector {
    fn declare(&mut self, decl: TypeDecl) -> bool {
        let name = decl.name.clone();
        let fresh = self.types.insert_first(decl);
        if !fresh {
            tracing::debug!(type_name = %name, "keeping first declaration");
        }
        fresh
    }

    fn finish(mut self) -> MemoryCatalog {
        for (owner, methods) in self.impl_methods {
            match self.types.get_mut(&owner) {
                Some(decl) => decl.methods.extend(methods),
                None => tracing::debug!(type_name = %owner, "impl for undeclared type"),
            }
        }

        for (owner, hints) in self.hints {
            let Some(decl) = self.types.get_mut(&owner) else {
                continue;
            };
            let mut deref_target = self.deref_targets.get(&owner);
            for (field, hint) in decl.fields.iter_mut().zip(hints) {
                if deref_target.is_some() && hint.deref_candidate.as_ref() == deref_target {
                    field.embeds = deref_target.cloned();
                    // Deref reaches exactly one field.
                    deref_target = None;
                } else {
                    field.embeds = hint.trait_object;
                }
            }
        }
        self.types
    }
}

impl<'ast> Visit<'ast> for Collector {
    fn visit_item_struct(&mut self, item: &'ast ItemStruct) {
        let name = item.ident.to_string();
        let mut decl = TypeDecl::structure(&name);
        let mut hints = Vec::new();
        let fields: Vec<(String, &Type)> = match &item.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|f| f.ident.as_ref().map(|ident| (ident.to_string(), &f.ty)))
                .collect(),
            Fields::Unnamed(unnamed) => unnamed
                .unnamed
                .iter()
                .enumerate()
                .map(|(i, f)| (i.to_string(), &f.ty))
                .collect(),
            Fields::Unit => Vec::new(),
        };
        for (field_name, ty) in fields {
            decl.fields
                .push(FieldDecl::new(field_name, type_string(ty, Some(&name))));
            hints.push(FieldHint {
                deref_candidate: deref_candidate(ty),
                trait_object: trait_object(ty),
            });
        }
        if self.declare(decl) {
            self.hints.insert(name, hints);
        }
        visit::visit_item_struct(self, item);
    }

    fn visit_item_enum(&mut self, item: &'ast ItemEnum) {
        self.declare(TypeDecl::with_kind(item.ident.to_string(), TypeKind::Other));
        visit::visit_item_enum(self, item);
    }

    fn visit_item_union(&mut self, item: &'ast ItemUnion) {
        self.declare(TypeDecl::with_kind(item.ident.to_string(), TypeKind::Other));
        visit::visit_item_union(self, item);
    }

    fn visit_item_type(&mut self, item: &'ast ItemType) {
        self.declare(TypeDecl::with_kind(item.ident.to_string(), TypeKind::Other));
        visit::visit_item_type(self, item);
    }

    fn visit_item_trait(&mut self, item: &'ast ItemTrait) {
        let name = item.ident.to_string();
        let mut decl = TypeDecl::capability(&name);
        if item.generics.params.is_empty() {
            for trait_item in &item.items {
                match trait_item {
                    TraitItem::Fn(f) => {
                        let method = if requires_sized_self(&f.sig) {
                            skip(&name, &f.sig, "not callable on a trait object");
                            None
                        } else {
                            method_decl(&f.sig, true, None, &name, None)
                        };
                        match method {
                            Some(method) => decl.methods.push(method),
                            None if f.default.is_none() => decl.skipped.push(f.sig.ident.to_string()),
                            None => {}
                        }
                    }
                    TraitItem::Type(ty) if ty.default.is_none() => {
                        decl.skipped.push(ty.ident.to_string());
                    }
                    TraitItem::Const(c) if c.default.is_none() => {
                        decl.skipped.push(c.ident.to_string());
                    }
                    _ => {}
                }
            }
            // A double implements none of the supertraits.
            for bound in &item.supertraits {
                if let TypeParamBound::Trait(t) = bound {
                    if let Some(last) = t.path.segments.last() {
                        let supertrait = last.ident.to_string();
                        if !AUTO_TRAITS.contains(&supertrait.as_str()) && supertrait != "Sized" {
                            decl.skipped.push(format!("supertrait {supertrait}"));
                        }
                    }
                }
            }
        } else {
            tracing::debug!(trait_name = %name, "skipping methods of generic trait");
            decl.skipped.push("generic parameters".to_string());
        }
        if !decl.is_complete() {
            tracing::debug!(trait_name = %name, skipped = ?decl.skipped, "trait cannot be implemented by a double");
        }
        self.declare(decl);
    }

    fn visit_item_impl(&mut self, item: &'ast ItemImpl) {
        if !item.generics.params.is_empty() {
            return;
        }
        let Some(owner) = type_name(&item.self_ty) else {
            return;
        };

        let capability = match &item.trait_ {
            None => None,
            Some((Some(_), _, _)) => return,
            Some((None, path, _)) => {
                let Some(last) = path.segments.last() else {
                    return;
                };
                let trait_name = last.ident.to_string();
                if trait_name == "Deref" {
                    self.record_deref(&owner, item);
                    return;
                }
                if IGNORED_TRAITS.contains(&trait_name.as_str()) {
                    return;
                }
                if !matches!(last.arguments, PathArguments::None) {
                    tracing::debug!(type_name = %owner, trait_name = %trait_name, "skipping impl of generic trait");
                    return;
                }
                Some(trait_name)
            }
        };

        let mut complete = true;
        let mut methods: Vec<MethodDecl> = Vec::new();
        for impl_item in &item.items {
            match impl_item {
                ImplItem::Fn(f) => {
                    let exported = capability.is_some() || !matches!(f.vis, Visibility::Inherited);
                    match method_decl(&f.sig, exported, capability.as_deref(), &owner, Some(&owner)) {
                        Some(method) => methods.push(method),
                        None => complete = false,
                    }
                }
                ImplItem::Type(_) | ImplItem::Const(_) => complete = false,
                _ => {}
            }
        }
        if let (Some(trait_name), false) = (&capability, complete) {
            // The double could not implement this trait; keep the methods inherent.
            tracing::debug!(type_name = %owner, trait_name = %trait_name, "trait impl only partly captured");
            for method in &mut methods {
                method.capability = None;
            }
        }
        if !methods.is_empty() {
            self.impl_methods.push((owner, methods));
        }
    }
}

impl Collector {
    fn record_deref(&mut self, owner: &str, item: &ItemImpl) {
        let target = item.items.iter().find_map(|impl_item| match impl_item {
            ImplItem::Type(ty) if ty.ident == "Target" => deref_candidate(&ty.ty),
            _ => None,
        });
        if let Some(target) = target {
            tracing::debug!(type_name = %owner, target = %target, "deref target");
            self.deref_targets.entry(owner.to_string()).or_insert(target);
        }
    }
}

// =============================================================================
// Signatures
// =============================================================================

fn skip(owner: &str, sig: &Signature, reason: &str) {
    tracing::debug!(type_name = %owner, method = %sig.ident, reason, "skipping method");
}

fn method_decl(
    sig: &Signature,
    exported: bool,
    capability: Option<&str>,
    owner: &str,
    self_name: Option<&str>,
) -> Option<MethodDecl> {
    if sig.asyncness.is_some() || sig.unsafety.is_some() || sig.abi.is_some() || sig.variadic.is_some() {
        skip(owner, sig, "async, unsafe or extern");
        return None;
    }
    if sig
        .generics
        .params
        .iter()
        .any(|p| !matches!(p, GenericParam::Lifetime(_)))
    {
        skip(owner, sig, "generic method");
        return None;
    }
    let Some(FnArg::Receiver(receiver)) = sig.inputs.first() else {
        skip(owner, sig, "no self receiver");
        return None;
    };
    if receiver.reference.is_none() {
        skip(owner, sig, "receiver is not &self or &mut self");
        return None;
    }

    let mut method = MethodDecl::new(sig.ident.to_string());
    method.exported = exported;
    method.capability = capability.map(str::to_string);
    if receiver.mutability.is_some() {
        method = method.mutable();
    }

    for input in sig.inputs.iter().skip(1) {
        let FnArg::Typed(arg) = input else {
            continue;
        };
        let hazards = Hazards::of(&arg.ty);
        if hazards.opaque || (hazards.self_type && self_name.is_none()) {
            skip(owner, sig, "parameter type cannot be named");
            return None;
        }
        if !recordable(&arg.ty) {
            skip(owner, sig, "parameter has no owned form");
            return None;
        }
        let name = match &*arg.pat {
            Pat::Ident(ident) => ident.ident.to_string(),
            _ => String::new(),
        };
        method = method.param(ParamDecl::new(name, type_string(&arg.ty, self_name)));
    }

    if let ReturnType::Type(_, ty) = &sig.output {
        let hazards = Hazards::of(ty);
        if hazards.borrowed {
            skip(owner, sig, "result borrows");
            return None;
        }
        if hazards.opaque || (hazards.self_type && self_name.is_none()) {
            skip(owner, sig, "result type cannot be named");
            return None;
        }
        match &**ty {
            Type::Tuple(tuple) => {
                for elem in &tuple.elems {
                    method = method.result(ParamDecl::anonymous(type_string(elem, self_name)));
                }
            }
            other => method = method.result(ParamDecl::anonymous(type_string(other, self_name))),
        }
    }
    Some(method)
}

fn requires_sized_self(sig: &Signature) -> bool {
    sig.generics.where_clause.as_ref().is_some_and(|clause| {
        clause.predicates.iter().any(|predicate| match predicate {
            WherePredicate::Type(pt) => {
                matches!(&pt.bounded_ty, Type::Path(p) if p.path.is_ident("Self"))
            }
            _ => false,
        })
    })
}

// Whether a call record can hold an owned copy of a parameter of type `ty`.
// Mirrors the conversions the renderer emits: `&T`, `&[&T]`, `Option<&T>`
// and `Cow<T>` become owned; anything else must not borrow at all.
fn recordable(ty: &Type) -> bool {
    match ty {
        Type::Reference(reference) => match &*reference.elem {
            Type::Slice(slice) => match &*slice.elem {
                Type::Reference(elem) => owned_form(&elem.elem),
                elem => owned_form(elem),
            },
            elem => owned_form(elem),
        },
        Type::Group(g) => recordable(&g.elem),
        Type::Paren(p) => recordable(&p.elem),
        Type::Path(p) if p.qself.is_none() => {
            let Some(last) = p.path.segments.last() else {
                return false;
            };
            match first_type_arg(&last.arguments) {
                Some(Type::Reference(reference)) if last.ident == "Option" => {
                    owned_form(&reference.elem)
                }
                Some(inner) if last.ident == "Cow" => owned_form(inner),
                _ => owned_form(ty),
            }
        }
        other => owned_form(other),
    }
}

fn owned_form(ty: &Type) -> bool {
    let hazards = Hazards::of(ty);
    !hazards.borrowed && !hazards.trait_object
}

#[derive(Debug, Default)]
struct Hazards {
    borrowed: bool,
    opaque: bool,
    self_type: bool,
    trait_object: bool,
}

impl Hazards {
    fn of(ty: &Type) -> Self {
        let mut hazards = Self::default();
        hazards.visit_type(ty);
        hazards
    }
}

impl<'ast> Visit<'ast> for Hazards {
    fn visit_type_reference(&mut self, reference: &'ast syn::TypeReference) {
        match &reference.lifetime {
            Some(lifetime) if lifetime.ident == "static" => self.visit_type(&reference.elem),
            _ => {
                self.borrowed = true;
                self.visit_type(&reference.elem);
            }
        }
    }

    fn visit_lifetime(&mut self, lifetime: &'ast syn::Lifetime) {
        if lifetime.ident != "static" {
            self.borrowed = true;
        }
    }

    fn visit_type_impl_trait(&mut self, _: &'ast syn::TypeImplTrait) {
        self.opaque = true;
    }

    fn visit_type_trait_object(&mut self, object: &'ast syn::TypeTraitObject) {
        self.trait_object = true;
        visit::visit_type_trait_object(self, object);
    }

    fn visit_path_segment(&mut self, segment: &'ast syn::PathSegment) {
        if segment.ident == "Self" {
            self.self_type = true;
        }
        visit::visit_path_segment(self, segment);
    }
}

// =============================================================================
// Embedding hints
// =============================================================================

fn type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last().map(|s| s.ident.to_string()),
        Type::Group(g) => type_name(&g.elem),
        Type::Paren(p) => type_name(&p.elem),
        _ => None,
    }
}

fn first_type_arg(arguments: &PathArguments) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

// The name a field of this type would have to `Deref` to; `Box<T>` counts as `T`.
fn deref_candidate(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) if p.qself.is_none() => {
            let last = p.path.segments.last()?;
            if last.ident == "Box" {
                if let Some(inner) = first_type_arg(&last.arguments) {
                    return deref_candidate(inner);
                }
            }
            Some(last.ident.to_string())
        }
        Type::TraitObject(object) => bound_name(object.bounds.iter()),
        Type::Group(g) => deref_candidate(&g.elem),
        Type::Paren(p) => deref_candidate(&p.elem),
        _ => None,
    }
}

fn trait_object(ty: &Type) -> Option<String> {
    match ty {
        Type::TraitObject(object) => bound_name(object.bounds.iter()),
        Type::Reference(reference) => trait_object(&reference.elem),
        Type::Paren(p) => trait_object(&p.elem),
        Type::Group(g) => trait_object(&g.elem),
        Type::Path(p) if p.qself.is_none() => {
            let last = p.path.segments.last()?;
            if !POINTERS.iter().any(|ptr| last.ident == ptr) {
                return None;
            }
            match first_type_arg(&last.arguments)? {
                Type::TraitObject(object) => bound_name(object.bounds.iter()),
                Type::Paren(inner) => trait_object(&inner.elem),
                _ => None,
            }
        }
        _ => None,
    }
}

fn bound_name<'a>(mut bounds: impl Iterator<Item = &'a TypeParamBound>) -> Option<String> {
    bounds.find_map(|bound| match bound {
        TypeParamBound::Trait(t) => {
            let name = t.path.segments.last()?.ident.to_string();
            (!AUTO_TRAITS.contains(&name.as_str())).then_some(name)
        }
        _ => None,
    })
}

// =============================================================================
// Type printing
// =============================================================================

/// Print `ty` canonically: `Result<Vec<u8>, io::Error>`, `&mut [u8]`.
///
/// Lifetimes other than `'static` are elided and `Self` is replaced with
/// `self_name` when given.
#[must_use]
pub fn type_string(ty: &Type, self_name: Option<&str>) -> String {
    let mut out = String::new();
    write_type(&mut out, ty, self_name);
    out
}

fn write_type(out: &mut String, ty: &Type, self_name: Option<&str>) {
    match ty {
        Type::Path(p) if p.qself.is_none() => write_path(out, &p.path, self_name),
        Type::Reference(reference) => {
            out.push('&');
            if let Some(lifetime) = &reference.lifetime {
                if lifetime.ident == "static" {
                    out.push_str("'static ");
                }
            }
            if reference.mutability.is_some() {
                out.push_str("mut ");
            }
            write_type(out, &reference.elem, self_name);
        }
        Type::Slice(slice) => {
            out.push('[');
            write_type(out, &slice.elem, self_name);
            out.push(']');
        }
        Type::Array(array) => {
            out.push('[');
            write_type(out, &array.elem, self_name);
            out.push_str("; ");
            out.push_str(&array.len.to_token_stream().to_string());
            out.push(']');
        }
        Type::Tuple(tuple) => {
            out.push('(');
            for (i, elem) in tuple.elems.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(out, elem, self_name);
            }
            if tuple.elems.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Type::TraitObject(object) => {
            out.push_str("dyn ");
            write_bounds(out, object.bounds.iter(), self_name);
        }
        Type::ImplTrait(opaque) => {
            out.push_str("impl ");
            write_bounds(out, opaque.bounds.iter(), self_name);
        }
        Type::Ptr(ptr) => {
            out.push_str(if ptr.mutability.is_some() { "*mut " } else { "*const " });
            write_type(out, &ptr.elem, self_name);
        }
        Type::Paren(paren) => {
            out.push('(');
            write_type(out, &paren.elem, self_name);
            out.push(')');
        }
        Type::Group(group) => write_type(out, &group.elem, self_name),
        Type::Never(_) => out.push('!'),
        Type::Infer(_) => out.push('_'),
        other => out.push_str(&other.to_token_stream().to_string()),
    }
}

fn write_path(out: &mut String, path: &syn::Path, self_name: Option<&str>) {
    if path.leading_colon.is_some() {
        out.push_str("::");
    }
    for (i, segment) in path.segments.iter().enumerate() {
        if i > 0 {
            out.push_str("::");
        }
        match self_name {
            Some(name) if segment.ident == "Self" => out.push_str(name),
            _ => out.push_str(&segment.ident.to_string()),
        }
        match &segment.arguments {
            PathArguments::None => {}
            PathArguments::AngleBracketed(args) => {
                let parts: Vec<String> = args
                    .args
                    .iter()
                    .filter_map(|arg| generic_arg(arg, self_name))
                    .collect();
                if !parts.is_empty() {
                    if args.colon2_token.is_some() {
                        out.push_str("::");
                    }
                    out.push('<');
                    out.push_str(&parts.join(", "));
                    out.push('>');
                }
            }
            PathArguments::Parenthesized(args) => {
                let inputs: Vec<String> = args
                    .inputs
                    .iter()
                    .map(|ty| type_string(ty, self_name))
                    .collect();
                out.push('(');
                out.push_str(&inputs.join(", "));
                out.push(')');
                if let ReturnType::Type(_, ty) = &args.output {
                    out.push_str(" -> ");
                    write_type(out, ty, self_name);
                }
            }
        }
    }
}

fn generic_arg(arg: &GenericArgument, self_name: Option<&str>) -> Option<String> {
    match arg {
        GenericArgument::Lifetime(lifetime) => {
            (lifetime.ident == "static").then(|| "'static".to_string())
        }
        GenericArgument::Type(ty) => Some(type_string(ty, self_name)),
        GenericArgument::AssocType(assoc) => Some(format!(
            "{} = {}",
            assoc.ident,
            type_string(&assoc.ty, self_name)
        )),
        other => Some(other.to_token_stream().to_string()),
    }
}

fn write_bounds<'a>(
    out: &mut String,
    bounds: impl Iterator<Item = &'a TypeParamBound>,
    self_name: Option<&str>,
) {
    let parts: Vec<String> = bounds
        .filter_map(|bound| match bound {
            TypeParamBound::Trait(t) => {
                let mut part = String::new();
                if matches!(t.modifier, syn::TraitBoundModifier::Maybe(_)) {
                    part.push('?');
                }
                write_path(&mut part, &t.path, self_name);
                Some(part)
            }
            TypeParamBound::Lifetime(lifetime) => {
                (lifetime.ident == "static").then(|| "'static".to_string())
            }
            other => Some(other.to_token_stream().to_string()),
        })
        .collect();
    out.push_str(&parts.join(" + "));
}
