//! Program descriptions for `dynscope resolve`.
//!
//! A description lists namespaces, types with their members, the lexical
//! blocks enclosing the code under test, the enclosing type context, and the
//! identifiers to resolve there. Types are referenced by qualified name and
//! must be listed after the types they nest in or extend.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::cli::reporter::describe_reference;
use dynscope_common::{Diagnostic, DiagnosticBag, DiagnosticSink, Span};
use dynscope_resolver::{
    BuiltinType, CatalogBuilder, ForwardUse, MemberAccess, MemberDef, NameRequest, NameResolver,
    NamespaceId, ResolverOptions, ScopeChain, TypeCatalog, TypeDecl, TypeId, TypeKind, TypeRef,
    TypeScopeStack, Visibility, lookup_restrictions,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveProgram {
    #[serde(default)]
    pub options: ResolverOptions,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeDesc>,
    /// Compiler alias -> catalog type providing its members (`{"Object": "Object"}`).
    #[serde(default)]
    pub builtins: HashMap<String, String>,
    /// Outermost block first; each block is nested in the previous one.
    #[serde(default)]
    pub blocks: Vec<Vec<LocalDesc>>,
    #[serde(default)]
    pub context: ContextDesc,
    #[serde(default)]
    pub queries: Vec<QueryDesc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKindDesc {
    #[default]
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDesc {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKindDesc,
    /// Dotted namespace path; empty for the root namespace.
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub nested_in: Option<String>,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub members: Vec<MemberDesc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKindDesc {
    Field,
    Property,
    Method,
    Event,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDesc {
    pub name: String,
    pub kind: MemberKindDesc,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub arity: u32,
    #[serde(default)]
    pub extension: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalDesc {
    pub name: String,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    /// `false` when the declaration comes after the code being resolved.
    #[serde(default = "default_true")]
    pub declared: bool,
    #[serde(default)]
    pub start: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextDesc {
    /// Qualified name of the type whose member body is being compiled.
    #[serde(default, rename = "type")]
    pub enclosing: Option<String>,
    /// Namespace of top-level code when there is no enclosing type.
    #[serde(default)]
    pub namespace: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub imports: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDesc {
    pub name: String,
    #[serde(default)]
    pub arity: u32,
    #[serde(default)]
    pub invocable: bool,
    #[serde(default)]
    pub exclude_extensions: bool,
    #[serde(default)]
    pub start: u32,
    /// Resolve `receiver.name` instead of the bare name.
    #[serde(default)]
    pub receiver: Option<String>,
}

/// Result of one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    pub query: String,
    /// What the name resolved to, or `None` when a diagnostic was reported.
    pub resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    pub outcomes: Vec<QueryOutcome>,
    pub forward_uses: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Everything a resolver needs, built from a description.
pub struct LoadedProgram {
    pub catalog: TypeCatalog,
    pub scopes: ScopeChain,
    pub types: TypeScopeStack,
    /// Diagnostics raised while declaring locals (duplicates).
    pub declaration_diagnostics: DiagnosticBag,
}

impl ResolveProgram {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse program description")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn build(&self) -> Result<LoadedProgram> {
        let mut builder = CatalogBuilder::new();
        let mut namespaces: HashMap<String, NamespaceId> = HashMap::new();
        namespaces.insert(String::new(), NamespaceId::ROOT);
        for path in &self.namespaces {
            namespaces.insert(path.clone(), builder.namespace_path(path));
        }

        let mut types: HashMap<String, TypeId> = HashMap::new();
        let mut pending_members = Vec::new();
        for desc in &self.types {
            let namespace = *namespaces
                .entry(desc.namespace.clone())
                .or_insert_with(|| builder.namespace_path(&desc.namespace));
            let mut decl = TypeDecl::new(&desc.name, desc.kind.into())
                .in_namespace(namespace)
                .with_visibility(desc.visibility);
            let params: Vec<&str> = desc.type_parameters.iter().map(String::as_str).collect();
            decl = decl.generic(&params);
            if desc.dynamic {
                decl = decl.dynamic();
            }
            let qualified = match &desc.nested_in {
                Some(outer) => {
                    let outer_id = lookup_type(&types, outer)?;
                    decl = decl.nested_in(outer_id);
                    format!("{outer}.{}", desc.name)
                }
                None if desc.namespace.is_empty() => desc.name.clone(),
                None => format!("{}.{}", desc.namespace, desc.name),
            };
            if let Some(base) = &desc.extends {
                decl = decl.extends(lookup_type(&types, base)?);
            }
            let id = builder.add_type(decl);
            types.insert(qualified, id);
            pending_members.push((id, desc));
        }

        // Members after all types, so signatures may name any of them.
        for (id, desc) in pending_members {
            for member in &desc.members {
                let value_type = member
                    .value_type
                    .as_deref()
                    .map(|t| parse_type_ref(&types, t))
                    .transpose()?
                    .unwrap_or(TypeRef::Dynamic);
                let mut def = match member.kind {
                    MemberKindDesc::Field => MemberDef::field(&member.name, value_type),
                    MemberKindDesc::Property => MemberDef::property(&member.name, value_type),
                    MemberKindDesc::Method => MemberDef::method(&member.name, value_type),
                    MemberKindDesc::Event => MemberDef::event(&member.name, value_type),
                };
                def = def.with_visibility(member.visibility).with_arity(member.arity);
                if member.is_static {
                    def = def.into_static();
                }
                if member.extension {
                    def = def.into_extension();
                }
                builder.add_member(id, def);
            }
        }

        for (alias, ty) in &self.builtins {
            let Some(builtin) = BuiltinType::from_alias(alias) else {
                bail!("`{alias}` is not a compiler alias");
            };
            builder.bind_builtin(builtin, lookup_type(&types, ty)?);
        }
        let catalog = builder.build();
        debug!(types = catalog.type_count(), "catalog built");

        let mut declaration_diagnostics = DiagnosticBag::new();
        let mut scopes = ScopeChain::new(self.options.file_name.clone());
        for (depth, block) in self.blocks.iter().enumerate() {
            if depth > 0 {
                scopes.enter_block();
            }
            for local in block {
                let ty = local
                    .value_type
                    .as_deref()
                    .map(|t| parse_type_ref(&types, t))
                    .transpose()?;
                let span = Span::at(local.start, local.name.len() as u32);
                let declared = if local.declared {
                    scopes.define_local(&local.name, ty, span)
                } else {
                    scopes.declare_local(&local.name, ty, span)
                };
                if let Err(diag) = declared {
                    declaration_diagnostics.report(diag);
                }
            }
        }

        let imports = self
            .context
            .imports
            .iter()
            .map(|path| {
                namespaces
                    .get(path)
                    .copied()
                    .with_context(|| format!("unknown imported namespace `{path}`"))
            })
            .collect::<Result<Vec<_>>>()?;
        let method_params: Vec<&str> = self
            .context
            .type_parameters
            .iter()
            .map(String::as_str)
            .collect();
        let stack = match &self.context.enclosing {
            Some(name) => TypeScopeStack::for_type(&catalog, lookup_type(&types, name)?),
            None => {
                let Some(&ns) = namespaces.get(&self.context.namespace) else {
                    bail!("unknown namespace `{}`", self.context.namespace);
                };
                TypeScopeStack::top_level(ns)
            }
        };
        let types = stack
            .in_static_context(self.context.is_static)
            .with_method_type_parameters(&method_params)
            .with_imports(imports);

        Ok(LoadedProgram {
            catalog,
            scopes,
            types,
            declaration_diagnostics,
        })
    }

    /// Resolve every query, continuing past failures.
    pub fn run(&self) -> Result<ResolveReport> {
        let loaded = self.build()?;
        let mut bag = loaded.declaration_diagnostics;
        let mut resolver = NameResolver::new(&loaded.catalog, self.options.clone());
        let mut outcomes = Vec::with_capacity(self.queries.len());

        for query in &self.queries {
            let span = Span::at(query.start, query.name.len() as u32);
            let outcome = match &query.receiver {
                Some(receiver) => {
                    let receiver_type = parse_type_ref_in(&loaded.catalog, receiver)?;
                    match resolver.resolve_member_access(
                        receiver_type,
                        &query.name,
                        query.arity,
                        span,
                        &loaded.types,
                    ) {
                        Ok(MemberAccess::Static(member)) => Ok(format!(
                            "static member {}.{}",
                            loaded.catalog.qualified_name(member.declaring_type),
                            query.name
                        )),
                        Ok(MemberAccess::Dynamic { name }) => Ok(format!("dynamic access `{name}`")),
                        Err(diag) => Err(diag),
                    }
                }
                None => {
                    let mut restrictions = lookup_restrictions::NONE;
                    if query.invocable {
                        restrictions |= lookup_restrictions::INVOCABLE_ONLY;
                    }
                    if query.exclude_extensions {
                        restrictions |= lookup_restrictions::EXCLUDE_EXTENSIONS;
                    }
                    let request = NameRequest::new(&query.name, span)
                        .with_arity(query.arity)
                        .with_restrictions(restrictions);
                    resolver
                        .resolve(&request, &loaded.scopes, &loaded.types)
                        .map(|reference| {
                            describe_reference(&loaded.catalog, &loaded.scopes, &reference)
                        })
                }
            };
            outcomes.push(match outcome {
                Ok(resolved) => QueryOutcome {
                    query: query_label(query),
                    resolved: Some(resolved),
                    code: None,
                },
                Err(diag) => {
                    let code = diag.code;
                    bag.report(diag);
                    QueryOutcome {
                        query: query_label(query),
                        resolved: None,
                        code: Some(code),
                    }
                }
            });
        }

        info!(
            queries = outcomes.len(),
            diagnostics = bag.len(),
            "resolution finished"
        );
        let forward_uses = resolver
            .take_forward_uses()
            .iter()
            .map(|ForwardUse { name, span, .. }| format!("{name} at {span}"))
            .collect();
        Ok(ResolveReport {
            outcomes,
            forward_uses,
            diagnostics: bag.into_vec(),
        })
    }
}

impl From<TypeKindDesc> for TypeKind {
    fn from(kind: TypeKindDesc) -> Self {
        match kind {
            TypeKindDesc::Class => TypeKind::Class,
            TypeKindDesc::Interface => TypeKind::Interface,
            TypeKindDesc::Struct => TypeKind::Struct,
            TypeKindDesc::Enum => TypeKind::Enum,
            TypeKindDesc::Delegate => TypeKind::Delegate,
        }
    }
}

fn query_label(query: &QueryDesc) -> String {
    match &query.receiver {
        Some(receiver) => format!("{receiver}.{}", query.name),
        None => query.name.clone(),
    }
}

fn lookup_type(types: &HashMap<String, TypeId>, name: &str) -> Result<TypeId> {
    types
        .get(name)
        .copied()
        .with_context(|| format!("unknown type `{name}` (types must be listed before use)"))
}

/// `*` is the dynamic type; compiler aliases and `void` are builtins;
/// anything else is a qualified catalog type.
fn parse_type_ref(types: &HashMap<String, TypeId>, text: &str) -> Result<TypeRef> {
    if let Some(builtin) = parse_builtin(text) {
        return Ok(builtin);
    }
    lookup_type(types, text).map(TypeRef::Named)
}

/// Like [`parse_type_ref`], against a built catalog.
fn parse_type_ref_in(catalog: &TypeCatalog, text: &str) -> Result<TypeRef> {
    if let Some(builtin) = parse_builtin(text) {
        return Ok(builtin);
    }
    let (namespace, name) = match text.rsplit_once('.') {
        Some((ns, name)) => (ns, name),
        None => ("", text),
    };
    let mut ns = NamespaceId::ROOT;
    for part in namespace.split('.').filter(|p| !p.is_empty()) {
        match catalog.find_child_namespace(ns, part) {
            Some(child) => ns = child,
            None => bail!("unknown receiver type `{text}`"),
        }
    }
    match catalog.find_type_in_namespace(ns, name, 0) {
        Some(id) => Ok(TypeRef::Named(id)),
        None => bail!("unknown receiver type `{text}`"),
    }
}

fn parse_builtin(text: &str) -> Option<TypeRef> {
    match text {
        "*" => Some(TypeRef::Dynamic),
        "void" => Some(TypeRef::Builtin(BuiltinType::Void)),
        _ => BuiltinType::from_alias(text).map(TypeRef::Builtin),
    }
}
