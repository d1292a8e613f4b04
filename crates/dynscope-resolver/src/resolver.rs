//! Name Resolver
//!
//! Resolves a bare identifier to exactly one interpretation. The stages run
//! in a fixed order and the first stage that decides (found, ambiguous or
//! invalid) ends resolution:
//!
//! 0. compiler-known aliases (`int`, `Number`, ...)
//! 1. locals on the scope chain, innermost block first
//! 2. members of the enclosing types, innermost type first
//! 3. globals, through the `name_fn` container and then the catch-all container
//! 4. types, namespaces and type parameters
//!
//! A failed identifier produces a diagnostic; callers keep resolving sibling
//! expressions (see [`NameResolver::resolve_into`]).

use crate::catalog::{MemberDef, MemberLookup, NamespaceId, TypeCatalog, TypeId};
use crate::resolution::{
    ForwardUse, MemberAccess, MemberRef, NameRequest, ResolvedReference, StageResult,
    TypeParameterRef, lookup_restrictions,
};
use crate::scope::{LocalHit, ScopeChain};
use crate::type_scope::TypeScopeStack;
use crate::types::{BuiltinType, TypeRef};
use dynscope_common::{Diagnostic, DiagnosticSink, Span, diagnostic_codes};
use serde::Deserialize;
use tracing::{Level, debug, span, trace};

/// Configuration options for the resolver.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverOptions {
    /// File name attached to diagnostics.
    pub file_name: String,
    /// Suffix of the per-function global container (`trace` -> `trace_fn`).
    pub function_suffix: String,
    /// Catch-all container holding the remaining global functions and variables.
    pub globals_container: String,
    /// Keep a record of same-block forward uses for later ordering checks.
    pub record_forward_uses: bool,
    /// Resolve reserved bare names (`int`, `Number`, ...) as compiler aliases.
    pub compiler_aliases: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverOptions {
            file_name: String::new(),
            function_suffix: "_fn".to_string(),
            globals_container: "_root".to_string(),
            record_forward_uses: true,
            compiler_aliases: true,
        }
    }
}

/// Resolver for the identifiers of one compilation.
///
/// Holds the shared read-only catalog; the scope chain and type scope stack
/// are supplied per request because they change as the body is walked.
pub struct NameResolver<'c> {
    catalog: &'c TypeCatalog,
    options: ResolverOptions,
    forward_uses: Vec<ForwardUse>,
}

impl<'c> NameResolver<'c> {
    pub fn new(catalog: &'c TypeCatalog, options: ResolverOptions) -> Self {
        NameResolver {
            catalog,
            options,
            forward_uses: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &'c TypeCatalog {
        self.catalog
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Locals referenced before their declaration in the same block.
    pub fn forward_uses(&self) -> &[ForwardUse] {
        &self.forward_uses
    }

    pub fn take_forward_uses(&mut self) -> Vec<ForwardUse> {
        std::mem::take(&mut self.forward_uses)
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Resolve `request` at the current position of `scopes`.
    pub fn resolve(
        &mut self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        types: &TypeScopeStack,
    ) -> Result<ResolvedReference, Diagnostic> {
        let span = span!(
            Level::DEBUG,
            "resolve",
            name = request.name,
            arity = request.arity
        );
        let _enter = span.enter();

        // A local that exists in an ancestor block but is not declared yet at
        // this position. It does not resolve, but it conflicts with any
        // type/namespace interpretation of the same spelling.
        let mut pending: Option<LocalHit> = None;

        let outcome = self
            .stage_compiler_alias(request)
            .or_else(|| self.stage_local(request, scopes, &mut pending))
            .or_else(|| self.stage_enclosing_members(request, scopes, types, pending))
            .or_else(|| self.stage_globals(request, types))
            .or_else(|| self.stage_type_or_namespace(request, scopes, types, pending));

        match outcome {
            StageResult::Found(reference) => {
                debug!(reference = ?reference, "resolved");
                Ok(reference)
            }
            StageResult::Ambiguous(diag) | StageResult::Invalid(diag) => {
                debug!(code = diag.code, "resolution failed");
                Err(diag)
            }
            StageResult::NotFound => Err(self.not_found(request, scopes, types, pending)),
        }
    }

    /// Resolve and report any failure into `sink` instead of returning it.
    pub fn resolve_into(
        &mut self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        types: &TypeScopeStack,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<ResolvedReference> {
        match self.resolve(request, scopes, types) {
            Ok(reference) => Some(reference),
            Err(diag) => {
                sink.report(diag);
                None
            }
        }
    }

    /// Classify `receiver.name` as a static member reference or a dynamic access.
    ///
    /// Receivers typed `*`, untyped, `Object`, or of a class declared
    /// `dynamic` fall back to dynamic access when no declared member matches.
    pub fn resolve_member_access(
        &self,
        receiver: TypeRef,
        name: &str,
        arity: u32,
        span: Span,
        types: &TypeScopeStack,
    ) -> Result<MemberAccess, Diagnostic> {
        let dynamic = || MemberAccess::Dynamic {
            name: name.to_string(),
        };
        let target = match receiver {
            TypeRef::Dynamic | TypeRef::Unknown => {
                trace!(name, "untyped receiver, dynamic access");
                return Ok(dynamic());
            }
            TypeRef::Named(id) => id,
            TypeRef::Builtin(builtin) => match self.catalog.builtin_type(builtin) {
                Some(id) => id,
                None if builtin.is_dynamic() => return Ok(dynamic()),
                None => {
                    return Err(self.diagnostic(
                        span,
                        diagnostic_codes::TYPE_DOES_NOT_CONTAIN_DEFINITION,
                        &[builtin.name(), name],
                    ));
                }
            },
        };

        let context = types.innermost();
        if let Some(found) = self.catalog.lookup_members(target, name, arity, |owner, m| {
            self.catalog.is_accessible(owner, m, context)
        }) {
            return Ok(MemberAccess::Static(self.member_ref(found, 0)));
        }

        let type_name = self.catalog.qualified_name(target);
        if self
            .catalog
            .lookup_members(target, name, arity, |_, _| true)
            .is_some()
        {
            let member_name = format!("{type_name}.{name}");
            return Err(self.diagnostic(
                span,
                diagnostic_codes::MEMBER_IS_INACCESSIBLE_DUE_TO_PROTECTION_LEVEL,
                &[&member_name],
            ));
        }
        if self.catalog.is_dynamic(target) {
            trace!(name, receiver = %type_name, "dynamic receiver, expando access");
            return Ok(dynamic());
        }
        Err(self.diagnostic(
            span,
            diagnostic_codes::TYPE_DOES_NOT_CONTAIN_DEFINITION,
            &[&type_name, name],
        ))
    }

    // =========================================================================
    // Stages
    // =========================================================================

    /// Stage 0: reserved bare names take precedence over every other stage.
    fn stage_compiler_alias(&self, request: &NameRequest<'_>) -> StageResult {
        if !self.options.compiler_aliases || request.arity != 0 {
            return StageResult::NotFound;
        }
        match BuiltinType::from_alias(request.name) {
            Some(builtin) => {
                trace!(alias = %builtin, "compiler alias");
                StageResult::Found(ResolvedReference::CompilerAlias(builtin))
            }
            None => StageResult::NotFound,
        }
    }

    /// Stage 1: locals, innermost block first.
    fn stage_local(
        &mut self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        pending: &mut Option<LocalHit>,
    ) -> StageResult {
        let Some(hit) = scopes.lookup(request.name) else {
            return StageResult::NotFound;
        };
        let Some(local) = scopes.local(hit.id) else {
            return StageResult::NotFound;
        };

        // Forward use is only permitted within the declaring block.
        if !local.is_declared && !hit.is_immediate() {
            trace!(
                local = hit.id.0,
                depth = hit.depth,
                "local pending in ancestor block"
            );
            *pending = Some(hit);
            return StageResult::NotFound;
        }

        if request.arity > 0 {
            return StageResult::Invalid(self.diagnostic(
                request.span,
                diagnostic_codes::VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS,
                &[request.name],
            ));
        }

        let forward = !local.is_declared;
        if forward && self.options.record_forward_uses {
            self.forward_uses.push(ForwardUse {
                local: hit.id,
                name: request.name.to_string(),
                span: request.span,
            });
        }
        trace!(local = hit.id.0, depth = hit.depth, forward, "local");
        StageResult::Found(ResolvedReference::Local { id: hit.id, forward })
    }

    /// Stage 2: members of each enclosing type, innermost first. The first
    /// level with any match decides, even when the match turns out invalid.
    fn stage_enclosing_members(
        &self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        types: &TypeScopeStack,
        pending: Option<LocalHit>,
    ) -> StageResult {
        let context = types.innermost();
        for (level, &ty) in types.levels().iter().enumerate() {
            let Some(found) =
                self.catalog
                    .lookup_members(ty, request.name, request.arity, |owner, m| {
                        self.member_qualifies(request, owner, m, context)
                    })
            else {
                continue;
            };

            let nested = self
                .catalog
                .member(found.members[0])
                .and_then(MemberDef::nested_type);
            if let Some(nested) = nested {
                trace!(level, nested = nested.0, "nested type, deferring to type lookup");
                return self.finish_type_or_namespace(
                    request,
                    ResolvedReference::Type(nested),
                    scopes,
                    pending,
                );
            }
            return self.enclosing_member(request, found, level, types);
        }
        StageResult::NotFound
    }

    /// Stage 3: `name_fn` container first, then the catch-all container.
    fn stage_globals(&self, request: &NameRequest<'_>, types: &TypeScopeStack) -> StageResult {
        let suffixed = format!("{}{}", request.name, self.options.function_suffix);
        let containers = [suffixed.as_str(), self.options.globals_container.as_str()];
        for container in containers {
            let Some(container_ty) = self.find_top_level_type(container, 0, types) else {
                trace!(container, "no global container");
                continue;
            };
            let found = self.catalog.lookup_members(
                container_ty,
                request.name,
                request.arity,
                |owner, m| m.is_static && self.member_qualifies(request, owner, m, types.innermost()),
            );
            if let Some(found) = found {
                trace!(container, "global");
                return StageResult::Found(ResolvedReference::Global(self.member_ref(found, 0)));
            }
        }
        StageResult::NotFound
    }

    /// Stage 4: type parameters, nested types, namespace types and namespaces.
    fn stage_type_or_namespace(
        &self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        types: &TypeScopeStack,
        pending: Option<LocalHit>,
    ) -> StageResult {
        if request.has_restriction(lookup_restrictions::INVOCABLE_ONLY) {
            return StageResult::NotFound;
        }
        match self.lookup_type_or_namespace(request, types) {
            Some(reference) => self.finish_type_or_namespace(request, reference, scopes, pending),
            None => StageResult::NotFound,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn member_qualifies(
        &self,
        request: &NameRequest<'_>,
        owner: TypeId,
        member: &MemberDef,
        context: Option<TypeId>,
    ) -> bool {
        if member.is_extension && request.has_restriction(lookup_restrictions::EXCLUDE_EXTENSIONS)
        {
            return false;
        }
        if request.has_restriction(lookup_restrictions::INVOCABLE_ONLY)
            && !self.catalog.is_invocable(member)
        {
            return false;
        }
        self.catalog.is_accessible(owner, member, context)
    }

    fn member_ref(&self, found: MemberLookup, level: usize) -> MemberRef {
        let defs: Vec<&MemberDef> = found
            .members
            .iter()
            .filter_map(|&id| self.catalog.member(id))
            .collect();
        MemberRef {
            declaring_type: found.found_in,
            is_static: defs.iter().all(|m| m.is_static),
            is_method_group: !defs.is_empty() && defs.iter().all(|m| m.is_method()),
            members: found.members,
            level: level as u32,
        }
    }

    /// Validate a stage 2 match. Instance fields and properties need a `this`:
    /// none exists in a static body, and an outer type's `this` is not
    /// reachable from a nested type. Method groups are left to overload
    /// resolution, which knows which overload is picked.
    fn enclosing_member(
        &self,
        request: &NameRequest<'_>,
        found: MemberLookup,
        level: usize,
        types: &TypeScopeStack,
    ) -> StageResult {
        let member = self.member_ref(found, level);
        if member.is_static || member.is_method_group {
            return StageResult::Found(ResolvedReference::Member(member));
        }

        if level > 0 {
            let outer = self.catalog.qualified_name(types.levels()[level]);
            let nested = types
                .innermost()
                .map(|t| self.catalog.qualified_name(t))
                .unwrap_or_default();
            return StageResult::Invalid(self.diagnostic(
                request.span,
                diagnostic_codes::CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE,
                &[&outer, &nested],
            ));
        }
        if types.is_static_context() {
            let qualified = format!(
                "{}.{}",
                self.catalog.qualified_name(member.declaring_type),
                request.name
            );
            return StageResult::Invalid(self.diagnostic(
                request.span,
                diagnostic_codes::OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER,
                &[&qualified],
            ));
        }
        StageResult::Found(ResolvedReference::Member(member))
    }

    /// A type/namespace interpretation conflicts with a pending ancestor local.
    fn finish_type_or_namespace(
        &self,
        request: &NameRequest<'_>,
        reference: ResolvedReference,
        scopes: &ScopeChain,
        pending: Option<LocalHit>,
    ) -> StageResult {
        match pending {
            Some(hit) => {
                debug!(local = hit.id.0, "type/namespace conflicts with pending local");
                StageResult::Ambiguous(self.with_local_related(
                    self.diagnostic(
                        request.span,
                        diagnostic_codes::NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK,
                        &[request.name],
                    ),
                    scopes,
                    hit,
                ))
            }
            None => StageResult::Found(reference),
        }
    }

    fn lookup_type_or_namespace(
        &self,
        request: &NameRequest<'_>,
        types: &TypeScopeStack,
    ) -> Option<ResolvedReference> {
        let (name, arity) = (request.name, request.arity);

        if arity == 0 {
            if let Some(index) = types.method_type_parameters().iter().position(|p| p == name) {
                return Some(ResolvedReference::TypeParameter(TypeParameterRef::Method {
                    index: index as u32,
                }));
            }
        }

        for &ty in types.levels() {
            if arity == 0 {
                let param = self
                    .catalog
                    .get_type(ty)
                    .and_then(|def| def.type_parameters.iter().position(|p| p == name));
                if let Some(index) = param {
                    return Some(ResolvedReference::TypeParameter(TypeParameterRef::Type {
                        owner: ty,
                        index: index as u32,
                    }));
                }
            }
            if let Some(nested) = self.catalog.find_nested_type(ty, name, arity) {
                return Some(ResolvedReference::Type(nested));
            }
        }

        for ns in self.catalog.namespace_chain(types.namespace()) {
            if let Some(ty) = self.catalog.find_type_in_namespace(ns, name, arity) {
                return Some(ResolvedReference::Type(ty));
            }
            if arity == 0 {
                if let Some(child) = self.catalog.find_child_namespace(ns, name) {
                    return Some(ResolvedReference::Namespace(child));
                }
            }
        }

        types
            .imports()
            .iter()
            .find_map(|&ns| self.catalog.find_type_in_namespace(ns, name, arity))
            .map(ResolvedReference::Type)
    }

    /// Top-level type visible from the current namespace or an import.
    fn find_top_level_type(&self, name: &str, arity: u32, types: &TypeScopeStack) -> Option<TypeId> {
        let from_chain = self
            .catalog
            .namespace_chain(types.namespace())
            .into_iter()
            .find_map(|ns| self.catalog.find_type_in_namespace(ns, name, arity));
        from_chain.or_else(|| {
            types
                .imports()
                .iter()
                .find_map(|&ns: &NamespaceId| self.catalog.find_type_in_namespace(ns, name, arity))
        })
    }

    fn not_found(
        &self,
        request: &NameRequest<'_>,
        scopes: &ScopeChain,
        types: &TypeScopeStack,
        pending: Option<LocalHit>,
    ) -> Diagnostic {
        if let Some(hit) = pending {
            return self.with_local_related(
                self.diagnostic(
                    request.span,
                    diagnostic_codes::LOCAL_VARIABLE_USED_BEFORE_DECLARED,
                    &[request.name],
                ),
                scopes,
                hit,
            );
        }

        if request.has_restriction(lookup_restrictions::INVOCABLE_ONLY) {
            let context = types.innermost();
            let non_invocable = types.levels().iter().any(|&ty| {
                self.catalog
                    .lookup_members(ty, request.name, request.arity, |owner, m| {
                        self.catalog.is_accessible(owner, m, context)
                    })
                    .is_some()
            });
            if non_invocable {
                return self.diagnostic(
                    request.span,
                    diagnostic_codes::MEMBER_GROUP_IS_NOT_INVOCABLE,
                    &[request.name],
                );
            }
        }

        debug!(name = request.name, "unresolved identifier");
        self.diagnostic(
            request.span,
            diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT,
            &[request.name],
        )
    }

    fn diagnostic(&self, span: Span, code: u32, args: &[&str]) -> Diagnostic {
        Diagnostic::from_code(&self.options.file_name, span, code, args)
    }

    fn with_local_related(&self, diag: Diagnostic, scopes: &ScopeChain, hit: LocalHit) -> Diagnostic {
        match scopes.local(hit.id) {
            Some(local) => diag.with_related(
                self.options.file_name.clone(),
                local.span,
                format!("`{}' is declared here", local.name),
            ),
            None => diag,
        }
    }
}

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "../tests/member_access_tests.rs"]
mod member_access_tests;
