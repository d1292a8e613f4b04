//! Type/Member Catalog
//!
//! Read-only model of the types, members and namespaces declared by the
//! program and its libraries. The rest of the front end builds it once with
//! [`CatalogBuilder`]; the resolver only ever reads it, so a built catalog can
//! be shared across threads compiling different member bodies.
//!
//! Member lookup follows the base-type chain: the first type in the chain
//! with any matching member wins, which gives derived members the usual
//! hiding behaviour over inherited ones.

use crate::types::{BuiltinType, TypeRef};
use dynscope_common::limits::{MAX_BASE_CHAIN_DEPTH, MAX_NAMESPACE_DEPTH, MAX_TYPE_NESTING_DEPTH};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

// =============================================================================
// Identifiers
// =============================================================================

/// Index of a type in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const NONE: TypeId = TypeId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == TypeId::NONE
    }
}

/// Index of a namespace in the catalog. Namespace 0 is the unnamed root.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NamespaceId(pub u32);

impl NamespaceId {
    pub const ROOT: NamespaceId = NamespaceId(0);
}

/// A member, addressed by its declaring type and its slot in that type's table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId {
    pub owner: TypeId,
    pub index: u32,
}

// =============================================================================
// Definitions
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Event,
    /// A nested type declaration. Lookups that hit it defer to type resolution.
    NestedType(TypeId),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

/// One entry of a type's member table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    /// Number of generic parameters (methods and nested types only).
    pub arity: u32,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Extension methods are found through their container but are only
    /// candidates when the lookup does not exclude them.
    pub is_extension: bool,
    /// Field/property type, or method return type.
    pub value_type: Option<TypeRef>,
}

impl MemberDef {
    fn with_kind(name: &str, kind: MemberKind, value_type: Option<TypeRef>) -> Self {
        MemberDef {
            name: name.to_string(),
            kind,
            arity: 0,
            is_static: false,
            visibility: Visibility::Public,
            is_extension: false,
            value_type,
        }
    }

    pub fn field(name: &str, value_type: TypeRef) -> Self {
        Self::with_kind(name, MemberKind::Field, Some(value_type))
    }

    pub fn property(name: &str, value_type: TypeRef) -> Self {
        Self::with_kind(name, MemberKind::Property, Some(value_type))
    }

    pub fn method(name: &str, return_type: TypeRef) -> Self {
        Self::with_kind(name, MemberKind::Method, Some(return_type))
    }

    pub fn event(name: &str, handler_type: TypeRef) -> Self {
        Self::with_kind(name, MemberKind::Event, Some(handler_type))
    }

    #[must_use]
    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    /// Mark as an extension method (implicitly static).
    #[must_use]
    pub fn into_extension(mut self) -> Self {
        self.is_extension = true;
        self.is_static = true;
        self
    }

    pub fn is_method(&self) -> bool {
        self.kind == MemberKind::Method
    }

    pub fn nested_type(&self) -> Option<TypeId> {
        match self.kind {
            MemberKind::NestedType(id) => Some(id),
            _ => None,
        }
    }

    /// Whether a lookup with `arity` type arguments can name this member.
    ///
    /// Methods also match an arity-0 reference so that overload resolution can
    /// infer their type arguments later.
    pub fn matches_arity(&self, arity: u32) -> bool {
        self.arity == arity || (arity == 0 && self.is_method())
    }
}

/// A declared type.
#[derive(Clone, Debug)]
pub struct TypeDef {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub namespace: NamespaceId,
    /// Lexically enclosing type for nested declarations.
    pub declaring_type: Option<TypeId>,
    pub base: Option<TypeId>,
    pub type_parameters: Vec<String>,
    pub visibility: Visibility,
    /// Declared `dynamic`: instances accept expando members.
    pub is_dynamic: bool,
    members: Vec<MemberDef>,
    member_index: FxHashMap<String, SmallVec<[u32; 2]>>,
}

impl TypeDef {
    pub fn arity(&self) -> u32 {
        self.type_parameters.len() as u32
    }

    pub fn members(&self) -> &[MemberDef] {
        &self.members
    }

    /// Own members named `name`, in declaration order.
    pub fn members_named<'a>(&'a self, name: &str) -> impl Iterator<Item = (u32, &'a MemberDef)> {
        self.member_index
            .get(name)
            .into_iter()
            .flat_map(|slots| slots.iter())
            .map(move |&slot| (slot, &self.members[slot as usize]))
    }
}

/// A namespace and its directly contained top-level types.
#[derive(Clone, Debug)]
pub struct NamespaceDef {
    pub id: NamespaceId,
    pub name: String,
    pub parent: Option<NamespaceId>,
    types: FxHashMap<(String, u32), TypeId>,
    children: FxHashMap<String, NamespaceId>,
}

/// Result of a successful member lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberLookup {
    /// The type in the base chain where the members were found.
    pub found_in: TypeId,
    pub members: SmallVec<[MemberId; 2]>,
}

// =============================================================================
// TypeCatalog
// =============================================================================

/// Immutable catalog of types, members and namespaces.
#[derive(Clone, Debug)]
pub struct TypeCatalog {
    types: Vec<TypeDef>,
    namespaces: Vec<NamespaceDef>,
    builtins: FxHashMap<BuiltinType, TypeId>,
}

impl TypeCatalog {
    pub fn get_type(&self, id: TypeId) -> Option<&TypeDef> {
        self.types.get(id.0 as usize)
    }

    pub fn get_namespace(&self, id: NamespaceId) -> Option<&NamespaceDef> {
        self.namespaces.get(id.0 as usize)
    }

    pub fn member(&self, id: MemberId) -> Option<&MemberDef> {
        self.get_type(id.owner)
            .and_then(|ty| ty.members.get(id.index as usize))
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Catalog type standing in for a compiler-known alias, if one was bound.
    pub fn builtin_type(&self, builtin: BuiltinType) -> Option<TypeId> {
        self.builtins.get(&builtin).copied()
    }

    /// Dotted name including namespaces and declaring types, for diagnostics.
    pub fn qualified_name(&self, id: TypeId) -> String {
        let Some(ty) = self.get_type(id) else {
            return "<unknown>".to_string();
        };
        let prefix = match ty.declaring_type {
            Some(outer) => self.qualified_name(outer),
            None => self.namespace_path(ty.namespace),
        };
        if prefix.is_empty() {
            ty.name.clone()
        } else {
            format!("{prefix}.{}", ty.name)
        }
    }

    pub fn namespace_path(&self, id: NamespaceId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(ns_id) = current {
            depth += 1;
            if depth > MAX_NAMESPACE_DEPTH {
                break;
            }
            let Some(ns) = self.get_namespace(ns_id) else {
                break;
            };
            if !ns.name.is_empty() {
                parts.push(ns.name.as_str());
            }
            current = ns.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Top-level type `name` with `arity` generic parameters in namespace `ns`.
    pub fn find_type_in_namespace(&self, ns: NamespaceId, name: &str, arity: u32) -> Option<TypeId> {
        self.get_namespace(ns)?
            .types
            .get(&(name.to_string(), arity))
            .copied()
    }

    pub fn find_child_namespace(&self, ns: NamespaceId, name: &str) -> Option<NamespaceId> {
        self.get_namespace(ns)?.children.get(name).copied()
    }

    /// The namespace itself followed by each enclosing namespace out to the root.
    pub fn namespace_chain(&self, ns: NamespaceId) -> Vec<NamespaceId> {
        let mut chain = Vec::new();
        let mut current = Some(ns);
        while let Some(id) = current {
            if chain.len() as u32 >= MAX_NAMESPACE_DEPTH {
                break;
            }
            chain.push(id);
            current = self.get_namespace(id).and_then(|n| n.parent);
        }
        chain
    }

    /// `ty` followed by each lexically enclosing declaring type, outward.
    pub fn declaring_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(id) = current {
            if chain.len() as u32 >= MAX_TYPE_NESTING_DEPTH {
                trace!(type_id = id.0, "declaring chain exceeded nesting limit");
                break;
            }
            chain.push(id);
            current = self.get_type(id).and_then(|t| t.declaring_type);
        }
        chain
    }

    /// `ty` followed by each base type.
    pub fn base_chain(&self, ty: TypeId) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(id) = current {
            if chain.len() as u32 >= MAX_BASE_CHAIN_DEPTH || chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = self.get_type(id).and_then(|t| t.base);
        }
        chain
    }

    pub fn is_subtype_of(&self, ty: TypeId, ancestor: TypeId) -> bool {
        self.base_chain(ty).contains(&ancestor)
    }

    /// Whether `inner` is `outer` or is declared (transitively) inside it.
    pub fn is_nested_within(&self, inner: TypeId, outer: TypeId) -> bool {
        self.declaring_chain(inner).contains(&outer)
    }

    /// Whether code inside `context` may see `member` declared on `owner`.
    ///
    /// `None` is code outside any type (top-level script code).
    pub fn is_accessible(&self, owner: TypeId, member: &MemberDef, context: Option<TypeId>) -> bool {
        match member.visibility {
            Visibility::Public | Visibility::Internal => true,
            Visibility::Private => context.is_some_and(|ctx| self.is_nested_within(ctx, owner)),
            Visibility::Protected => context.is_some_and(|ctx| {
                self.declaring_chain(ctx)
                    .into_iter()
                    .any(|t| self.is_subtype_of(t, owner))
            }),
        }
    }

    /// Whether a type was declared `dynamic` (or is a dynamic builtin stand-in).
    pub fn is_dynamic(&self, ty: TypeId) -> bool {
        if self.get_type(ty).is_some_and(|t| t.is_dynamic) {
            return true;
        }
        self.builtins
            .iter()
            .any(|(builtin, &id)| id == ty && builtin.is_dynamic())
    }

    /// Whether a value of this member can be invoked with call syntax.
    pub fn is_invocable(&self, member: &MemberDef) -> bool {
        match member.kind {
            MemberKind::Method => true,
            MemberKind::NestedType(_) => false,
            MemberKind::Field | MemberKind::Property | MemberKind::Event => match member.value_type
            {
                Some(TypeRef::Builtin(BuiltinType::Function)) | Some(TypeRef::Dynamic) => true,
                Some(TypeRef::Named(id)) => self
                    .get_type(id)
                    .is_some_and(|t| t.kind == TypeKind::Delegate),
                _ => false,
            },
        }
    }

    /// Find members named `name` usable with `arity` type arguments on `ty`
    /// or its bases. `filter` can reject individual candidates (accessibility,
    /// extension exclusion, invocability).
    pub fn lookup_members(
        &self,
        ty: TypeId,
        name: &str,
        arity: u32,
        mut filter: impl FnMut(TypeId, &MemberDef) -> bool,
    ) -> Option<MemberLookup> {
        for current in self.base_chain(ty) {
            let Some(def) = self.get_type(current) else {
                continue;
            };
            let members: SmallVec<[MemberId; 2]> = def
                .members_named(name)
                .filter(|(_, m)| m.matches_arity(arity) && filter(current, m))
                .map(|(slot, _)| MemberId {
                    owner: current,
                    index: slot,
                })
                .collect();
            if !members.is_empty() {
                trace!(
                    name,
                    arity,
                    found_in = current.0,
                    count = members.len(),
                    "lookup_members hit"
                );
                return Some(MemberLookup {
                    found_in: current,
                    members,
                });
            }
        }
        None
    }

    /// Nested type `name`/`arity` declared in `ty` or inherited from a base.
    pub fn find_nested_type(&self, ty: TypeId, name: &str, arity: u32) -> Option<TypeId> {
        self.base_chain(ty).into_iter().find_map(|current| {
            self.get_type(current)?
                .members_named(name)
                .find_map(|(_, m)| m.nested_type().filter(|_| m.arity == arity))
        })
    }
}

// =============================================================================
// CatalogBuilder
// =============================================================================

/// Declaration of a type to add to a [`CatalogBuilder`].
#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub namespace: NamespaceId,
    pub declaring_type: Option<TypeId>,
    pub base: Option<TypeId>,
    pub type_parameters: Vec<String>,
    pub visibility: Visibility,
    pub is_dynamic: bool,
}

impl TypeDecl {
    pub fn new(name: &str, kind: TypeKind) -> Self {
        TypeDecl {
            name: name.to_string(),
            kind,
            namespace: NamespaceId::ROOT,
            declaring_type: None,
            base: None,
            type_parameters: Vec::new(),
            visibility: Visibility::Public,
            is_dynamic: false,
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class)
    }

    #[must_use]
    pub fn in_namespace(mut self, ns: NamespaceId) -> Self {
        self.namespace = ns;
        self
    }

    #[must_use]
    pub fn nested_in(mut self, outer: TypeId) -> Self {
        self.declaring_type = Some(outer);
        self
    }

    #[must_use]
    pub fn extends(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn generic(mut self, params: &[&str]) -> Self {
        self.type_parameters = params.iter().map(|p| p.to_string()).collect();
        self
    }

    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Mutable builder producing an immutable [`TypeCatalog`].
pub struct CatalogBuilder {
    types: Vec<TypeDef>,
    namespaces: Vec<NamespaceDef>,
    builtins: FxHashMap<BuiltinType, TypeId>,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        CatalogBuilder {
            types: Vec::new(),
            namespaces: vec![NamespaceDef {
                id: NamespaceId::ROOT,
                name: String::new(),
                parent: None,
                types: FxHashMap::default(),
                children: FxHashMap::default(),
            }],
            builtins: FxHashMap::default(),
        }
    }

    /// Get or create child namespace `name` of `parent`.
    pub fn namespace(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        if let Some(&existing) = self.namespaces[parent.0 as usize].children.get(name) {
            return existing;
        }
        let id = NamespaceId(self.namespaces.len() as u32);
        self.namespaces.push(NamespaceDef {
            id,
            name: name.to_string(),
            parent: Some(parent),
            types: FxHashMap::default(),
            children: FxHashMap::default(),
        });
        self.namespaces[parent.0 as usize]
            .children
            .insert(name.to_string(), id);
        id
    }

    /// Get or create the namespace at a dotted path such as `flash.display`.
    pub fn namespace_path(&mut self, path: &str) -> NamespaceId {
        path.split('.')
            .filter(|part| !part.is_empty())
            .fold(NamespaceId::ROOT, |ns, part| self.namespace(ns, part))
    }

    /// Add a type. Nested types are registered as a member of their declaring
    /// type; top-level types are registered in their namespace.
    pub fn add_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        let arity = decl.type_parameters.len() as u32;
        let declaring_type = decl.declaring_type;
        let namespace = declaring_type
            .and_then(|outer| self.types.get(outer.0 as usize))
            .map_or(decl.namespace, |outer| outer.namespace);
        let visibility = decl.visibility;
        let name = decl.name.clone();
        self.types.push(TypeDef {
            id,
            name: decl.name,
            kind: decl.kind,
            namespace,
            declaring_type,
            base: decl.base,
            type_parameters: decl.type_parameters,
            visibility,
            is_dynamic: decl.is_dynamic,
            members: Vec::new(),
            member_index: FxHashMap::default(),
        });
        match declaring_type {
            Some(outer) => {
                let member = MemberDef {
                    name,
                    kind: MemberKind::NestedType(id),
                    arity,
                    is_static: true,
                    visibility,
                    is_extension: false,
                    value_type: None,
                };
                self.add_member(outer, member);
            }
            None => {
                self.namespaces[namespace.0 as usize]
                    .types
                    .insert((name, arity), id);
            }
        }
        id
    }

    /// Append a member to `ty`'s table. Returns `None` for an unknown type.
    pub fn add_member(&mut self, ty: TypeId, member: MemberDef) -> Option<MemberId> {
        let def = self.types.get_mut(ty.0 as usize)?;
        let slot = def.members.len() as u32;
        def.member_index
            .entry(member.name.clone())
            .or_default()
            .push(slot);
        def.members.push(member);
        Some(MemberId {
            owner: ty,
            index: slot,
        })
    }

    /// Use catalog type `ty` as the member table of a compiler-known alias.
    pub fn bind_builtin(&mut self, builtin: BuiltinType, ty: TypeId) {
        self.builtins.insert(builtin, ty);
    }

    pub fn build(self) -> TypeCatalog {
        TypeCatalog {
            types: self.types,
            namespaces: self.namespaces,
            builtins: self.builtins,
        }
    }
}

#[cfg(test)]
#[path = "../tests/catalog_tests.rs"]
mod tests;
