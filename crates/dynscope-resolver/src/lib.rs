//! Identifier resolution for a statically-typed language with dynamic members.
//!
//! - [`catalog`] - read-only model of types, members and namespaces
//! - [`scope`] - lexical blocks and their locals
//! - [`type_scope`] - the enclosing types of the code being compiled
//! - [`resolver`] - the staged [`NameResolver`]

pub mod catalog;
pub mod resolution;
pub mod resolver;
pub mod scope;
pub mod type_scope;
pub mod types;

pub use catalog::{
    CatalogBuilder, MemberDef, MemberId, MemberKind, MemberLookup, NamespaceDef, NamespaceId,
    TypeCatalog, TypeDecl, TypeDef, TypeId, TypeKind, Visibility,
};
pub use resolution::{
    ForwardUse, MemberAccess, MemberRef, NameRequest, ResolvedReference, StageResult,
    TypeParameterRef, lookup_restrictions,
};
pub use resolver::{NameResolver, ResolverOptions};
pub use scope::{Block, BlockId, LocalHit, LocalId, LocalVariable, ScopeChain};
pub use type_scope::TypeScopeStack;
pub use types::{BuiltinType, TypeRef};
