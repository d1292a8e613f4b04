//! Resolution requests and results.

use crate::catalog::{MemberId, NamespaceId, TypeId};
use crate::scope::LocalId;
use crate::types::BuiltinType;
use dynscope_common::{Diagnostic, Span};
use smallvec::SmallVec;

/// Lookup restriction flags carried by a [`NameRequest`].
pub mod lookup_restrictions {
    pub const NONE: u32 = 0;
    /// The name is being invoked: only invocable results qualify, and
    /// type/namespace interpretations are not allowed.
    pub const INVOCABLE_ONLY: u32 = 1 << 0;
    /// Skip extension-method candidates during member lookup.
    pub const EXCLUDE_EXTENSIONS: u32 = 1 << 1;
}

/// A bare identifier to resolve.
#[derive(Clone, Copy, Debug)]
pub struct NameRequest<'a> {
    pub name: &'a str,
    /// Number of type arguments written after the name.
    pub arity: u32,
    pub span: Span,
    pub restrictions: u32,
}

impl<'a> NameRequest<'a> {
    pub fn new(name: &'a str, span: Span) -> Self {
        NameRequest {
            name,
            arity: 0,
            span,
            restrictions: lookup_restrictions::NONE,
        }
    }

    #[must_use]
    pub fn with_arity(mut self, arity: u32) -> Self {
        self.arity = arity;
        self
    }

    #[must_use]
    pub fn with_restrictions(mut self, restrictions: u32) -> Self {
        self.restrictions = restrictions;
        self
    }

    #[inline]
    pub fn has_restriction(&self, flag: u32) -> bool {
        (self.restrictions & flag) != 0
    }
}

/// A reference to one member or a method group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberRef {
    /// Type in the base chain that declares the members.
    pub declaring_type: TypeId,
    /// One entry for fields/properties; all overloads for a method group.
    pub members: SmallVec<[MemberId; 2]>,
    pub is_static: bool,
    pub is_method_group: bool,
    /// Index on the type scope stack where the lookup matched (0 = innermost).
    pub level: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeParameterRef {
    Method { index: u32 },
    Type { owner: TypeId, index: u32 },
}

/// What a bare name refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedReference {
    Local {
        id: LocalId,
        /// Used before its declaration within the same block.
        forward: bool,
    },
    /// Member of an enclosing type.
    Member(MemberRef),
    /// Static member of a global container type (`name_fn` or the catch-all).
    Global(MemberRef),
    Type(TypeId),
    Namespace(NamespaceId),
    TypeParameter(TypeParameterRef),
    CompilerAlias(BuiltinType),
}

impl ResolvedReference {
    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedReference::Local { .. })
    }

    pub fn is_type_or_namespace(&self) -> bool {
        matches!(
            self,
            ResolvedReference::Type(_)
                | ResolvedReference::Namespace(_)
                | ResolvedReference::TypeParameter(_)
                | ResolvedReference::CompilerAlias(_)
        )
    }
}

/// How `receiver.name` is accessed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberAccess {
    /// Statically declared member; emitted as a direct member reference.
    Static(MemberRef),
    /// Receiver is of dynamic type and has no such declared member; emitted
    /// as a call into the dynamic dispatcher.
    Dynamic { name: String },
}

/// Outcome of one resolution stage.
///
/// Stages run in a fixed order and the first result other than `NotFound`
/// ends resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageResult {
    NotFound,
    Found(ResolvedReference),
    Ambiguous(Diagnostic),
    Invalid(Diagnostic),
}

impl StageResult {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StageResult::NotFound)
    }

    /// Run `next` only if this stage found nothing.
    #[inline]
    pub fn or_else(self, next: impl FnOnce() -> StageResult) -> StageResult {
        match self {
            StageResult::NotFound => next(),
            decided => decided,
        }
    }
}

/// A local referenced before its declaration in the same block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardUse {
    pub local: LocalId,
    pub name: String,
    pub span: Span,
}
