//! Type Scope Stack - the enclosing types of an expression.

use crate::catalog::{NamespaceId, TypeCatalog, TypeId};

/// The enclosing type, then each lexically enclosing declaring type outward,
/// plus the namespace context used for type and global lookup.
#[derive(Clone, Debug, Default)]
pub struct TypeScopeStack {
    /// Innermost first.
    levels: Vec<TypeId>,
    /// The body being compiled is static (no `this`).
    is_static_context: bool,
    /// Type parameters of the method being compiled.
    method_type_parameters: Vec<String>,
    namespace: NamespaceId,
    /// Namespaces opened with `import pkg.*`.
    imports: Vec<NamespaceId>,
}

impl TypeScopeStack {
    /// Stack for code inside `enclosing`, following its declaring types.
    pub fn for_type(catalog: &TypeCatalog, enclosing: TypeId) -> Self {
        let levels = catalog.declaring_chain(enclosing);
        let namespace = catalog
            .get_type(enclosing)
            .map_or(NamespaceId::ROOT, |t| t.namespace);
        TypeScopeStack {
            levels,
            namespace,
            ..Self::default()
        }
    }

    /// Stack for top-level script code in `namespace`.
    pub fn top_level(namespace: NamespaceId) -> Self {
        TypeScopeStack {
            namespace,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_static_context(mut self, is_static: bool) -> Self {
        self.is_static_context = is_static;
        self
    }

    #[must_use]
    pub fn with_method_type_parameters(mut self, params: &[&str]) -> Self {
        self.method_type_parameters = params.iter().map(|p| p.to_string()).collect();
        self
    }

    #[must_use]
    pub fn with_imports(mut self, imports: Vec<NamespaceId>) -> Self {
        self.imports = imports;
        self
    }

    pub fn levels(&self) -> &[TypeId] {
        &self.levels
    }

    /// The type whose member body is being compiled.
    pub fn innermost(&self) -> Option<TypeId> {
        self.levels.first().copied()
    }

    pub fn is_static_context(&self) -> bool {
        self.is_static_context
    }

    pub fn method_type_parameters(&self) -> &[String] {
        &self.method_type_parameters
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    pub fn imports(&self) -> &[NamespaceId] {
        &self.imports
    }
}
