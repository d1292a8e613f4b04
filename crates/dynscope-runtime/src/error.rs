//! Run-time errors.

use thiserror::Error;

/// Failure reported by a [`LateBinder`](crate::LateBinder).
///
/// Only [`BindError::NoSuchMember`] means the member does not exist; every
/// other variant is a real failure that callers propagate.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("`{type_name}` has no member `{name}`")]
    NoSuchMember { type_name: String, name: String },

    #[error("`{type_name}.{name}` is read-only")]
    ReadOnly { type_name: String, name: String },

    #[error("cannot assign a value of type {actual} to `{type_name}.{name}` of type {expected}")]
    TypeMismatch {
        type_name: String,
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("`{type_name}.{name}` is inaccessible due to its protection level")]
    Inaccessible { type_name: String, name: String },

    #[error("late binding failed: {0}")]
    Internal(String),
}

impl BindError {
    pub fn no_such_member(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        BindError::NoSuchMember {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    #[inline]
    pub fn is_no_such_member(&self) -> bool {
        matches!(self, BindError::NoSuchMember { .. })
    }
}

/// Failure of a [`DynamicDispatcher`](crate::DynamicDispatcher) operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("cannot access a member of a null or undefined reference")]
    NullTarget,

    #[error("member name must not be null or undefined")]
    InvalidName,

    #[error("property `{name}` not found on `{type_name}` and there is no default value")]
    MemberNotFound { type_name: String, name: String },

    #[error("cannot create property `{name}` on a value of type {type_name}")]
    NotExpandable { type_name: String, name: String },

    #[error(transparent)]
    Bind(#[from] BindError),
}

impl DispatchError {
    /// Whether the failure only says the member is absent.
    pub fn is_member_not_found(&self) -> bool {
        matches!(self, DispatchError::MemberNotFound { .. })
    }
}
