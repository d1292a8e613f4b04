//! The late-bound member dispatch seam.

use crate::error::BindError;
use crate::value::{TypeToken, Value};

/// Host facility that reads, writes and probes declared members by name at
/// run time.
///
/// `target` is an instance, or a [`Value::Class`] for static members.
/// `context` is the statically known requesting type and decides which
/// private and protected members are visible.
///
/// Implementations report an absent member with [`BindError::NoSuchMember`]
/// and use the other variants only for real failures; the dispatcher relies on
/// that distinction to decide when an assignment becomes an expando write.
pub trait LateBinder: Send + Sync {
    fn get_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<Value, BindError>;

    fn set_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
        value: Value,
    ) -> Result<(), BindError>;

    /// Whether `target` exposes `name` visibly from `context`. Instances see
    /// instance members and class tokens see static members.
    fn has_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<bool, BindError>;

    /// Run-time type name of `target`, for messages.
    fn type_name(&self, target: &Value) -> String {
        target.type_name().to_string()
    }
}

impl<B: LateBinder + ?Sized> LateBinder for std::sync::Arc<B> {
    fn get_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<Value, BindError> {
        (**self).get_member(target, context, name)
    }

    fn set_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
        value: Value,
    ) -> Result<(), BindError> {
        (**self).set_member(target, context, name, value)
    }

    fn has_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<bool, BindError> {
        (**self).has_member(target, context, name)
    }

    fn type_name(&self, target: &Value) -> String {
        (**self).type_name(target)
    }
}
