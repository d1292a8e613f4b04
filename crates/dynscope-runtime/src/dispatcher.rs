//! Dynamic Dispatcher
//!
//! Member access on values whose static type does not declare the member.
//! Reads consult the side table first, so expando members shadow declared
//! ones; writes go to the host binder first and only become expando writes
//! when the binder reports that no such member exists.

use crate::binder::LateBinder;
use crate::error::{BindError, DispatchError};
use crate::side_table::{DispatchOptions, DynamicSideTable};
use crate::value::{TypeToken, Value};
use std::sync::Arc;
use tracing::{debug, trace};

pub struct DynamicDispatcher<B> {
    binder: B,
    table: Arc<DynamicSideTable>,
}

impl<B: LateBinder> DynamicDispatcher<B> {
    /// Dispatcher over an existing side table. Dispatchers sharing a table
    /// see the same expando members.
    pub fn new(binder: B, table: Arc<DynamicSideTable>) -> Self {
        DynamicDispatcher { binder, table }
    }

    /// Dispatcher with a fresh side table.
    pub fn with_options(binder: B, options: &DispatchOptions) -> Self {
        Self::new(binder, Arc::new(DynamicSideTable::new(options)))
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn side_table(&self) -> &Arc<DynamicSideTable> {
        &self.table
    }

    /// Read `target[name]`.
    pub fn get_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &Value,
    ) -> Result<Value, DispatchError> {
        let name = validate(target, name)?;
        if let Value::Object(obj) = target {
            if let Some(value) = self.table.get(obj, &name) {
                trace!(name = %name, "expando read");
                return Ok(value);
            }
        }
        self.binder
            .get_member(target, context, &name)
            .map_err(|err| self.not_found(target, &name, err))
    }

    /// Write `target[name] = value`, creating an expando member when the
    /// target declares no such member.
    pub fn set_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &Value,
        value: Value,
    ) -> Result<(), DispatchError> {
        let name = validate(target, name)?;
        // The binder consumes the value, so keep a copy for the fallback.
        match self
            .binder
            .set_member(target, context, &name, value.clone())
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_no_such_member() => match target {
                Value::Object(obj) => {
                    debug!(name = %name, object = obj.identity(), "expando write");
                    self.table.set(obj, &name, value);
                    Ok(())
                }
                _ => Err(DispatchError::NotExpandable {
                    type_name: self.binder.type_name(target),
                    name,
                }),
            },
            Err(err) => {
                trace!(name = %name, error = %err, "late-bound set failed");
                Err(err.into())
            }
        }
    }

    /// `name in target`. A class target asks about static members.
    pub fn has_property(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &Value,
    ) -> Result<bool, DispatchError> {
        let name = validate(target, name)?;
        if let Value::Object(obj) = target {
            if self.table.contains(obj, &name) {
                return Ok(true);
            }
        }
        match self.binder.has_member(target, context, &name) {
            Ok(found) => Ok(found),
            Err(err) if err.is_no_such_member() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// `delete target[name]`. Only expando members can be deleted; returns
    /// whether one was removed.
    pub fn delete_member(&self, target: &Value, name: &Value) -> Result<bool, DispatchError> {
        let name = validate(target, name)?;
        let removed = match target {
            Value::Object(obj) => self.table.remove(obj, &name).is_some(),
            _ => false,
        };
        trace!(name = %name, removed, "expando delete");
        Ok(removed)
    }

    /// Expando member names of `target`, in insertion order.
    pub fn dynamic_member_names(&self, target: &Value) -> Result<Vec<String>, DispatchError> {
        match target {
            _ if target.is_nullish() => Err(DispatchError::NullTarget),
            Value::Object(obj) => Ok(self.table.names(obj)),
            _ => Ok(Vec::new()),
        }
    }

    fn not_found(&self, target: &Value, name: &str, err: BindError) -> DispatchError {
        match err {
            BindError::NoSuchMember { .. } => DispatchError::MemberNotFound {
                type_name: self.binder.type_name(target),
                name: name.to_string(),
            },
            other => other.into(),
        }
    }
}

/// Null target first, then the name.
fn validate(target: &Value, name: &Value) -> Result<String, DispatchError> {
    if target.is_nullish() {
        return Err(DispatchError::NullTarget);
    }
    name.to_member_name().ok_or(DispatchError::InvalidName)
}

#[cfg(test)]
#[path = "../tests/dispatcher_tests.rs"]
mod tests;
