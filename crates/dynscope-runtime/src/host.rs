//! Host object model and its reflective late binder.
//!
//! A [`ClassRegistry`] describes host classes: instance and static fields,
//! properties backed by native accessors, methods, visibility and single
//! inheritance. [`ReflectBinder`] implements [`LateBinder`] over it by looking
//! members up by name at run time, the way a reflection-based host would.

use crate::binder::LateBinder;
use crate::error::BindError;
use crate::value::{Function, NativeFn, ObjectRef, TypeToken, Value};
use dynscope_common::limits::MAX_BASE_CHAIN_DEPTH;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tracing::trace;

// =============================================================================
// Objects
// =============================================================================

/// Instance storage: the class and one slot per instance field, base class
/// fields first.
pub struct HostObject {
    class: TypeToken,
    slots: RwLock<Vec<Value>>,
}

impl HostObject {
    pub fn class(&self) -> TypeToken {
        self.class
    }

    fn read_slot(&self, slot: usize) -> Result<Value, BindError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| BindError::Internal("instance slots poisoned".into()))?;
        slots
            .get(slot)
            .cloned()
            .ok_or_else(|| BindError::Internal(format!("slot {slot} out of range")))
    }

    fn write_slot(&self, slot: usize, value: Value) -> Result<(), BindError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| BindError::Internal("instance slots poisoned".into()))?;
        match slots.get_mut(slot) {
            Some(target) => {
                *target = value;
                Ok(())
            }
            None => Err(BindError::Internal(format!("slot {slot} out of range"))),
        }
    }
}

// =============================================================================
// Members
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// Declared type of a field; assignments are checked against it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ValueKind {
    /// `*`: accepts anything.
    #[default]
    #[serde(rename = "*")]
    Any,
    Number,
    Boolean,
    String,
    Object,
    Function,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Any => "*",
            ValueKind::Number => "Number",
            ValueKind::Boolean => "Boolean",
            ValueKind::String => "String",
            ValueKind::Object => "Object",
            ValueKind::Function => "Function",
        }
    }

    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Number => matches!(value, Value::Number(_)),
            ValueKind::Boolean => matches!(value, Value::Bool(_)),
            ValueKind::String => matches!(value, Value::Str(_) | Value::Null),
            ValueKind::Object => !matches!(value, Value::Undefined),
            ValueKind::Function => matches!(value, Value::Function(_) | Value::Null),
        }
    }

    /// Value of a field that was never assigned.
    pub fn default_value(self) -> Value {
        match self {
            ValueKind::Any => Value::Undefined,
            ValueKind::Number => Value::Number(0.0),
            ValueKind::Boolean => Value::Bool(false),
            ValueKind::String | ValueKind::Object | ValueKind::Function => Value::Null,
        }
    }
}

#[derive(Clone)]
pub enum HostMemberKind {
    Field {
        kind: ValueKind,
        initial: Value,
        /// Assigned when the class is registered.
        slot: usize,
    },
    Property {
        getter: NativeFn,
        setter: Option<NativeFn>,
    },
    Method(Function),
}

#[derive(Clone)]
pub struct HostMember {
    pub name: String,
    pub kind: HostMemberKind,
    pub is_static: bool,
    pub visibility: Visibility,
}

impl HostMember {
    fn new(name: &str, kind: HostMemberKind) -> Self {
        HostMember {
            name: name.to_string(),
            kind,
            is_static: false,
            visibility: Visibility::Public,
        }
    }

    pub fn field(name: &str, kind: ValueKind) -> Self {
        Self::new(
            name,
            HostMemberKind::Field {
                kind,
                initial: kind.default_value(),
                slot: 0,
            },
        )
    }

    /// Read-only property; add a setter with [`HostMember::with_setter`].
    pub fn property(
        name: &str,
        getter: impl Fn(&Value) -> Result<Value, BindError> + Send + Sync + 'static,
    ) -> Self {
        let native: NativeFn = Arc::new(move |this: &Value, _: &[Value]| getter(this));
        Self::new(
            name,
            HostMemberKind::Property {
                getter: native,
                setter: None,
            },
        )
    }

    pub fn method(
        name: &str,
        body: impl Fn(&Value, &[Value]) -> Result<Value, BindError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, HostMemberKind::Method(Function::new(name, Arc::new(body))))
    }

    #[must_use]
    pub fn with_setter(
        mut self,
        setter: impl Fn(&Value, Value) -> Result<(), BindError> + Send + Sync + 'static,
    ) -> Self {
        if let HostMemberKind::Property { setter: slot, .. } = &mut self.kind {
            let native: NativeFn = Arc::new(move |this: &Value, args: &[Value]| {
                let value = args.first().cloned().unwrap_or_default();
                setter(this, value).map(|()| Value::Undefined)
            });
            *slot = Some(native);
        }
        self
    }

    /// Initial value of a field.
    #[must_use]
    pub fn with_initial(mut self, value: Value) -> Self {
        if let HostMemberKind::Field { initial, .. } = &mut self.kind {
            *initial = value;
        }
        self
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

    pub fn is_method(&self) -> bool {
        matches!(self.kind, HostMemberKind::Method(_))
    }
}

// =============================================================================
// Classes
// =============================================================================

/// Declaration of a class, consumed by [`ClassRegistry::define`].
pub struct ClassDef {
    name: String,
    base: Option<TypeToken>,
    is_dynamic: bool,
    members: Vec<HostMember>,
}

impl ClassDef {
    pub fn new(name: &str) -> Self {
        ClassDef {
            name: name.to_string(),
            base: None,
            is_dynamic: false,
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, base: TypeToken) -> Self {
        self.base = Some(base);
        self
    }

    #[must_use]
    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    #[must_use]
    pub fn member(mut self, member: HostMember) -> Self {
        self.members.push(member);
        self
    }
}

pub struct HostClass {
    pub token: TypeToken,
    pub name: String,
    pub base: Option<TypeToken>,
    /// Declared `dynamic`. Informational: expando writes are accepted on any
    /// object.
    pub is_dynamic: bool,
    members: Vec<HostMember>,
    instance_index: FxHashMap<String, usize>,
    static_index: FxHashMap<String, usize>,
    /// Initial slot values of an instance, including inherited fields.
    instance_template: Vec<Value>,
    statics: RwLock<Vec<Value>>,
}

impl HostClass {
    pub fn members(&self) -> &[HostMember] {
        &self.members
    }

    fn own_member(&self, name: &str, is_static: bool) -> Option<&HostMember> {
        let index = if is_static {
            &self.static_index
        } else {
            &self.instance_index
        };
        index.get(name).and_then(|&i| self.members.get(i))
    }

    fn read_static(&self, slot: usize) -> Result<Value, BindError> {
        let statics = self
            .statics
            .read()
            .map_err(|_| BindError::Internal(format!("statics of `{}` poisoned", self.name)))?;
        statics
            .get(slot)
            .cloned()
            .ok_or_else(|| BindError::Internal(format!("static slot {slot} out of range")))
    }

    fn write_static(&self, slot: usize, value: Value) -> Result<(), BindError> {
        let mut statics = self
            .statics
            .write()
            .map_err(|_| BindError::Internal(format!("statics of `{}` poisoned", self.name)))?;
        match statics.get_mut(slot) {
            Some(target) => {
                *target = value;
                Ok(())
            }
            None => Err(BindError::Internal(format!("static slot {slot} out of range"))),
        }
    }
}

/// All host classes known to the program.
///
/// Defined up front, then shared read-only (static field values live behind
/// their own locks).
#[derive(Default)]
pub struct ClassRegistry {
    classes: Vec<HostClass>,
    by_name: FxHashMap<String, TypeToken>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Instance field slots continue after the base class's.
    pub fn define(&mut self, def: ClassDef) -> Result<TypeToken, BindError> {
        let token = TypeToken(self.classes.len() as u32);
        let mut instance_template = match def.base {
            Some(base) => self.class(base)?.instance_template.clone(),
            None => Vec::new(),
        };
        let mut statics = Vec::new();
        let mut instance_index = FxHashMap::default();
        let mut static_index = FxHashMap::default();
        let mut members = def.members;

        for (i, member) in members.iter_mut().enumerate() {
            if let HostMemberKind::Field { initial, slot, .. } = &mut member.kind {
                let storage = if member.is_static {
                    &mut statics
                } else {
                    &mut instance_template
                };
                *slot = storage.len();
                storage.push(initial.clone());
            }
            let index = if member.is_static {
                &mut static_index
            } else {
                &mut instance_index
            };
            index.insert(member.name.clone(), i);
        }

        trace!(class = %def.name, token = token.0, "define host class");
        self.by_name.insert(def.name.clone(), token);
        self.classes.push(HostClass {
            token,
            name: def.name,
            base: def.base,
            is_dynamic: def.is_dynamic,
            members,
            instance_index,
            static_index,
            instance_template,
            statics: RwLock::new(statics),
        });
        Ok(token)
    }

    pub fn class(&self, token: TypeToken) -> Result<&HostClass, BindError> {
        self.classes
            .get(token.0 as usize)
            .ok_or_else(|| BindError::Internal(format!("unknown class token {}", token.0)))
    }

    pub fn class_by_name(&self, name: &str) -> Option<TypeToken> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Create an instance with every field at its initial value.
    pub fn instantiate(&self, token: TypeToken) -> Result<ObjectRef, BindError> {
        let class = self.class(token)?;
        Ok(ObjectRef::new(HostObject {
            class: token,
            slots: RwLock::new(class.instance_template.clone()),
        }))
    }

    pub fn is_subclass_of(&self, class: TypeToken, ancestor: TypeToken) -> bool {
        let mut current = Some(class);
        let mut depth = 0;
        while let Some(token) = current {
            if token == ancestor {
                return true;
            }
            depth += 1;
            if depth > MAX_BASE_CHAIN_DEPTH {
                return false;
            }
            current = self.class(token).ok().and_then(|c| c.base);
        }
        false
    }

    /// Find `name` on `class` or its bases. The most derived declaration
    /// accepted by `filter` wins; rejected declarations do not hide a base's.
    pub fn find_member(
        &self,
        class: TypeToken,
        name: &str,
        is_static: bool,
        filter: impl Fn(&HostClass, &HostMember) -> bool,
    ) -> Result<Option<(&HostClass, &HostMember)>, BindError> {
        let mut current = Some(class);
        let mut depth = 0;
        while let Some(token) = current {
            depth += 1;
            if depth > MAX_BASE_CHAIN_DEPTH {
                return Err(BindError::Internal(format!(
                    "base chain of class {} is too deep",
                    class.0
                )));
            }
            let def = self.class(token)?;
            if let Some(member) = def.own_member(name, is_static) {
                if filter(def, member) {
                    return Ok(Some((def, member)));
                }
            }
            current = def.base;
        }
        Ok(None)
    }

    pub fn is_accessible(
        &self,
        owner: TypeToken,
        member: &HostMember,
        context: Option<TypeToken>,
    ) -> bool {
        match member.visibility {
            Visibility::Public => true,
            Visibility::Private => context == Some(owner),
            Visibility::Protected => context.is_some_and(|ctx| self.is_subclass_of(ctx, owner)),
        }
    }
}

// =============================================================================
// Reflective binder
// =============================================================================

/// [`LateBinder`] over a [`ClassRegistry`].
#[derive(Clone)]
pub struct ReflectBinder {
    registry: Arc<ClassRegistry>,
}

impl ReflectBinder {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        ReflectBinder { registry }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// The class whose members `target` exposes, and whether they are statics.
    fn receiver_class(target: &Value) -> Option<(TypeToken, bool)> {
        match target {
            Value::Object(obj) => Some((obj.class(), false)),
            Value::Class(token) => Some((*token, true)),
            _ => None,
        }
    }

    fn lookup(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<(&HostClass, &HostMember, bool), BindError> {
        let Some((class, is_static)) = Self::receiver_class(target) else {
            return Err(BindError::no_such_member(target.type_name(), name));
        };
        let visible = self.registry.find_member(class, name, is_static, |owner, member| {
            self.registry.is_accessible(owner.token, member, context)
        })?;
        if let Some((owner, member)) = visible {
            return Ok((owner, member, is_static));
        }
        match self.registry.find_member(class, name, is_static, |_, _| true)? {
            Some((owner, _)) => Err(BindError::Inaccessible {
                type_name: owner.name.clone(),
                name: name.to_string(),
            }),
            None => Err(BindError::no_such_member(self.type_name(target), name)),
        }
    }
}

impl LateBinder for ReflectBinder {
    fn get_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<Value, BindError> {
        let (owner, member, is_static) = self.lookup(target, context, name)?;
        match &member.kind {
            HostMemberKind::Field { slot, .. } => match target {
                Value::Object(obj) if !is_static => obj.object().read_slot(*slot),
                _ => owner.read_static(*slot),
            },
            HostMemberKind::Property { getter, .. } => getter(target, &[]),
            HostMemberKind::Method(function) => Ok(Value::Function(function.bind(target.clone()))),
        }
    }

    fn set_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
        value: Value,
    ) -> Result<(), BindError> {
        let (owner, member, is_static) = self.lookup(target, context, name)?;
        match &member.kind {
            HostMemberKind::Field { kind, slot, .. } => {
                if !kind.accepts(&value) {
                    return Err(BindError::TypeMismatch {
                        type_name: owner.name.clone(),
                        name: name.to_string(),
                        expected: kind.name(),
                        actual: value.type_name(),
                    });
                }
                match target {
                    Value::Object(obj) if !is_static => obj.object().write_slot(*slot, value),
                    _ => owner.write_static(*slot, value),
                }
            }
            HostMemberKind::Property {
                setter: Some(setter),
                ..
            } => setter(target, &[value]).map(|_| ()),
            HostMemberKind::Property { setter: None, .. } | HostMemberKind::Method(_) => {
                Err(BindError::ReadOnly {
                    type_name: owner.name.clone(),
                    name: name.to_string(),
                })
            }
        }
    }

    fn has_member(
        &self,
        target: &Value,
        context: Option<TypeToken>,
        name: &str,
    ) -> Result<bool, BindError> {
        let Some((class, is_static)) = Self::receiver_class(target) else {
            return Ok(false);
        };
        let visible = self.registry.find_member(class, name, is_static, |owner, member| {
            self.registry.is_accessible(owner.token, member, context)
        })?;
        Ok(visible.is_some())
    }

    fn type_name(&self, target: &Value) -> String {
        match Self::receiver_class(target) {
            Some((class, _)) => self
                .registry
                .class(class)
                .map_or_else(|_| format!("<class {}>", class.0), |c| c.name.clone()),
            None => target.type_name().to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/host_tests.rs"]
mod tests;
