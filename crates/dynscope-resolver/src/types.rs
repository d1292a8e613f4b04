//! Type references used by locals and member signatures.

use crate::catalog::TypeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types the compiler knows without consulting the catalog.
///
/// Their spellings are reserved bare names: `int`, `Number`, etc. resolve to
/// the alias before any local, member or global lookup is attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    Int,
    UInt,
    Number,
    Boolean,
    String,
    Object,
    Function,
    Class,
    Void,
}

impl BuiltinType {
    /// Map a reserved bare name to its compiler-known type.
    ///
    /// `void` is a keyword rather than a name expression and is not included.
    pub fn from_alias(name: &str) -> Option<Self> {
        Some(match name {
            "int" => BuiltinType::Int,
            "uint" => BuiltinType::UInt,
            "Number" => BuiltinType::Number,
            "Boolean" => BuiltinType::Boolean,
            "String" => BuiltinType::String,
            "Object" => BuiltinType::Object,
            "Function" => BuiltinType::Function,
            "Class" => BuiltinType::Class,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Int => "int",
            BuiltinType::UInt => "uint",
            BuiltinType::Number => "Number",
            BuiltinType::Boolean => "Boolean",
            BuiltinType::String => "String",
            BuiltinType::Object => "Object",
            BuiltinType::Function => "Function",
            BuiltinType::Class => "Class",
            BuiltinType::Void => "void",
        }
    }

    /// `Object` accepts expando members; the other builtins are sealed.
    pub fn is_dynamic(self) -> bool {
        matches!(self, BuiltinType::Object)
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The declared (static) type of a local, field, property or method result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Builtin(BuiltinType),
    Named(TypeId),
    /// The untyped `*` annotation. Every access through it is late bound.
    Dynamic,
    /// Not annotated yet; filled in by inference after resolution.
    Unknown,
}

impl TypeRef {
    pub const NUMBER: TypeRef = TypeRef::Builtin(BuiltinType::Number);
    pub const STRING: TypeRef = TypeRef::Builtin(BuiltinType::String);
    pub const OBJECT: TypeRef = TypeRef::Builtin(BuiltinType::Object);

    pub fn is_dynamic(self) -> bool {
        matches!(self, TypeRef::Dynamic | TypeRef::Unknown)
    }
}
