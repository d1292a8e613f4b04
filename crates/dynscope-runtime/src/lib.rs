//! Run-time half of dynscope: member access on dynamic values.
//!
//! [`DynamicDispatcher`] bridges statically declared host members, reached
//! through a [`LateBinder`], and expando members kept in a
//! [`DynamicSideTable`].

pub mod binder;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod side_table;
pub mod value;

pub use binder::LateBinder;
pub use dispatcher::DynamicDispatcher;
pub use error::{BindError, DispatchError};
pub use host::{
    ClassDef, ClassRegistry, HostClass, HostMember, HostMemberKind, HostObject, ReflectBinder,
    ValueKind, Visibility,
};
pub use side_table::{DispatchOptions, DynamicSideTable};
pub use value::{Function, NativeFn, ObjectRef, TypeToken, Value};
