//! Vara host value model and type contracts
//!
//! This crate provides the data side of the runtime contract layer:
//! - Host value model (`Value`) with fixed `type_of` tagging
//! - Structural equality with a delegation protocol
//! - Runtime types, combinators, generic families, and enums
//! - Serializable type descriptors and schemas
//! - The contract-error value and its legacy tagged view
//! - Function and parameter metadata

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod combinators;
pub mod descriptor;
pub mod enumeration;
pub mod equality;
pub mod error;
pub mod generic;
pub mod meta;
pub mod runtime_type;
pub mod schema;
pub mod value;

pub use combinators::{array_of, nullable, optional, union, union_of};
pub use descriptor::{TypeDescriptor, TypeRegistry};
pub use enumeration::EnumType;
pub use equality::{is, is_native_type, is_not, type_name_chain, EQUALS_PROTOCOL};
pub use error::{compose_errors, is_error_value, ContractError, ERROR_TAG};
pub use generic::{GenericArg, GenericParam, GenericType, GenericTypeError, PAIR, RECORD};
pub use meta::{FunctionMeta, ParamMeta, ReturnMeta, SourceInfo, Span, TypeSpec};
pub use runtime_type::{Predicate, RuntimeType};
pub use schema::ValueSchema;
pub use value::{
    type_of, ClassId, ClassValue, FunctionValue, HostFn, InstanceValue, Value,
};
