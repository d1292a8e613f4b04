//! Diagnostic message table.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    pub const CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE: u32 = 38;
    pub const NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT: u32 = 103;
    pub const OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER: u32 = 120;
    pub const MEMBER_IS_INACCESSIBLE_DUE_TO_PROTECTION_LEVEL: u32 = 122;
    pub const LOCAL_VARIABLE_ALREADY_DEFINED_IN_SCOPE: u32 = 128;
    pub const NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK: u32 = 135;
    pub const VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS: u32 = 307;
    pub const LOCAL_VARIABLE_USED_BEFORE_DECLARED: u32 = 841;
    pub const TYPE_DOES_NOT_CONTAIN_DEFINITION: u32 = 1061;
    pub const MEMBER_GROUP_IS_NOT_INVOCABLE: u32 = 1955;
}

pub mod diagnostic_messages {
    pub const CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE: &str =
        "Cannot access a nonstatic member of outer type `{0}' via nested type `{1}'";
    pub const NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT: &str =
        "The name `{0}' does not exist in the current context";
    pub const OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER: &str =
        "An object reference is required to access non-static member `{0}'";
    pub const MEMBER_IS_INACCESSIBLE_DUE_TO_PROTECTION_LEVEL: &str =
        "`{0}' is inaccessible due to its protection level";
    pub const LOCAL_VARIABLE_ALREADY_DEFINED_IN_SCOPE: &str =
        "A local variable named `{0}' is already defined in this scope";
    pub const NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK: &str =
        "`{0}' conflicts with a declaration in a child block";
    pub const VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS: &str =
        "The variable `{0}' cannot be used with type arguments";
    pub const LOCAL_VARIABLE_USED_BEFORE_DECLARED: &str =
        "A local variable `{0}' cannot be used before it is declared";
    pub const TYPE_DOES_NOT_CONTAIN_DEFINITION: &str =
        "Type `{0}' does not contain a definition for `{1}'";
    pub const MEMBER_GROUP_IS_NOT_INVOCABLE: &str =
        "Non-invocable member `{0}' cannot be used like a method";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_ACCESS_NONSTATIC_MEMBER_OF_OUTER_TYPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NAME_DOES_NOT_EXIST_IN_CURRENT_CONTEXT,
    },
    DiagnosticMessage {
        code: diagnostic_codes::OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::OBJECT_REFERENCE_REQUIRED_FOR_NONSTATIC_MEMBER,
    },
    DiagnosticMessage {
        code: diagnostic_codes::MEMBER_IS_INACCESSIBLE_DUE_TO_PROTECTION_LEVEL,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::MEMBER_IS_INACCESSIBLE_DUE_TO_PROTECTION_LEVEL,
    },
    DiagnosticMessage {
        code: diagnostic_codes::LOCAL_VARIABLE_ALREADY_DEFINED_IN_SCOPE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::LOCAL_VARIABLE_ALREADY_DEFINED_IN_SCOPE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NAME_CONFLICTS_WITH_DECLARATION_IN_CHILD_BLOCK,
    },
    DiagnosticMessage {
        code: diagnostic_codes::VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::VARIABLE_CANNOT_BE_USED_WITH_TYPE_ARGUMENTS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::LOCAL_VARIABLE_USED_BEFORE_DECLARED,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::LOCAL_VARIABLE_USED_BEFORE_DECLARED,
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_DOES_NOT_CONTAIN_DEFINITION,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::TYPE_DOES_NOT_CONTAIN_DEFINITION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::MEMBER_GROUP_IS_NOT_INVOCABLE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::MEMBER_GROUP_IS_NOT_INVOCABLE,
    },
];
