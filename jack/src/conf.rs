//! Compiler configuration.
use smol_str::SmolStr;

use crate::symbols::DuplicatePolicy;

/// Classes of the standard library that the compiled code may call into.
pub const STANDARD_CLASSES: &[&str] = &[
    "Array", "Keyboard", "Math", "Memory", "Output", "Screen", "String", "Sys",
];

/// Compiler Configuration Parameters.
///
/// The default configuration produces the reference output: permissive
/// name handling, subroutine-local labels and no object prologues.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConf {
    /// Reject duplicate declarations and calls through names that are
    /// neither variables nor known classes.
    pub strict: bool,
    /// Record the grammar trace alongside the instructions.
    pub trace: bool,
    /// Prefix labels with the enclosing function name so they are
    /// unique across the whole program.
    pub qualify_labels: bool,
    /// Emit the constructor allocation and method `this` set-up.
    pub object_setup: bool,
    /// Class names accepted as call qualifiers in strict mode, in
    /// addition to the class being compiled.
    pub known_classes: Vec<SmolStr>,
}

impl CompilerConf {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub(crate) fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.strict {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::Replace
        }
    }

    pub(crate) fn is_known_class(&self, name: &str) -> bool {
        self.known_classes.iter().any(|class| class == name)
    }
}

impl Default for CompilerConf {
    fn default() -> Self {
        Self {
            strict: false,
            trace: false,
            qualify_labels: false,
            object_setup: false,
            known_classes: STANDARD_CLASSES.iter().map(|name| SmolStr::new(name)).collect(),
        }
    }
}
