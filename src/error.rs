use thiserror::Error;

use crate::metadata::token::Token;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors only arise while *building* the metadata model or *configuring* a
/// [`crate::Runner`]. Rule execution itself never fails: unresolvable references,
/// open generic types and incomplete metadata are routine inputs that a rule turns
/// into [`crate::rules::RuleResult::DoesNotApply`] or silently skips.
///
/// # Error Categories
///
/// ## Model Construction Errors
/// - [`Error::Malformed`] - Inconsistent builder input (e.g. a branch to an undefined label)
/// - [`Error::TypeInsert`] - A type with the same token is already registered
/// - [`Error::TypeNotFound`] - A member references an owner that is not registered
///
/// ## Runner Errors
/// - [`Error::DuplicateRule`] - Two rules with the same name were registered
///
/// # Examples
///
/// ```rust
/// use dotlint::{Error, Runner, RunnerConfig};
/// use dotlint::rules::design::DeclareEventHandlersCorrectly;
/// use std::sync::Arc;
///
/// let mut runner = Runner::new(RunnerConfig::default());
/// runner.add_rule(Arc::new(DeclareEventHandlersCorrectly::new()))?;
///
/// match runner.add_rule(Arc::new(DeclareEventHandlersCorrectly::new())) {
///     Err(Error::DuplicateRule(name)) => println!("{name} is already registered"),
///     _ => unreachable!(),
/// }
/// # Ok::<(), dotlint::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied metadata is inconsistent and could not be turned into a model.
    ///
    /// The error includes the source location where the inconsistency was detected
    /// for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Failed to insert new type into the `TypeRegistry`.
    ///
    /// The associated [`Token`] is already taken by another type.
    #[error("Failed to insert new type into TypeRegistry - {0}")]
    TypeInsert(Token),

    /// Failed to find type in the `TypeRegistry`.
    ///
    /// Raised while building the model when a nested type names an enclosing
    /// type that has not been registered.
    #[error("Failed to find type in TypeRegistry - {0}")]
    TypeNotFound(Token),

    /// A rule with the same name has already been registered with the runner.
    #[error("Rule '{0}' is already registered")]
    DuplicateRule(String),
}
