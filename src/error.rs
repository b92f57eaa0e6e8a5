use thiserror::Error;

macro_rules! malformed_ir {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedIr {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedIr {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Every fatal condition surfaces before a solver starts: configuration problems, unresolvable
/// names in configuration documents, and malformed IR detected while sealing a method body.
/// Once a fixpoint iteration is running, recoverable oddities (arity mismatches, failed
/// dispatch) are logged and skipped instead of raised, so analyses stay total.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::Config`] - Invalid analysis options (unknown selector, bad option type)
/// - [`Error::UnknownAnalysis`] - Analysis id not known to the registry
///
/// ## Resolution Errors
/// - [`Error::UnresolvedMethod`] - A method named in configuration does not exist
/// - [`Error::UnresolvedField`] - A field named in configuration does not exist
/// - [`Error::UnresolvedType`] - A type named in configuration does not exist
///
/// ## IR Construction Errors
/// - [`Error::MalformedIr`] - Inconsistent method body detected when sealing it
///
/// ## I/O and External Errors
/// - [`Error::Io`] - Filesystem I/O errors while reading configuration
/// - [`Error::Json`] - Malformed JSON in a configuration document
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid analysis configuration.
    ///
    /// Raised during setup when an option has the wrong shape, a context selector
    /// or heap model name is unknown, or a required option is missing. Fatal to
    /// the analysis run it configures.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested analysis id is not known.
    ///
    /// The registry of analysis ids is closed; asking for anything outside it is
    /// reported before any solving happens.
    #[error("Unknown analysis id: {0}")]
    UnknownAnalysis(String),

    /// A method referenced by a configuration document could not be resolved.
    ///
    /// Carries the signature string as written in the document.
    #[error("Cannot resolve method: {0}")]
    UnresolvedMethod(String),

    /// A field referenced by a configuration document could not be resolved.
    #[error("Cannot resolve field: {0}")]
    UnresolvedField(String),

    /// A type name referenced by a configuration document could not be resolved.
    #[error("Cannot resolve type: {0}")]
    UnresolvedType(String),

    /// A method body is internally inconsistent.
    ///
    /// Detected when a body is sealed, e.g. a branch target outside the statement
    /// list or a parameter count that disagrees with the declared signature. The
    /// error includes the source location where the inconsistency was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed IR - {file}:{line}: {message}")]
    MalformedIr {
        /// The message to be printed for the malformed IR
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading configuration
    /// documents from disk.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON error from parsing a configuration document.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
