//! Schema compiler invocation
//!
//! - [`resolver`]: finding the target's plugin executable
//! - [`root`]: inferring the `--proto_path` import root
//! - [`invoke`]: building the protoc command line, running it and collecting output

pub mod invoke;
pub mod resolver;
pub mod root;

pub use invoke::{CompilerInvoker, GeneratedFiles};
pub use resolver::BinaryResolver;
pub use root::{import_relative, infer_proto_root};
