//! Source-file preprocessor driven by embedded Lua.
//!
//! Directives live inside the host language's comment or string fences
//! (`"""%optimize = true%"""`, `"""%if optimize then%"""` … `"""%end%"""`),
//! so an unprocessed file still parses as the host language.  Processing
//! runs scripts in order, keeps the branch each guard selects, and emits
//! everything else byte for byte.
//!
//! ```rust
//! # #[cfg(feature = "lua")] {
//! let out = luapre::preprocess(
//!     "\"\"\"%fast = true%\"\"\"\"\"\"%if fast then%\"\"\"A\"\"\"%else%\"\"\"B\"\"\"%end%\"\"\"",
//! ).unwrap();
//! assert_eq!(out, "A");
//! # }
//! ```

pub mod assemble;
pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod project;
pub mod resolve;
pub mod scan;
pub mod script;
pub mod source;
pub mod tree;

pub use config::Config;
#[cfg(feature = "lua")]
pub use engine::preprocess;
pub use engine::Engine;
pub use error::{Error, ErrorKind};
pub use source::Document;
