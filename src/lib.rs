//! Package builder for CMake libraries, with an lcov coverage pipeline.
//!
//! - **Recipe engine** - derive the package identity from `CMakeLists.txt`,
//!   validate settings, configure options, then build, package and archive
//! - **Coverage pipeline** - capture lcov traces, drop ignored sources and
//!   render an HTML report
//!
//! # Architecture
//!
//! ```text
//! package-builder (bin)
//!     │
//!     ├── config     package.toml
//!     ├── recipe     identity → validate → options → export → toolchain
//!     │              → build → package → metadata → archive
//!     ├── coverage   probe → reset → capture → filter → list → genhtml
//!     └── tool       ExternalTool trait over cmake, lcov, genhtml
//! ```

pub mod config;
pub mod coverage;
pub mod error;
pub mod filesystem;
pub mod lock;
pub mod recipe;
pub mod tool;

pub use config::PackageConfig;
pub use coverage::{CoverageConfig, CoveragePipeline, CoverageReport};
pub use recipe::{PackageArtifact, Recipe};
pub use tool::{ExternalTool, SystemTool};
