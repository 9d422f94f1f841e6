//! bugsmith mutation engine
//!
//! Takes valid Python source and returns a deliberately bugged variant plus
//! a log of every mutation applied.
//!
//! # Mutation categories
//!
//! - **Rename**: bound variables get a silly suffix, consistently everywhere
//! - **Constant shift**: non-zero integer literals move by one
//! - **Operator swap**: binary `+` and `-` trade places
//! - **Trace injection**: functions start with a chatty `print`
//! - **Statement wrap**: statements end up inside `if True:`
//!
//! # Architecture
//!
//! ```text
//! source → SourceParser → Module → TreeWalker (ChaosPolicy + RenameTracker + RuleSet) → Module'
//!                                                              ↓
//!                                   MutationResult ← header ← SourceRenderer (re-parsed)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use bugsmith_engine::BugInjector;
//!
//! let result = BugInjector::new().inject_seeded("total = price + tax\n", 7, 42)?;
//! println!("{}", result.mutated_text);
//! for record in &result.bug_log {
//!     println!("- {}", record);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod injector;
pub mod log;
pub mod policy;
pub mod rules;
pub mod tracker;
pub mod walker;

// Re-exports for convenience
pub use api::{ErrorResponse, MutationRequest, MutationResponse, MutationResult};
pub use config::EngineConfig;
pub use error::{ConfigError, ErrorKind, InjectError};
pub use injector::{header, BugInjector, GENERATOR_NAME};
pub use log::{BugLog, MutationRecord};
pub use policy::{ChaosLevel, ChaosPolicy, Entropy, ScriptedEntropy};
pub use rules::{MutationContext, MutationRule, RuleKind, RuleSet};
pub use tracker::RenameTracker;
pub use walker::TreeWalker;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving the engine
    pub use crate::{
        BugInjector, BugLog, ChaosLevel, EngineConfig, Entropy, InjectError, MutationResult,
        RuleKind, ScriptedEntropy,
    };
}
