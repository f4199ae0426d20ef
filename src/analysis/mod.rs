//! Reusable instruction-level analyses.
//!
//! Rules that inspect method bodies share their data flow reasoning through this module
//! instead of re-implementing it per rule.
//!
//! - [`returns`] - Detection of `ret` instructions reached by a `null` literal
//!
//! # Usage
//!
//! ```rust
//! use dotlint::analysis::NullReturnScanner;
//! use dotlint::assembly::InstructionBuilder;
//!
//! let body = InstructionBuilder::new()
//!     .ldnull()
//!     .stloc(0)
//!     .br("exit")
//!     .label("exit")
//!     .ldloc(0)
//!     .ret()
//!     .build()?;
//!
//! let returns = NullReturnScanner::new().scan(&body);
//! assert_eq!(returns.len(), 1);
//! # Ok::<(), dotlint::Error>(())
//! ```

pub mod returns;

pub use returns::NullReturnScanner;
