//! Metadata model of the analyzed program.
//!
//! This module contains the read-only graph rules run against: declared types, their
//! members, signatures and decoded method bodies, together with the resolution service
//! that follows references across that graph.
//!
//! # Key Components
//!
//! - [`token`] - Metadata table row references used throughout .NET
//! - [`typesystem`] - Declared types and the concurrent type registry
//! - [`signatures`] - Method and type signatures
//! - [`method`] - Methods and their decoded bodies
//! - [`event`] - Events and their delegate types
//! - [`query`] - The [`query::MetadataQuery`] resolution and query interface
//! - [`model`] - The in-memory [`model::MetadataModel`] and its builder
//!
//! # Examples
//!
//! ```rust
//! use dotlint::metadata::model::{EventDef, MetadataModelBuilder, TypeDef};
//! use dotlint::metadata::query::MetadataQuery;
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! let handler = builder.type_ref("System", "EventHandler");
//! builder.define(
//!     TypeDef::class("Demo", "Button")
//!         .public()
//!         .event(EventDef::new("Click", handler)),
//! )?;
//! let model = builder.build();
//!
//! let button = &model.analyzed_types()[0];
//! let click = button.events.iter().next().map(|(_, event)| event.clone()).unwrap();
//! assert!(model.resolve(&click.event_type).is_some());
//! # Ok::<(), dotlint::Error>(())
//! ```

/// Events of declared types
pub mod event;
/// Methods, their flags and decoded bodies
pub mod method;
/// In-memory metadata model and its builder
pub mod model;
/// Resolution and query interface over the metadata graph
pub mod query;
/// Implementation of method and type signatures
pub mod signatures;
/// Commonly used metadata token type
pub mod token;
/// Implementation of the .NET type system
pub mod typesystem;
