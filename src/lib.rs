//! `plug` plans and drives package-tree audit pipelines.
//!
//! A *source* emits elements of some [`feed::FeedType`] at some
//! [`scope::Scope`]; a *transform* converts one feed type to another above a
//! minimum scope; a *sink* (a check) consumes a feed type at a scope and
//! tees results to a [`reporter::Reporter`]. [`plug::plug`] selects sources,
//! composes transforms, and binds sinks into one or more concrete pipelines
//! that together drive every satisfiable sink at minimum aggregate cost.
//!
//! ```
//! use std::sync::Arc;
//! use plug::feed::{FeedItem, FeedStream, FeedType};
//! use plug::model::{Sink, Source};
//! use plug::reporter::{ReportResult, Reporter, TextResult};
//! use plug::scope::Scope;
//! use plug::config::PlannerConfig;
//!
//! struct Versions;
//! impl Source for Versions {
//!     fn feed_type(&self) -> FeedType { FeedType::new("version") }
//!     fn scope(&self) -> Scope { Scope::Package }
//!     fn cost(&self) -> u32 { 1 }
//!     fn feed(&self) -> FeedStream {
//!         Box::new(vec![1, 2, 3].into_iter().map(|v| Box::new(v) as Box<dyn FeedItem>))
//!     }
//! }
//!
//! struct NonEmpty;
//! impl Sink for NonEmpty {
//!     fn feed_type(&self) -> FeedType { FeedType::new("version") }
//!     fn scope(&self) -> Scope { Scope::Package }
//!     fn feed(&self, tail: FeedStream, reporter: &Arc<dyn Reporter>) -> FeedStream {
//!         let reporter = reporter.clone();
//!         Box::new(tail.map(move |item| {
//!             reporter.add_report(&TextResult::new("saw a version"));
//!             item
//!         }))
//!     }
//! }
//!
//! struct NullReporter;
//! impl Reporter for NullReporter {
//!     fn start(&self) {}
//!     fn add_report(&self, _result: &dyn ReportResult) {}
//!     fn finish(&self) {}
//! }
//!
//! let reporter: Arc<dyn Reporter> = Arc::new(NullReporter);
//! reporter.start();
//! let outcome = plug::plug(
//!     vec![Arc::new(Versions)],
//!     vec![],
//!     vec![Arc::new(NonEmpty)],
//!     reporter.clone(),
//!     &PlannerConfig::default(),
//! );
//! for running in outcome.running_pipes {
//!     running.tail.for_each(drop);
//! }
//! reporter.finish();
//! ```

pub mod config;
pub mod cover;
pub mod error;
pub mod feed;
pub mod matrix;
pub mod model;
pub mod pipe;
pub mod plug;
pub mod reporter;
pub mod runtime;
pub mod scope;

pub use config::PlannerConfig;
pub use error::{PlugError, Result};
pub use feed::{FeedItem, FeedStream, FeedType};
pub use model::{Feeder, Sink, Source, Transform, TransformEdge};
pub use pipe::Pipe;
pub use plug::{plug, PlanOutcome};
pub use reporter::{ReportResult, Reporter};
pub use runtime::RunningPipe;
pub use scope::Scope;
