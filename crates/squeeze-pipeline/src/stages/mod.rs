//! The five concrete stage implementations.

pub mod discovery;
pub mod eligibility;
pub mod generation;
pub mod publication;
pub mod refinement;

pub use discovery::FeedDiscovery;
pub use eligibility::Curator;
pub use generation::Writer;
pub use publication::WordPressPublisher;
pub use refinement::Editor;
