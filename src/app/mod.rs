// Application layer - Use case interactors

pub mod batch_interactor;
pub mod collect_interactor;
pub mod container;
pub mod encode_interactor;
pub mod merge_interactor;
pub mod reorder_interactor;

// Re-export interactors
pub use batch_interactor::{BatchInteractor, BatchSummary};
pub use collect_interactor::CollectInteractor;
pub use encode_interactor::EncodeInteractor;
pub use merge_interactor::{DurationReport, MergeInteractor, MergeOutcome};
pub use reorder_interactor::ReorderInteractor;
