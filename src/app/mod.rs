// Application layer - Use case interactors

pub mod batch_interactor;
pub mod clip_interactor;
pub mod container;
pub mod inspect_interactor;
pub mod plan;

// Re-export interactors
pub use batch_interactor::BatchInteractor;
pub use clip_interactor::{ClipInteractor, ClipRun, PipelineSettings};
pub use container::{AppContainer, DefaultAppContainer};
pub use inspect_interactor::{InspectInteractor, InspectResponse};
pub use plan::BatchInput;
