//! Domain model (artifacts, IDs, states, errors, events, reports).

pub mod artifact;
pub mod errors;
pub mod events;
pub mod ids;
pub mod report;
pub mod state;

pub use self::artifact::{Artifact, ArtifactType, DynArtifact, EmptyArtifact};
pub use self::errors::{FailureKind, LoadError, LoadFailure};
pub use self::events::RunEvent;
pub use self::ids::{PipelineId, RunId};
pub use self::report::{RunReport, StepReport};
pub use self::state::{InvalidTransition, RunState, StepState};
