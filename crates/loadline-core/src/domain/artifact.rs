//! Artifact model: what a loading step produces.
//!
//! Two layers, same as the typed step API:
//! - `Artifact`: implemented by concrete payload types (carries `KIND`).
//! - `DynArtifact`: object-safe view used by the pipeline's store.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A typed, immutable result of a loading step.
///
/// # 使用例
/// ```ignore
/// #[derive(Debug)]
/// struct Manifest {
///     bundles: Vec<String>,
/// }
///
/// impl Artifact for Manifest {
///     const KIND: &'static str = "assets.manifest";
/// }
/// ```
///
/// # Trait Bounds
/// - `Any`: the store downcasts `dyn DynArtifact` back to `T`
/// - `Send + Sync`: artifacts are shared behind `Arc` across await points
pub trait Artifact: Any + Send + Sync + fmt::Debug {
    /// Stable, human readable kind used in reports and wiring checks.
    const KIND: &'static str;
}

/// Static identity of an artifact type.
///
/// Equality and hashing use the `TypeId` only; `kind` is for display.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactType {
    id: TypeId,
    kind: &'static str,
}

impl ArtifactType {
    pub fn of<T: Artifact>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            kind: T::KIND,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn is<T: Artifact>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for ArtifactType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArtifactType {}

impl Hash for ArtifactType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind)
    }
}

/// Object-safe artifact, blanket-implemented for every `Artifact`.
pub trait DynArtifact: Send + Sync + fmt::Debug {
    fn artifact_type(&self) -> ArtifactType;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Artifact> DynArtifact for T {
    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn DynArtifact {
    /// Borrow the concrete artifact if it is a `T`.
    pub fn downcast_ref<T: Artifact>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// The "no output" artifact of side-effect-only steps.
///
/// Zero-sized; every instance equals every other instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmptyArtifact;

impl Artifact for EmptyArtifact {
    const KIND: &'static str = "empty";
}
