//! # PixMatch Embed
//!
//! Image embedding backends for PixMatch.
//!
//! The [`EmbeddingService`] turns an [`ImageSource`] into a normalized
//! [`pixmatch_core::Embedding`]. It initializes its backend once:
//!
//! 1. the primary [`ModelLoader`] (a CLIP vision encoder with the `clip`
//!    feature enabled),
//! 2. otherwise, sticky for the service lifetime, the
//!    [`PixelSignatureEmbedder`] fallback.
//!
//! Inputs that cannot be fetched or decoded get a deterministic vector
//! derived from their reference string.
//!
//! ```text
//! ImageSource ──> fetch ──> embedder ──> validate ──> normalize ──> Embedding
//!                   │           │
//!                   └─ error ───┴─ decode error ──> reference_vector
//! ```

pub mod model;
pub mod service;
pub mod signature;
pub mod source;

#[cfg(feature = "clip")]
pub mod clip;

pub use model::{BackendKind, ImageEmbedder, ModelLoader, NoModel, StaticModel};
pub use service::{EmbedConfig, EmbeddingService};
pub use signature::{pixel_signature, reference_vector, PixelSignatureEmbedder, PIXEL_SIGNATURE_DIM};
pub use source::{DefaultFetcher, ImageFetcher, ImageSource};

#[cfg(feature = "clip")]
pub use clip::{ClipConfig, ClipOnnxLoader};
