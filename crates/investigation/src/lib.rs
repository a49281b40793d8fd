//! Investigation Package Builder
//!
//! Assembles a ranked, human-readable evidence bundle from the same
//! inputs that fed the fusion engine. Purely a presentation transform
//! over already-computed data; no new scoring happens here.

mod builder;

pub use builder::{InvestigationPackage, PackageBuilder, RankedSignal};
