//! Resolution of abstract GNSS product requests into ranked remote locators.
//!
//! The naming scheme table ([`SchemeTable`]) is the single source of truth
//! for every archive's directory layout and filename conventions; the
//! resolver ([`resolve`]) combines it with cadence alignment and a site
//! roster to produce the ordered candidate list the fetch orchestrator
//! consumes. Adding an agency or a naming variant is a table edit only.

pub mod archives;
pub mod products;
pub mod request;
pub mod resolve;
pub mod schemes;

pub use archives::{ArchiveId, ArchiveRegistry, Mirror};
pub use products::{CadenceClass, Compression, Conversion, ProductKind};
pub use request::{ProductRequest, RequestError};
pub use resolve::{resolve, CandidateLocator, ResolveError};
pub use schemes::{NameVariant, NamingScheme, SchemeEntry, SchemeTable};
