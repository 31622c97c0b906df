//! Forwarding proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Authenticated request
//!     → forward.rs (inside mount? else pass to next stage)
//!     → rewrite.rs (anchored prefix substitution, upstream URI)
//!     → headers.rs (strip hop-by-hop, override Authorization, Host)
//!     → hyper client → upstream
//!     → upstream response streamed back verbatim
//! ```

pub mod forward;
pub mod headers;
pub mod rewrite;

pub use forward::{proxy_middleware, ForwardProxy, ProxyBuildError};
pub use rewrite::{PathRewrite, UpstreamTarget};
