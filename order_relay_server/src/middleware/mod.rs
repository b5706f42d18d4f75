mod trusted_source;

pub use trusted_source::{TrustedSourceMiddlewareFactory, TrustedSourceMiddlewareService};
