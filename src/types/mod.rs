mod prefix;
mod route;

pub use prefix::{Family, PrefixId};
pub use route::{ObjectKind, Origin, OriginSet, RpslObject};
