//! Class and method definitions gathered from programs and stored in the
//! repository.

mod class;
mod method;
mod repository;
mod uids;

pub use class::Class;
pub use method::Method;
pub use repository::{Repo, ResolutionResult};
pub use uids::{ClassUid, MethodUid, RepoCounters};
