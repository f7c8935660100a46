//! Rate limiting logic and state management.

mod backend;
mod counter;
mod distributed;
mod limiter;
mod quota;

pub use backend::{AdmissionBackend, Verdict};
pub use counter::CounterTable;
pub use distributed::StoreRateLimiter;
pub use limiter::LocalRateLimiter;
pub use quota::{Quota, QuotaRegistry, IP_CLASS};
