pub mod comments;
pub mod config;
pub mod confirmations;
pub mod error;
pub mod guard;
pub mod identity;
pub mod memory;
pub mod model;
pub mod pledges;
pub mod ports;
pub mod post_commit;
pub mod testimonials;
pub mod uow;
pub mod util;

pub type DomainResult<T> = Result<T, error::DomainError>;
