pub mod engagement_repo;
pub mod idempotency_repo;
pub mod listing_repo;
pub mod rate_limit_repo;

pub use engagement_repo::EngagementRepo;
pub use idempotency_repo::IdempotencyRepo;
pub use listing_repo::ListingRepo;
pub use rate_limit_repo::RateLimitRepo;
