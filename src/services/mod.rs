// Domain services sitting between handlers and the store

pub mod follow_service;

pub use follow_service::FollowService;
