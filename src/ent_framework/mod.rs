// Ent Framework - privacy policies applied to blog entities

pub mod ent_privacy;

pub use ent_privacy::{
    create_default_privacy_registry, PrivacyContext, PrivacyOperation, PrivacyRegistry,
    PrivacyResult, PrivacyRule,
};
