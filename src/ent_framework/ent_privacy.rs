// Ent Privacy System - access control for blog entities
// Rules are evaluated per entity type, highest priority first, first decision wins

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::Method;

use crate::{
    error::{AppError, AppResult},
    infrastructure::viewer::ViewerContext,
    models::{Authored, EntityType, UserId},
};

/// Privacy rule context for access control decisions
#[derive(Debug, Clone)]
pub struct PrivacyContext {
    pub entity_type: EntityType,
    pub operation: PrivacyOperation,
    pub viewer_id: Option<UserId>,
    /// Author of the object being acted on; `None` for collection-level checks
    pub owner_id: Option<UserId>,
}

/// Operations that can be controlled by privacy policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyOperation {
    Create,
    Read,
    Update,
    Delete,
}

impl PrivacyOperation {
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::GET | Method::HEAD | Method::OPTIONS => PrivacyOperation::Read,
            Method::POST => PrivacyOperation::Create,
            Method::PUT | Method::PATCH => PrivacyOperation::Update,
            Method::DELETE => PrivacyOperation::Delete,
            // Anything exotic is treated as a write
            _ => PrivacyOperation::Update,
        }
    }

    pub fn is_read(&self) -> bool {
        *self == PrivacyOperation::Read
    }
}

/// Privacy rule result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyResult {
    Allow,
    Deny,
    /// Denied because nobody is logged in
    Unauthenticated,
    /// Skip this rule, continue to next
    Skip,
}

/// Trait for implementing privacy rules
#[async_trait]
pub trait PrivacyRule: Send + Sync {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult>;

    /// Get rule name for debugging
    fn name(&self) -> &str;

    fn operations(&self) -> Vec<PrivacyOperation>;

    /// Get rule priority (higher = evaluated first)
    fn priority(&self) -> i32;
}

/// Privacy policy registry
#[derive(Default)]
pub struct PrivacyRegistry {
    rules: HashMap<EntityType, Vec<Box<dyn PrivacyRule>>>,
}

impl PrivacyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a privacy rule for an entity type
    pub fn register_rule(&mut self, entity_type: EntityType, rule: Box<dyn PrivacyRule>) {
        let rules = self.rules.entry(entity_type).or_default();
        rules.push(rule);
        rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Evaluate privacy rules for an operation
    pub async fn evaluate_access(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        if let Some(rules) = self.rules.get(&ctx.entity_type) {
            for rule in rules {
                if !rule.operations().contains(&ctx.operation) {
                    continue;
                }
                match rule.evaluate(ctx).await? {
                    PrivacyResult::Skip => continue,
                    decision => {
                        tracing::trace!(
                            rule = rule.name(),
                            entity = %ctx.entity_type,
                            operation = ?ctx.operation,
                            decision = ?decision,
                            "Privacy rule decided"
                        );
                        return Ok(decision);
                    }
                }
            }
        }

        // Default to deny if no rules explicitly allow
        Ok(PrivacyResult::Deny)
    }

    /// Collection-level check: listing and creating
    pub async fn authorize(
        &self,
        vc: &ViewerContext,
        entity_type: EntityType,
        operation: PrivacyOperation,
    ) -> AppResult<()> {
        let ctx = PrivacyContext {
            entity_type,
            operation,
            viewer_id: vc.user_id(),
            owner_id: None,
        };
        self.enforce(&ctx).await
    }

    /// Object-level check against an existing record's author
    pub async fn authorize_object<T: Authored + Sync>(
        &self,
        vc: &ViewerContext,
        entity_type: EntityType,
        operation: PrivacyOperation,
        object: &T,
    ) -> AppResult<()> {
        let ctx = PrivacyContext {
            entity_type,
            operation,
            viewer_id: vc.user_id(),
            owner_id: Some(object.author_id()),
        };
        self.enforce(&ctx).await
    }

    async fn enforce(&self, ctx: &PrivacyContext) -> AppResult<()> {
        match self.evaluate_access(ctx).await? {
            PrivacyResult::Allow => Ok(()),
            PrivacyResult::Unauthenticated => Err(AppError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            )),
            PrivacyResult::Deny | PrivacyResult::Skip => {
                tracing::info!(
                    entity = %ctx.entity_type,
                    operation = ?ctx.operation,
                    viewer = ?ctx.viewer_id,
                    owner = ?ctx.owner_id,
                    "Access denied"
                );
                Err(AppError::Forbidden(
                    "You do not have permission to perform this action.".to_string(),
                ))
            }
        }
    }
}

/// Built-in privacy rules

const ALL_OPERATIONS: [PrivacyOperation; 4] = [
    PrivacyOperation::Create,
    PrivacyOperation::Read,
    PrivacyOperation::Update,
    PrivacyOperation::Delete,
];

const WRITE_OPERATIONS: [PrivacyOperation; 3] = [
    PrivacyOperation::Create,
    PrivacyOperation::Update,
    PrivacyOperation::Delete,
];

/// Blocks anonymous writes; reads fall through
pub struct AuthenticatedWriteRule;

#[async_trait]
impl PrivacyRule for AuthenticatedWriteRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        if !ctx.operation.is_read() && ctx.viewer_id.is_none() {
            Ok(PrivacyResult::Unauthenticated)
        } else {
            Ok(PrivacyResult::Skip)
        }
    }

    fn name(&self) -> &str {
        "authenticated_write"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        WRITE_OPERATIONS.to_vec()
    }

    fn priority(&self) -> i32 {
        1000
    }
}

/// Blocks anonymous viewers for every operation
pub struct AuthenticatedOnlyRule;

#[async_trait]
impl PrivacyRule for AuthenticatedOnlyRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        if ctx.viewer_id.is_none() {
            Ok(PrivacyResult::Unauthenticated)
        } else {
            Ok(PrivacyResult::Skip)
        }
    }

    fn name(&self) -> &str {
        "authenticated_only"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        ALL_OPERATIONS.to_vec()
    }

    fn priority(&self) -> i32 {
        1000
    }
}

/// Public access rule - allows read access to everyone
pub struct PublicReadRule;

#[async_trait]
impl PrivacyRule for PublicReadRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match ctx.operation {
            PrivacyOperation::Read => Ok(PrivacyResult::Allow),
            _ => Ok(PrivacyResult::Skip),
        }
    }

    fn name(&self) -> &str {
        "public_read"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Read]
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Reads for logged-in viewers only
pub struct AuthenticatedReadRule;

#[async_trait]
impl PrivacyRule for AuthenticatedReadRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match (ctx.operation, ctx.viewer_id) {
            (PrivacyOperation::Read, Some(_)) => Ok(PrivacyResult::Allow),
            _ => Ok(PrivacyResult::Skip),
        }
    }

    fn name(&self) -> &str {
        "authenticated_read"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Read]
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Author-only rule - only the object's author can modify it
pub struct AuthorOnlyRule;

#[async_trait]
impl PrivacyRule for AuthorOnlyRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match ctx.operation {
            PrivacyOperation::Update | PrivacyOperation::Delete => {
                match (ctx.viewer_id, ctx.owner_id) {
                    (Some(viewer), Some(owner)) if viewer == owner => Ok(PrivacyResult::Allow),
                    _ => Ok(PrivacyResult::Deny),
                }
            }
            _ => Ok(PrivacyResult::Skip),
        }
    }

    fn name(&self) -> &str {
        "author_only"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Update, PrivacyOperation::Delete]
    }

    fn priority(&self) -> i32 {
        200
    }
}

/// Any logged-in viewer may create
pub struct AuthenticatedCreateRule;

#[async_trait]
impl PrivacyRule for AuthenticatedCreateRule {
    async fn evaluate(&self, ctx: &PrivacyContext) -> AppResult<PrivacyResult> {
        match (ctx.operation, ctx.viewer_id) {
            (PrivacyOperation::Create, Some(_)) => Ok(PrivacyResult::Allow),
            _ => Ok(PrivacyResult::Skip),
        }
    }

    fn name(&self) -> &str {
        "authenticated_create"
    }

    fn operations(&self) -> Vec<PrivacyOperation> {
        vec![PrivacyOperation::Create]
    }

    fn priority(&self) -> i32 {
        150
    }
}

/// Create default privacy registry for the blog entities
pub fn create_default_privacy_registry() -> PrivacyRegistry {
    let mut registry = PrivacyRegistry::new();

    for entity_type in [EntityType::Post, EntityType::Comment] {
        registry.register_rule(entity_type, Box::new(AuthenticatedWriteRule));
        registry.register_rule(entity_type, Box::new(PublicReadRule));
        registry.register_rule(entity_type, Box::new(AuthorOnlyRule));
        registry.register_rule(entity_type, Box::new(AuthenticatedCreateRule));
    }

    // Groups are read-only over the API
    registry.register_rule(EntityType::Group, Box::new(AuthenticatedWriteRule));
    registry.register_rule(EntityType::Group, Box::new(PublicReadRule));

    registry.register_rule(EntityType::Follow, Box::new(AuthenticatedOnlyRule));
    registry.register_rule(EntityType::Follow, Box::new(AuthenticatedReadRule));
    registry.register_rule(EntityType::Follow, Box::new(AuthenticatedCreateRule));

    registry
}
