//! Business Plans
//!
//! Generated artifacts owned by exactly one user. Every read and write is
//! filtered by the owning user's id; a plan owned by someone else is
//! indistinguishable from a plan that does not exist.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::Result;

/// The structured document shape the generation prompt asks for. All eight
/// sections are optional and values are free-form JSON; unrecognized keys
/// are carried through verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_description: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_strategy: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operational_plan: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_projections: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<serde_json::Value>,

    /// Extra keys the generator produced, kept as-is
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Best-effort extraction from a non-JSON generation response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSections {
    /// Leading slice of the response, standing in for a summary
    pub executive_summary: String,

    pub full_content: String,
}

/// Plan content. `Raw` must be tried before `Structured` when
/// deserializing: a structured document accepts any JSON object, while the
/// raw shape only matches its own two keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanContent {
    Raw {
        #[serde(rename = "rawContent")]
        raw_content: String,
        sections: RawSections,
    },
    Structured(PlanDocument),
}

/// A stored business plan
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusinessPlan {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: PlanContent,
    pub business_name: String,
    pub industry: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection: everything but the content
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanSummary {
    pub id: i64,
    pub title: String,
    pub business_name: String,
    pub industry: String,
    pub created_at: DateTime<Utc>,
}

impl From<&BusinessPlan> for PlanSummary {
    fn from(plan: &BusinessPlan) -> Self {
        Self {
            id: plan.id,
            title: plan.title.clone(),
            business_name: plan.business_name.clone(),
            industry: plan.industry.clone(),
            created_at: plan.created_at,
        }
    }
}

/// Plan storage trait. The owner id is part of every lookup.
pub trait PlanStore: Send + Sync {
    /// Insert a new plan, assigning its id
    fn insert(
        &self,
        user_id: i64,
        title: &str,
        business_name: &str,
        industry: &str,
        content: PlanContent,
    ) -> Result<BusinessPlan>;

    /// All plans owned by the user, most recent first, without content
    fn list_for_user(&self, user_id: i64) -> Result<Vec<PlanSummary>>;

    /// A single plan, only if owned by the user
    fn find_for_user(&self, id: i64, user_id: i64) -> Result<Option<BusinessPlan>>;

    /// Replace the content of an owned plan; returns false when the plan
    /// is absent or owned by someone else
    fn update_content_for_user(&self, id: i64, user_id: i64, content: PlanContent)
    -> Result<bool>;
}

/// In-memory plan store (for development/testing)
pub struct MemoryPlanStore {
    plans: RwLock<HashMap<i64, BusinessPlan>>,
    next_id: AtomicI64,
}

impl Default for MemoryPlanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self {
            plans: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl PlanStore for MemoryPlanStore {
    fn insert(
        &self,
        user_id: i64,
        title: &str,
        business_name: &str,
        industry: &str,
        content: PlanContent,
    ) -> Result<BusinessPlan> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let plan = BusinessPlan {
            id,
            user_id,
            title: title.to_string(),
            content,
            business_name: business_name.to_string(),
            industry: industry.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut plans = self.plans.write().unwrap();
        plans.insert(id, plan.clone());
        Ok(plan)
    }

    fn list_for_user(&self, user_id: i64) -> Result<Vec<PlanSummary>> {
        let plans = self.plans.read().unwrap();
        let mut result: Vec<PlanSummary> = plans
            .values()
            .filter(|p| p.user_id == user_id)
            .map(PlanSummary::from)
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(result)
    }

    fn find_for_user(&self, id: i64, user_id: i64) -> Result<Option<BusinessPlan>> {
        let plans = self.plans.read().unwrap();
        Ok(plans.get(&id).filter(|p| p.user_id == user_id).cloned())
    }

    fn update_content_for_user(
        &self,
        id: i64,
        user_id: i64,
        content: PlanContent,
    ) -> Result<bool> {
        let mut plans = self.plans.write().unwrap();
        match plans.get_mut(&id).filter(|p| p.user_id == user_id) {
            Some(plan) => {
                plan.content = content;
                plan.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
