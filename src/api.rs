pub mod config;
pub mod db;
pub mod err;
pub mod fixture;
pub mod grade;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod report;
pub mod score;
pub mod store;
pub mod structure;
pub mod vocabulary;

use config::{CreditPolicy, Settings, TeacherPolicy};
use err::{Entity, Result, SchoolError};
use model::{Personnel, Role};
use store::RecordStore;
use vocabulary::{CreditTable, RoleLabels};

/// Score, report and hierarchy operations over a record store.
///
/// Every call runs to completion against `store`; the service keeps no
/// state of its own between calls.
pub struct SchoolService<S> {
    store: S,
    credits: CreditTable,
    labels: RoleLabels,
    teacher_policy: TeacherPolicy,
    credit_policy: CreditPolicy,
}

impl<S: RecordStore> SchoolService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            credits: CreditTable::default(),
            labels: RoleLabels::default(),
            teacher_policy: TeacherPolicy::default(),
            credit_policy: CreditPolicy::default(),
        }
    }

    pub fn from_settings(store: S, settings: &Settings) -> Self {
        Self::new(store)
            .with_teacher_policy(settings.teacher_policy)
            .with_credit_policy(settings.credit_policy)
    }

    pub fn with_credits(mut self, credits: CreditTable) -> Self {
        self.credits = credits;
        self
    }

    pub fn with_labels(mut self, labels: RoleLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_teacher_policy(mut self, policy: TeacherPolicy) -> Self {
        self.teacher_policy = policy;
        self
    }

    pub fn with_credit_policy(mut self, policy: CreditPolicy) -> Self {
        self.credit_policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Personnel record `id`, which must be a student.
    async fn student(&self, id: i64) -> Result<Personnel> {
        self.store
            .personnel(id)
            .await?
            .filter(|p| p.role == Role::Student)
            .ok_or(SchoolError::NotFound(Entity::Student(id)))
    }
}
