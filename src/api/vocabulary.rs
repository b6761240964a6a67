use std::collections::HashMap;

use serde::Deserialize;

use super::model::Role;

/// 学分组：同一学分值被多个科目共用
#[derive(Debug, Clone, Deserialize)]
pub struct CreditGroup {
    pub id: i64,
    pub credit: i64,
}

/// Resolves a subject's fixed credit weight through `subject -> credit group -> credit`.
#[derive(Debug, Clone)]
pub struct CreditTable {
    groups: HashMap<i64, i64>,
    subjects: HashMap<i64, i64>,
}

impl CreditTable {
    /// `mapping` pairs are `(subject_id, credit_group_id)`.
    pub fn new(groups: Vec<CreditGroup>, mapping: Vec<(i64, i64)>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id, g.credit)).collect(),
            subjects: mapping.into_iter().collect(),
        }
    }

    /// `None` when the subject has no mapping, or maps to an unknown group.
    pub fn credit_for(&self, subject_id: i64) -> Option<i64> {
        let group_id = self.subjects.get(&subject_id)?;
        self.groups.get(group_id).copied()
    }
}

impl Default for CreditTable {
    fn default() -> Self {
        Self::new(
            vec![
                CreditGroup { id: 6, credit: 1 },
                CreditGroup { id: 7, credit: 2 },
                CreditGroup { id: 9, credit: 3 },
            ],
            // Math, Physics, Chemistry, Algorithm, Coding
            vec![(1, 9), (2, 7), (3, 6), (4, 7), (5, 9)],
        )
    }
}

/// 角色的显示名称
#[derive(Debug, Clone)]
pub struct RoleLabels {
    pub teacher: String,
    pub head_of_room: String,
    pub student: String,
}

impl RoleLabels {
    pub fn label(&self, role: Role) -> &str {
        match role {
            Role::Teacher => &self.teacher,
            Role::HeadOfRoom => &self.head_of_room,
            Role::Student => &self.student,
        }
    }
}

impl Default for RoleLabels {
    fn default() -> Self {
        Self {
            teacher: "Teacher".to_string(),
            head_of_room: "Head of the room".to_string(),
            student: "Student".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credits() {
        let table = CreditTable::default();
        assert_eq!(table.credit_for(1), Some(3));
        assert_eq!(table.credit_for(2), Some(2));
        assert_eq!(table.credit_for(3), Some(1));
        assert_eq!(table.credit_for(42), None);
    }

    #[test]
    fn test_mapping_to_unknown_group() {
        let table = CreditTable::new(vec![CreditGroup { id: 1, credit: 2 }], vec![(10, 5)]);
        assert_eq!(table.credit_for(10), None);
    }

    #[test]
    fn test_role_labels() {
        let labels = RoleLabels::default();
        assert_eq!(labels.label(Role::HeadOfRoom), "Head of the room");
        assert_eq!(labels.label(Role::Teacher), "Teacher");
    }
}
