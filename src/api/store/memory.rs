use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::err::{Result, SchoolError};
use crate::api::fixture::FixtureSet;
use crate::api::model::{
    Class, NewScore, Personnel, Role, School, ScoreRecord, StructureNode, Subject, SubjectScore,
};

use super::RecordStore;

#[derive(Default)]
struct Tables {
    schools: BTreeMap<i64, School>,
    classes: BTreeMap<i64, Class>,
    personnel: BTreeMap<i64, Personnel>,
    subjects: BTreeMap<i64, Subject>,
    scores: BTreeMap<i64, ScoreRecord>,
    structure: BTreeMap<i64, StructureNode>,
    next_score_id: i64,
}

/// 内存中的记录存储，主要用于测试
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: &FixtureSet) -> Result<Self> {
        let store = Self::new();
        {
            let mut tables = store.lock();
            for school in &fixtures.schools {
                tables.schools.insert(school.id, school.clone());
            }
            for class in &fixtures.classes {
                tables.classes.insert(class.id, class.clone());
            }
            for person in &fixtures.personnel {
                tables.personnel.insert(person.id, person.clone());
            }
            for subject in &fixtures.subjects {
                tables.subjects.insert(subject.id, subject.clone());
            }
            for node in &fixtures.structure {
                tables.structure.insert(node.id, node.clone());
            }
        }
        for score in &fixtures.scores {
            store.insert(score.clone())?;
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, score: NewScore) -> Result<ScoreRecord> {
        let mut tables = self.lock();
        let exists = tables
            .scores
            .values()
            .any(|s| s.student_id == score.student_id && s.subject_id == score.subject_id);
        if exists {
            return Err(SchoolError::DuplicateScore {
                student_id: score.student_id,
                subject_id: score.subject_id,
            });
        }

        tables.next_score_id += 1;
        let record = ScoreRecord {
            id: tables.next_score_id,
            student_id: score.student_id,
            subject_id: score.subject_id,
            score: score.score,
            credit: score.credit,
        };
        tables.scores.insert(record.id, record.clone());
        Ok(record)
    }

    /// Number of stored score records.
    pub fn score_count(&self) -> usize {
        self.lock().scores.len()
    }
}

impl RecordStore for MemoryStore {
    async fn personnel(&self, id: i64) -> Result<Option<Personnel>> {
        Ok(self.lock().personnel.get(&id).cloned())
    }

    async fn student_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Personnel>> {
        Ok(self
            .lock()
            .personnel
            .values()
            .find(|p| {
                p.role == Role::Student && p.first_name == first_name && p.last_name == last_name
            })
            .cloned())
    }

    async fn subject(&self, id: i64) -> Result<Option<Subject>> {
        Ok(self.lock().subjects.get(&id).cloned())
    }

    async fn subject_by_title(&self, title: &str) -> Result<Option<Subject>> {
        Ok(self
            .lock()
            .subjects
            .values()
            .find(|s| s.title == title)
            .cloned())
    }

    async fn class(&self, id: i64) -> Result<Option<Class>> {
        Ok(self.lock().classes.get(&id).cloned())
    }

    async fn school(&self, id: i64) -> Result<Option<School>> {
        Ok(self.lock().schools.get(&id).cloned())
    }

    async fn school_by_title(&self, title: &str) -> Result<Option<School>> {
        Ok(self
            .lock()
            .schools
            .values()
            .find(|s| s.title == title)
            .cloned())
    }

    async fn schools(&self) -> Result<Vec<School>> {
        Ok(self.lock().schools.values().cloned().collect())
    }

    async fn classes_of_school(&self, school_id: i64) -> Result<Vec<Class>> {
        Ok(self
            .lock()
            .classes
            .values()
            .filter(|c| c.school_id == Some(school_id))
            .cloned()
            .collect())
    }

    async fn personnel_of_school(&self, school_id: i64) -> Result<Vec<Personnel>> {
        let tables = self.lock();
        Ok(tables
            .personnel
            .values()
            .filter(|p| {
                tables
                    .classes
                    .get(&p.class_id)
                    .is_some_and(|c| c.school_id == Some(school_id))
            })
            .cloned()
            .collect())
    }

    async fn personnel_of_class(&self, class_id: i64) -> Result<Vec<Personnel>> {
        Ok(self
            .lock()
            .personnel
            .values()
            .filter(|p| p.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn score(&self, student_id: i64, subject_id: i64) -> Result<Option<ScoreRecord>> {
        Ok(self
            .lock()
            .scores
            .values()
            .find(|s| s.student_id == student_id && s.subject_id == subject_id)
            .cloned())
    }

    async fn scores_of_student(&self, student_id: i64) -> Result<Vec<SubjectScore>> {
        let tables = self.lock();
        Ok(tables
            .scores
            .values()
            .filter(|s| s.student_id == student_id)
            .map(|s| SubjectScore {
                record: s.clone(),
                subject_title: tables
                    .subjects
                    .get(&s.subject_id)
                    .map(|subject| subject.title.clone())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn insert_score(&self, score: NewScore) -> Result<ScoreRecord> {
        self.insert(score)
    }

    async fn update_score(&self, id: i64, score: f64) -> Result<ScoreRecord> {
        let mut tables = self.lock();
        let record = tables
            .scores
            .get_mut(&id)
            .ok_or(SchoolError::Database(sqlx::Error::RowNotFound))?;
        record.score = score;
        Ok(record.clone())
    }

    async fn structure_nodes(&self) -> Result<Vec<StructureNode>> {
        Ok(self.lock().structure.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_rejects_duplicate_pair() {
        let store = MemoryStore::new();
        let score = NewScore {
            student_id: 1,
            subject_id: 1,
            score: 70.0,
            credit: 3,
        };
        store.insert_score(score.clone()).await.unwrap();
        let result = store.insert_score(score).await;
        assert!(matches!(result, Err(SchoolError::DuplicateScore { .. })));
        assert_eq!(store.score_count(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryStore::new();
        assert!(store.update_score(7, 50.0).await.is_err());
    }
}
