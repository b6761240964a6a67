use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::config::CreditPolicy;
use super::err::{Entity, Result, SchoolError};
use super::model::{NewScore, Personnel, Subject};
use super::store::RecordStore;
use super::SchoolService;

const MAX_NAME_LEN: usize = 50;

/// 成绩提交的原始载荷：按姓名和科目名称提交
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreSubmission {
    pub first_name: String,
    pub last_name: String,
    pub subject_title: String,
    pub score: f64,
}

impl ScoreSubmission {
    pub fn validate(&self) -> Result<()> {
        validate_text("first_name", &self.first_name)?;
        validate_text("last_name", &self.last_name)?;
        validate_text("subject_title", &self.subject_title)?;
        validate_score(self.score)
    }
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SchoolError::Validation(format!("{field} must not be blank")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(SchoolError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Scores are finite numbers in `0..=100`.
pub fn validate_score(score: f64) -> Result<()> {
    if score.is_finite() && (0.0..=100.0).contains(&score) {
        Ok(())
    } else {
        Err(SchoolError::Validation(format!(
            "score must be between 0 and 100, got {score}"
        )))
    }
}

/// 提交成绩后的结果
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScoreRecordView {
    pub student_id: i64,
    pub student_name: String,
    pub subject: String,
    pub credit: i64,
    pub score: f64,
    /// `false` when an existing record was updated.
    pub created: bool,
}

impl<S: RecordStore> SchoolService<S> {
    /// Records `score` for the student and subject, creating the record on the
    /// first submission and overwriting only the score afterwards.
    pub async fn submit_score(
        &self,
        student_id: i64,
        subject_id: i64,
        score: f64,
    ) -> Result<ScoreRecordView> {
        validate_score(score)?;
        let student = self.student(student_id).await?;
        let subject = self
            .store
            .subject(subject_id)
            .await?
            .ok_or(SchoolError::NotFound(Entity::Subject(subject_id)))?;

        self.upsert_score(&student, &subject, score).await
    }

    /// Same as [`submit_score`](Self::submit_score), resolving the student by
    /// name and the subject by title.
    pub async fn submit_score_by_name(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<ScoreRecordView> {
        submission.validate()?;
        let student = self
            .store
            .student_by_name(&submission.first_name, &submission.last_name)
            .await?
            .ok_or_else(|| {
                SchoolError::NotFound(Entity::StudentNamed {
                    first_name: submission.first_name.clone(),
                    last_name: submission.last_name.clone(),
                })
            })?;
        let subject = self
            .store
            .subject_by_title(&submission.subject_title)
            .await?
            .ok_or_else(|| {
                SchoolError::NotFound(Entity::SubjectTitled(submission.subject_title.clone()))
            })?;

        self.upsert_score(&student, &subject, submission.score).await
    }

    async fn upsert_score(
        &self,
        student: &Personnel,
        subject: &Subject,
        score: f64,
    ) -> Result<ScoreRecordView> {
        let existing = self.store.score(student.id, subject.id).await?;
        let created = existing.is_none();

        let record = match existing {
            Some(record) => {
                // credit keeps its value from creation
                let record = self.store.update_score(record.id, score).await?;
                info!(
                    "updated score {} for student {} in {}",
                    record.id, student.id, subject.title
                );
                record
            }
            None => {
                let credit = self.credit_for(subject)?;
                let record = self
                    .store
                    .insert_score(NewScore {
                        student_id: student.id,
                        subject_id: subject.id,
                        score,
                        credit,
                    })
                    .await?;
                info!(
                    "created score {} for student {} in {} with credit {}",
                    record.id, student.id, subject.title, credit
                );
                record
            }
        };

        Ok(ScoreRecordView {
            student_id: student.id,
            student_name: student.full_name(),
            subject: subject.title.clone(),
            credit: record.credit,
            score: record.score,
            created,
        })
    }

    fn credit_for(&self, subject: &Subject) -> Result<i64> {
        match (self.credits.credit_for(subject.id), self.credit_policy) {
            (Some(credit), _) => Ok(credit),
            (None, CreditPolicy::Zero) => {
                warn!("subject {} has no credit mapping, using 0", subject.title);
                Ok(0)
            }
            (None, CreditPolicy::Reject) => {
                Err(SchoolError::NotFound(Entity::CreditMapping(subject.id)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixture;
    use crate::api::store::MemoryStore;
    use crate::api::vocabulary::{CreditGroup, CreditTable};

    fn service() -> SchoolService<MemoryStore> {
        SchoolService::new(MemoryStore::from_fixtures(&fixture::sample()).unwrap())
    }

    fn submission(first: &str, last: &str, subject: &str, score: f64) -> ScoreSubmission {
        ScoreSubmission {
            first_name: first.to_string(),
            last_name: last.to_string(),
            subject_title: subject.to_string(),
            score,
        }
    }

    #[tokio::test]
    async fn test_first_submission_creates_record() {
        let service = service();
        let view = service
            .submit_score_by_name(&submission("Reed", "Richards", "Math", 82.0))
            .await
            .unwrap();

        assert!(view.created);
        assert_eq!(view.student_name, "Reed Richards");
        assert_eq!(view.subject, "Math");
        assert_eq!(view.credit, 3);
        assert_eq!(view.score, 82.0);
        assert_eq!(service.store().score_count(), 1);
    }

    #[tokio::test]
    async fn test_repeated_submission_is_idempotent() {
        let service = service();
        let first = service.submit_score(5, 2, 70.0).await.unwrap();
        let second = service.submit_score(5, 2, 70.0).await.unwrap();

        assert!(!second.created);
        assert_eq!(first.credit, second.credit);
        assert_eq!(service.store().score_count(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_credit() {
        let service = service().with_credits(credits_with_physics(1));
        let first = service.submit_score(5, 2, 90.0).await.unwrap();
        assert_eq!(first.credit, 1);

        // Physics maps to 2 in the default table
        let service = SchoolService::new(service.into_store());
        let second = service.submit_score(5, 2, 40.0).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.credit, 1);
        assert_eq!(second.score, 40.0);
    }

    #[tokio::test]
    async fn test_update_overwrites_score_only() {
        let service = service();
        service.submit_score(5, 1, 90.0).await.unwrap();
        let updated = service.submit_score(5, 1, 40.0).await.unwrap();

        assert_eq!(updated.score, 40.0);
        assert_eq!(updated.credit, 3);
        let stored = service.store().score(5, 1).await.unwrap().unwrap();
        assert_eq!(stored.score, 40.0);
        assert_eq!(stored.credit, 3);
    }

    #[tokio::test]
    async fn test_not_found_distinguishes_entities() {
        let service = service();
        let missing_student = service.submit_score(999, 1, 50.0).await;
        assert!(matches!(
            missing_student,
            Err(SchoolError::NotFound(Entity::Student(999)))
        ));

        let missing_subject = service.submit_score(5, 999, 50.0).await;
        assert!(matches!(
            missing_subject,
            Err(SchoolError::NotFound(Entity::Subject(999)))
        ));

        let by_name = service
            .submit_score_by_name(&submission("Reed", "Richards", "History", 50.0))
            .await;
        assert!(matches!(
            by_name,
            Err(SchoolError::NotFound(Entity::SubjectTitled(_)))
        ));
    }

    #[tokio::test]
    async fn test_teacher_is_not_a_student() {
        let service = service();
        // personnel 1 is a teacher
        let result = service.submit_score(1, 1, 50.0).await;
        assert!(matches!(
            result,
            Err(SchoolError::NotFound(Entity::Student(1)))
        ));
    }

    #[tokio::test]
    async fn test_validation() {
        let service = service();
        for score in [-1.0, 100.5, f64::NAN] {
            let result = service.submit_score(5, 1, score).await;
            assert!(matches!(result, Err(SchoolError::Validation(_))));
        }
        let blank = service
            .submit_score_by_name(&submission(" ", "Richards", "Math", 50.0))
            .await;
        assert!(matches!(blank, Err(SchoolError::Validation(_))));

        let long_name = "x".repeat(51);
        let too_long = service
            .submit_score_by_name(&submission(&long_name, "Richards", "Math", 50.0))
            .await;
        assert!(matches!(too_long, Err(SchoolError::Validation(_))));
        assert_eq!(service.store().score_count(), 0);
    }

    #[tokio::test]
    async fn test_unmapped_subject_credit_policy() {
        let service = service();
        // subject 6 (Art) has no credit mapping
        let view = service.submit_score(5, 6, 75.0).await.unwrap();
        assert_eq!(view.credit, 0);

        let strict = SchoolService::new(MemoryStore::from_fixtures(&fixture::sample()).unwrap())
            .with_credit_policy(CreditPolicy::Reject);
        let result = strict.submit_score(5, 6, 75.0).await;
        assert!(matches!(
            result,
            Err(SchoolError::NotFound(Entity::CreditMapping(6)))
        ));
        assert_eq!(strict.store().score_count(), 0);
    }

    fn credits_with_physics(credit: i64) -> CreditTable {
        CreditTable::new(vec![CreditGroup { id: 1, credit }], vec![(2, 1)])
    }
}
