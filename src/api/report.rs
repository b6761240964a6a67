use log::debug;
use serde::Serialize;

use super::err::Result;
use super::grade::{score_to_grade, Grade};
use super::model::SubjectScore;
use super::store::RecordStore;
use super::SchoolService;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StudentSummary {
    pub id: i64,
    pub full_name: String,
    /// Empty when the student's class has no school.
    pub school: String,
}

/// 单科成绩详情
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SubjectDetail {
    pub subject: String,
    pub credit: i64,
    pub score: f64,
    pub grade: Grade,
}

/// 学生成绩单
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StudentReportView {
    pub student: StudentSummary,
    pub subject_detail: Vec<SubjectDetail>,
    pub grade_point_average: f64,
}

/// Credit-weighted grade point average, truncated to two decimals.
///
/// Zero total credit gives `0.0`. Sums are kept in half points, so
/// the truncation is exact.
pub fn grade_point_average<I>(scores: I) -> f64
where
    I: IntoIterator<Item = (f64, i64)>,
{
    let mut total_half_points: i64 = 0;
    let mut total_credits: i64 = 0;
    for (score, credit) in scores {
        total_half_points += score_to_grade(score).half_points() * credit;
        total_credits += credit;
    }

    if total_credits <= 0 {
        return 0.0;
    }
    // floor(100 * half_points / (2 * credits)), both sides non-negative
    let hundredths = (total_half_points * 100).div_euclid(total_credits * 2);
    hundredths as f64 / 100.0
}

impl<S: RecordStore> SchoolService<S> {
    /// Score details and GPA of student `student_id`.
    pub async fn get_student_report(&self, student_id: i64) -> Result<StudentReportView> {
        let student = self.student(student_id).await?;

        let school = match self.store.class(student.class_id).await? {
            Some(class) => match class.school_id {
                Some(school_id) => self
                    .store
                    .school(school_id)
                    .await?
                    .map(|school| school.title)
                    .unwrap_or_default(),
                None => String::new(),
            },
            None => String::new(),
        };

        let mut scores: Vec<SubjectScore> = self.store.scores_of_student(student.id).await?;
        scores.sort_by_key(|s| s.record.id);

        let grade_point_average =
            grade_point_average(scores.iter().map(|s| (s.record.score, s.record.credit)));
        let subject_detail = scores
            .into_iter()
            .map(|s| SubjectDetail {
                grade: score_to_grade(s.record.score),
                subject: s.subject_title,
                credit: s.record.credit,
                score: s.record.score,
            })
            .collect::<Vec<_>>();
        debug!(
            "student {} has {} scored subjects, gpa {}",
            student.id,
            subject_detail.len(),
            grade_point_average
        );

        Ok(StudentReportView {
            student: StudentSummary {
                id: student.id,
                full_name: student.full_name(),
                school,
            },
            subject_detail,
            grade_point_average,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::err::{Entity, SchoolError};
    use crate::api::fixture;
    use crate::api::score::ScoreSubmission;
    use crate::api::store::MemoryStore;

    fn service() -> SchoolService<MemoryStore> {
        SchoolService::new(MemoryStore::from_fixtures(&fixture::sample()).unwrap())
    }

    #[test]
    fn test_gpa_without_credits() {
        assert_eq!(grade_point_average(vec![]), 0.0);
        // an unmapped subject contributes no credit
        assert_eq!(grade_point_average(vec![(90.0, 0)]), 0.0);
    }

    #[test]
    fn test_gpa_is_truncated() {
        // (4.0 * 2 + 3.0 * 1) / 3 = 3.666...
        assert_eq!(grade_point_average(vec![(85.0, 2), (72.0, 1)]), 3.66);
        // (3.5 * 3 + 2.0 * 1) / 4 = 3.125
        assert_eq!(grade_point_average(vec![(76.0, 3), (61.0, 1)]), 3.12);
    }

    #[test]
    fn test_gpa_exact_values_survive() {
        // (3.5 * 2 + 3.0 * 3) / 5 = 3.2
        assert_eq!(grade_point_average(vec![(77.0, 2), (70.0, 3)]), 3.2);
        assert_eq!(grade_point_average(vec![(100.0, 3), (0.0, 1)]), 3.0);
    }

    #[tokio::test]
    async fn test_report_for_student_without_scores() {
        let report = service().get_student_report(5).await.unwrap();
        assert_eq!(report.student.full_name, "Reed Richards");
        assert_eq!(report.student.school, "rose garden school");
        assert!(report.subject_detail.is_empty());
        assert_eq!(report.grade_point_average, 0.0);
    }

    #[tokio::test]
    async fn test_report_for_missing_student() {
        let result = service().get_student_report(404).await;
        assert!(matches!(
            result,
            Err(SchoolError::NotFound(Entity::Student(404)))
        ));
    }

    #[tokio::test]
    async fn test_report_without_school() {
        let report = service().get_student_report(9).await.unwrap();
        assert_eq!(report.student.school, "");
    }

    #[tokio::test]
    async fn test_submit_then_report() {
        let service = service();
        let view = service
            .submit_score_by_name(&ScoreSubmission {
                first_name: "Reed".to_string(),
                last_name: "Richards".to_string(),
                subject_title: "Math".to_string(),
                score: 82.0,
            })
            .await
            .unwrap();
        assert_eq!(view.score, 82.0);

        service.submit_score(5, 3, 72.0).await.unwrap();
        service.submit_score(5, 2, 54.0).await.unwrap();

        let report = service.get_student_report(5).await.unwrap();
        let grades: Vec<_> = report
            .subject_detail
            .iter()
            .map(|d| (d.subject.as_str(), d.credit, d.grade))
            .collect();
        assert_eq!(
            grades,
            vec![
                ("Math", 3, Grade::A),
                ("Chemistry", 1, Grade::B),
                ("Physics", 2, Grade::D)
            ]
        );
        // (4.0 * 3 + 3.0 * 1 + 1.0 * 2) / 6 = 2.833...
        assert_eq!(report.grade_point_average, 2.83);

        // repeated reads give the same report
        assert_eq!(service.get_student_report(5).await.unwrap(), report);
    }

    #[test]
    fn test_report_serializes_grade_labels() {
        let detail = SubjectDetail {
            subject: "Math".to_string(),
            credit: 3,
            score: 76.0,
            grade: Grade::BPlus,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["grade"], "B+");
    }
}
