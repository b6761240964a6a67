mod memory;

pub use memory::MemoryStore;

use super::err::Result;
use super::model::{
    Class, NewScore, Personnel, School, ScoreRecord, StructureNode, Subject, SubjectScore,
};

/// Record store consumed by the services.
///
/// Scans may return rows in any order; callers sort what they present.
/// `insert_score` must reject a second record for the same
/// `(student_id, subject_id)` with [`SchoolError::DuplicateScore`] (or an
/// equivalent storage error), which is what keeps concurrent first
/// submissions from producing two records. Updates are last-writer-wins.
///
/// [`SchoolError::DuplicateScore`]: super::err::SchoolError::DuplicateScore
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn personnel(&self, id: i64) -> Result<Option<Personnel>>;

    /// First student (lowest id) with exactly this name.
    async fn student_by_name(&self, first_name: &str, last_name: &str)
        -> Result<Option<Personnel>>;

    async fn subject(&self, id: i64) -> Result<Option<Subject>>;

    async fn subject_by_title(&self, title: &str) -> Result<Option<Subject>>;

    async fn class(&self, id: i64) -> Result<Option<Class>>;

    async fn school(&self, id: i64) -> Result<Option<School>>;

    async fn school_by_title(&self, title: &str) -> Result<Option<School>>;

    async fn schools(&self) -> Result<Vec<School>>;

    async fn classes_of_school(&self, school_id: i64) -> Result<Vec<Class>>;

    async fn personnel_of_school(&self, school_id: i64) -> Result<Vec<Personnel>>;

    async fn personnel_of_class(&self, class_id: i64) -> Result<Vec<Personnel>>;

    async fn score(&self, student_id: i64, subject_id: i64) -> Result<Option<ScoreRecord>>;

    async fn scores_of_student(&self, student_id: i64) -> Result<Vec<SubjectScore>>;

    async fn insert_score(&self, score: NewScore) -> Result<ScoreRecord>;

    /// Overwrites the score value only; credit is left untouched.
    async fn update_score(&self, id: i64, score: f64) -> Result<ScoreRecord>;

    async fn structure_nodes(&self) -> Result<Vec<StructureNode>>;
}
