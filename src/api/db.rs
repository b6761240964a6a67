use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use super::err::{Result, SchoolError};
use super::fixture::FixtureSet;
use super::model::{
    Class, NewScore, Personnel, School, ScoreRecord, StructureNode, Subject, SubjectScore,
};
use super::store::RecordStore;

const SCORE_COLUMNS: &str = "id, student_id, subject_id, score, credit";

/// sqlite上的记录存储
#[derive(Clone)]
pub struct SqliteStore {
    pub db: Pool<Sqlite>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `url` and applies the migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        // use the migration feature of sqlx to create the tables
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("connected to {}", url);

        Ok(SqliteStore { db: pool })
    }

    /// Inserts every fixture row inside one transaction.
    pub async fn load_fixtures(&self, fixtures: &FixtureSet) -> Result<()> {
        let mut tx = self.db.begin().await?;

        for school in &fixtures.schools {
            sqlx::query("INSERT INTO schools (id, title) VALUES (?1, ?2)")
                .bind(school.id)
                .bind(school.title.as_str())
                .execute(&mut *tx)
                .await?;
        }
        for class in &fixtures.classes {
            sqlx::query("INSERT INTO classes (id, class_order, school_id) VALUES (?1, ?2, ?3)")
                .bind(class.id)
                .bind(class.class_order)
                .bind(class.school_id)
                .execute(&mut *tx)
                .await?;
        }
        for person in &fixtures.personnel {
            sqlx::query(
                r"INSERT INTO personnel (id, first_name, last_name, role, class_id)
                VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(person.id)
            .bind(person.first_name.as_str())
            .bind(person.last_name.as_str())
            .bind(person.role)
            .bind(person.class_id)
            .execute(&mut *tx)
            .await?;
        }
        for subject in &fixtures.subjects {
            sqlx::query("INSERT INTO subjects (id, title) VALUES (?1, ?2)")
                .bind(subject.id)
                .bind(subject.title.as_str())
                .execute(&mut *tx)
                .await?;
        }
        for node in &fixtures.structure {
            sqlx::query("INSERT INTO school_structure (id, title, parent_id) VALUES (?1, ?2, ?3)")
                .bind(node.id)
                .bind(node.title.as_str())
                .bind(node.parent_id)
                .execute(&mut *tx)
                .await?;
        }
        for score in &fixtures.scores {
            sqlx::query(
                r"INSERT INTO student_subject_scores (student_id, subject_id, score, credit)
                VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(score.student_id)
            .bind(score.subject_id)
            .bind(score.score)
            .bind(score.credit)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        log::info!(
            "loaded {} schools, {} classes, {} personnel, {} subjects, {} structure nodes, {} scores",
            fixtures.schools.len(),
            fixtures.classes.len(),
            fixtures.personnel.len(),
            fixtures.subjects.len(),
            fixtures.structure.len(),
            fixtures.scores.len()
        );
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    async fn personnel(&self, id: i64) -> Result<Option<Personnel>> {
        let person = sqlx::query_as("SELECT * FROM personnel WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(person)
    }

    async fn student_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Personnel>> {
        let person = sqlx::query_as(
            r"SELECT * FROM personnel
            WHERE first_name = ?1 AND last_name = ?2 AND role = 2
            ORDER BY id LIMIT 1",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.db)
        .await?;
        Ok(person)
    }

    async fn subject(&self, id: i64) -> Result<Option<Subject>> {
        let subject = sqlx::query_as("SELECT * FROM subjects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(subject)
    }

    async fn subject_by_title(&self, title: &str) -> Result<Option<Subject>> {
        let subject = sqlx::query_as("SELECT * FROM subjects WHERE title = ?1")
            .bind(title)
            .fetch_optional(&self.db)
            .await?;
        Ok(subject)
    }

    async fn class(&self, id: i64) -> Result<Option<Class>> {
        let class = sqlx::query_as("SELECT * FROM classes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(class)
    }

    async fn school(&self, id: i64) -> Result<Option<School>> {
        let school = sqlx::query_as("SELECT * FROM schools WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(school)
    }

    async fn school_by_title(&self, title: &str) -> Result<Option<School>> {
        let school = sqlx::query_as("SELECT * FROM schools WHERE title = ?1 ORDER BY id LIMIT 1")
            .bind(title)
            .fetch_optional(&self.db)
            .await?;
        Ok(school)
    }

    async fn schools(&self) -> Result<Vec<School>> {
        let schools = sqlx::query_as("SELECT * FROM schools ORDER BY title, id")
            .fetch_all(&self.db)
            .await?;
        Ok(schools)
    }

    async fn classes_of_school(&self, school_id: i64) -> Result<Vec<Class>> {
        let classes =
            sqlx::query_as("SELECT * FROM classes WHERE school_id = ?1 ORDER BY class_order, id")
                .bind(school_id)
                .fetch_all(&self.db)
                .await?;
        Ok(classes)
    }

    async fn personnel_of_school(&self, school_id: i64) -> Result<Vec<Personnel>> {
        let personnel = sqlx::query_as(
            r"SELECT p.* FROM personnel AS p
            JOIN classes c ON c.id = p.class_id
            WHERE c.school_id = ?1",
        )
        .bind(school_id)
        .fetch_all(&self.db)
        .await?;
        Ok(personnel)
    }

    async fn personnel_of_class(&self, class_id: i64) -> Result<Vec<Personnel>> {
        let personnel = sqlx::query_as("SELECT * FROM personnel WHERE class_id = ?1")
            .bind(class_id)
            .fetch_all(&self.db)
            .await?;
        Ok(personnel)
    }

    async fn score(&self, student_id: i64, subject_id: i64) -> Result<Option<ScoreRecord>> {
        let record = sqlx::query_as(&format!(
            "SELECT {SCORE_COLUMNS} FROM student_subject_scores \
             WHERE student_id = ?1 AND subject_id = ?2"
        ))
        .bind(student_id)
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn scores_of_student(&self, student_id: i64) -> Result<Vec<SubjectScore>> {
        let scores = sqlx::query_as(
            r"SELECT s.id, s.student_id, s.subject_id, s.score, s.credit,
                sub.title AS subject_title
            FROM student_subject_scores AS s
            JOIN subjects sub ON sub.id = s.subject_id
            WHERE s.student_id = ?1
            ORDER BY s.id",
        )
        .bind(student_id)
        .fetch_all(&self.db)
        .await?;
        Ok(scores)
    }

    async fn insert_score(&self, score: NewScore) -> Result<ScoreRecord> {
        sqlx::query_as(&format!(
            "INSERT INTO student_subject_scores (student_id, subject_id, score, credit) \
             VALUES (?1, ?2, ?3, ?4) RETURNING {SCORE_COLUMNS}"
        ))
        .bind(score.student_id)
        .bind(score.subject_id)
        .bind(score.score)
        .bind(score.credit)
        .fetch_one(&self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                SchoolError::DuplicateScore {
                    student_id: score.student_id,
                    subject_id: score.subject_id,
                }
            }
            other => other.into(),
        })
    }

    async fn update_score(&self, id: i64, score: f64) -> Result<ScoreRecord> {
        let record = sqlx::query_as(&format!(
            "UPDATE student_subject_scores SET score = ?1 WHERE id = ?2 RETURNING {SCORE_COLUMNS}"
        ))
        .bind(score)
        .bind(id)
        .fetch_one(&self.db)
        .await?;
        Ok(record)
    }

    async fn structure_nodes(&self) -> Result<Vec<StructureNode>> {
        let nodes = sqlx::query_as("SELECT * FROM school_structure ORDER BY id")
            .fetch_all(&self.db)
            .await?;
        Ok(nodes)
    }
}
