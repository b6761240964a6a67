use serde::{Deserialize, Serialize};

/// 人员角色，按层级排序时的先后顺序即为声明顺序
#[derive(
    sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[repr(i32)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher = 0,
    HeadOfRoom = 1,
    Student = 2,
}

impl Role {
    /// Role rank, the primary key of every hierarchy ordering.
    pub fn rank(self) -> i32 {
        self as i32
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct School {
    pub id: i64,
    pub title: String,
}

/// 班级
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Class {
    pub id: i64,
    // 班级序号，从1开始
    pub class_order: i64,
    // 所属学校，可能为空
    pub school_id: Option<i64>,
}

/// 人员：教师、班长或学生
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Personnel {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub class_id: i64,
}

impl Personnel {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: i64,
    pub title: String,
}

/// 学生某一科目的成绩，(student_id, subject_id) 唯一
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub id: i64,
    pub student_id: i64,
    pub subject_id: i64,
    // 分数 0-100
    pub score: f64,
    // 创建时确定，之后不再修改
    pub credit: i64,
}

/// A score record that has not been written yet.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct NewScore {
    pub student_id: i64,
    pub subject_id: i64,
    pub score: f64,
    pub credit: i64,
}

/// A score record joined with its subject's title.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct SubjectScore {
    #[sqlx(flatten)]
    pub record: ScoreRecord,
    pub subject_title: String,
}

/// 学校结构节点，parent 为空表示根节点
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StructureNode {
    pub id: i64,
    pub title: String,
    pub parent_id: Option<i64>,
}
