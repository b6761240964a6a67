use std::fmt;

/// 找不到的实体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// 按id查找的学生
    Student(i64),
    /// 按姓名查找的学生
    StudentNamed { first_name: String, last_name: String },
    /// 按id查找的科目
    Subject(i64),
    /// 按名称查找的科目
    SubjectTitled(String),
    /// 按名称查找的学校
    School(String),
    /// 科目没有对应的学分
    CreditMapping(i64),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Student(id) => write!(f, "student {id}"),
            Entity::StudentNamed {
                first_name,
                last_name,
            } => write!(f, "student {first_name} {last_name}"),
            Entity::Subject(id) => write!(f, "subject {id}"),
            Entity::SubjectTitled(title) => write!(f, "subject {title}"),
            Entity::School(title) => write!(f, "school {title}"),
            Entity::CreditMapping(subject_id) => {
                write!(f, "credit mapping for subject {subject_id}")
            }
        }
    }
}

/// 自定义错误类型
#[derive(thiserror::Error, Debug)]
pub enum SchoolError {
    /// 输入不合法
    #[error("invalid input: {0}")]
    Validation(String),
    /// 引用的记录不存在
    #[error("{0} not found")]
    NotFound(Entity),
    /// 结构节点的父节点不在输入集合中
    #[error("structure node {node} references missing parent {parent}")]
    DanglingReference { node: i64, parent: i64 },
    /// 结构节点无法到达根节点
    #[error("structure node {0} is part of a parent cycle")]
    CyclicStructure(i64),
    /// 层级数据不满足约束
    #[error("hierarchy constraint violated: {0}")]
    Aggregation(String),
    /// 同一学生同一科目的成绩已存在
    #[error("score for student {student_id} and subject {subject_id} already exists")]
    DuplicateScore { student_id: i64, subject_id: i64 },
    /// 数据库错误
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// 数据库迁移失败
    #[error("failed to migrate the database: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// csv处理错误
    #[error("解析csv失败: {0}")]
    Csv(#[from] csv::Error),
    /// json序列化失败
    #[error("failed to serialize: {0}")]
    Json(#[from] serde_json::Error),
    /// 配置错误
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SchoolError>;
