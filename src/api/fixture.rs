use std::path::Path;

use serde::de::DeserializeOwned;

use super::err::Result;
use super::model::{Class, NewScore, Personnel, School, StructureNode, Subject};

/// 种子数据：一个目录下的若干csv表
#[derive(Debug, Default, Clone)]
pub struct FixtureSet {
    pub schools: Vec<School>,
    pub classes: Vec<Class>,
    pub personnel: Vec<Personnel>,
    pub subjects: Vec<Subject>,
    pub structure: Vec<StructureNode>,
    pub scores: Vec<NewScore>,
}

impl FixtureSet {
    /// Reads `schools.csv`, `classes.csv`, `personnel.csv` and `subjects.csv`
    /// from `dir`; `structure.csv` and `scores.csv` are optional.
    pub fn read_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            schools: read_table(&dir.join("schools.csv"))?,
            classes: read_table(&dir.join("classes.csv"))?,
            personnel: read_table(&dir.join("personnel.csv"))?,
            subjects: read_table(&dir.join("subjects.csv"))?,
            structure: read_optional_table(&dir.join("structure.csv"))?,
            scores: read_optional_table(&dir.join("scores.csv"))?,
        })
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = vec![];
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn read_optional_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if path.exists() {
        read_table(path)
    } else {
        Ok(vec![])
    }
}

/// Two schools, one class without a school and one without a teacher.
#[cfg(test)]
pub(crate) fn sample() -> FixtureSet {
    use super::model::Role;

    let school = |id, title: &str| School {
        id,
        title: title.to_string(),
    };
    let class = |id, class_order, school_id| Class {
        id,
        class_order,
        school_id,
    };
    let person = |id, first: &str, last: &str, role, class_id| Personnel {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        role,
        class_id,
    };
    let subject = |id, title: &str| Subject {
        id,
        title: title.to_string(),
    };
    let node = |id, title: &str, parent_id| StructureNode {
        id,
        title: title.to_string(),
        parent_id,
    };

    FixtureSet {
        schools: vec![school(1, "rose garden school"), school(2, "dorm palace school")],
        classes: vec![
            class(1, 2, Some(1)),
            class(2, 1, Some(1)),
            class(3, 1, Some(2)),
            class(4, 1, None),
            class(5, 3, Some(1)),
        ],
        personnel: vec![
            person(1, "danny", "clements", Role::Teacher, 2),
            person(2, "ray", "khan", Role::Teacher, 1),
            person(3, "carla", "elliott", Role::HeadOfRoom, 2),
            person(4, "bob", "smith", Role::Student, 2),
            person(5, "Reed", "Richards", Role::Student, 2),
            person(6, "alice", "jones", Role::Student, 2),
            person(7, "mark", "harmon", Role::Teacher, 3),
            person(8, "wendy", "maxwell", Role::Student, 1),
            person(9, "nora", "blake", Role::Student, 4),
            person(10, "lone", "student", Role::Student, 5),
        ],
        subjects: vec![
            subject(1, "Math"),
            subject(2, "Physics"),
            subject(3, "Chemistry"),
            subject(4, "Algorithm"),
            subject(5, "Coding"),
            subject(6, "Art"),
        ],
        structure: vec![
            node(1, "Lower secondary", None),
            node(2, "Upper secondary", None),
            node(3, "Grade 7", Some(1)),
            node(4, "Grade 10", Some(2)),
            node(5, "Room 7/1", Some(3)),
            node(6, "Room 7/2", Some(3)),
        ],
        scores: vec![],
    }
}
