use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use futures::future::try_join_all;
use log::{debug, warn};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::config::TeacherPolicy;
use super::err::{Entity, Result, SchoolError};
use super::model::{Class, Personnel, Role};
use super::store::RecordStore;
use super::vocabulary::RoleLabels;
use super::SchoolService;

/// 学校人员列表中的一行
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SchoolHierarchyEntry {
    /// 1-based position in the listing.
    pub index: usize,
    pub school: String,
    pub role: Role,
    pub role_label: String,
    pub class_order: i64,
    pub name: String,
}

impl fmt::Display for SchoolHierarchyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. school: {}, role: {}, class: {}, name: {}",
            self.index, self.school, self.role_label, self.class_order, self.name
        )
    }
}

/// `{role label: name}`
#[derive(Debug, Clone, PartialEq)]
pub struct RoleEntry {
    pub role_label: String,
    pub name: String,
}

/// One class: its teacher label and the heads of the room followed by the students.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTreeEntry {
    pub class_order: i64,
    /// `"Teacher: First Last"`
    pub teacher: String,
    pub members: Vec<RoleEntry>,
}

/// 学校及其下按序排列的班级
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolTreeEntry {
    pub school: String,
    pub classes: Vec<ClassTreeEntry>,
}

impl Serialize for RoleEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.role_label, &self.name)?;
        map.end()
    }
}

impl Serialize for ClassTreeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.teacher, &self.members)?;
        map.end()
    }
}

impl Serialize for SchoolTreeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.classes.len() + 1))?;
        map.serialize_entry("school", &self.school)?;
        for class in &self.classes {
            map.serialize_entry(&format!("class {}", class.class_order), class)?;
        }
        map.end()
    }
}

/// Upper-cases the first letter of every word and lower-cases the rest.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Name order: first name, then last name, ignoring case; the stored
/// spelling and then the id break remaining ties.
fn cmp_names(a: &Personnel, b: &Personnel) -> Ordering {
    a.first_name
        .to_lowercase()
        .cmp(&b.first_name.to_lowercase())
        .then_with(|| a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()))
        .then_with(|| a.first_name.cmp(&b.first_name))
        .then_with(|| a.last_name.cmp(&b.last_name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Orders personnel by role rank, then class order, then name, pairing each
/// with its class order. Personnel whose class is not in `class_orders` are left out.
pub fn order_personnel(
    personnel: Vec<Personnel>,
    class_orders: &HashMap<i64, i64>,
) -> Vec<(Personnel, i64)> {
    let mut placed: Vec<(Personnel, i64)> = personnel
        .into_iter()
        .filter_map(|p| class_orders.get(&p.class_id).map(|&order| (p, order)))
        .collect();
    placed.sort_by(|(a, a_order), (b, b_order)| {
        a.role
            .rank()
            .cmp(&b.role.rank())
            .then_with(|| a_order.cmp(b_order))
            .then_with(|| cmp_names(a, b))
    });
    placed
}

/// Builds one class of the nested hierarchy. `Ok(None)` means the class is
/// dropped under the lenient policy.
pub fn assemble_class(
    class: &Class,
    mut personnel: Vec<Personnel>,
    labels: &RoleLabels,
    policy: TeacherPolicy,
) -> Result<Option<ClassTreeEntry>> {
    personnel.sort_by(cmp_names);

    let mut teachers = vec![];
    let mut heads_of_room = vec![];
    let mut students = vec![];
    for person in personnel {
        match person.role {
            Role::Teacher => teachers.push(person),
            Role::HeadOfRoom => heads_of_room.push(person),
            Role::Student => students.push(person),
        }
    }

    let teacher = match (teachers.len(), policy) {
        (1, _) => &teachers[0],
        (0, TeacherPolicy::Strict) => {
            return Err(SchoolError::Aggregation(format!(
                "class {} has no teacher",
                class.id
            )))
        }
        (0, TeacherPolicy::Lenient) => {
            warn!("class {} has no teacher, leaving it out", class.id);
            return Ok(None);
        }
        (n, TeacherPolicy::Strict) => {
            return Err(SchoolError::Aggregation(format!(
                "class {} has {} teachers",
                class.id, n
            )))
        }
        (n, TeacherPolicy::Lenient) => {
            warn!(
                "class {} has {} teachers, using {}",
                class.id,
                n,
                teachers[0].full_name()
            );
            &teachers[0]
        }
    };

    let members = heads_of_room
        .iter()
        .chain(students.iter())
        .map(|person| RoleEntry {
            role_label: labels.label(person.role).to_string(),
            name: person.full_name(),
        })
        .collect();

    Ok(Some(ClassTreeEntry {
        class_order: class.class_order,
        teacher: format!("{}: {}", labels.label(Role::Teacher), teacher.full_name()),
        members,
    }))
}

impl<S: RecordStore> SchoolService<S> {
    /// Personnel of the school titled `school_title`, ordered by role, class and name.
    pub async fn get_hierarchy(&self, school_title: &str) -> Result<Vec<SchoolHierarchyEntry>> {
        let school = self
            .store
            .school_by_title(school_title)
            .await?
            .ok_or_else(|| SchoolError::NotFound(Entity::School(school_title.to_string())))?;

        let class_orders: HashMap<i64, i64> = self
            .store
            .classes_of_school(school.id)
            .await?
            .into_iter()
            .map(|class| (class.id, class.class_order))
            .collect();
        let personnel = self.store.personnel_of_school(school.id).await?;

        let school_title = capitalize_words(&school.title);
        let entries: Vec<SchoolHierarchyEntry> = order_personnel(personnel, &class_orders)
            .into_iter()
            .enumerate()
            .map(|(i, (person, class_order))| SchoolHierarchyEntry {
                index: i + 1,
                school: school_title.clone(),
                role: person.role,
                role_label: self.labels.label(person.role).to_string(),
                class_order,
                name: format!(
                    "{} {}",
                    capitalize_words(&person.first_name),
                    capitalize_words(&person.last_name)
                ),
            })
            .collect();
        debug!("{} personnel in {}", entries.len(), school_title);

        Ok(entries)
    }

    /// Every school by title, each class by order, with its teacher and members.
    pub async fn get_nested_hierarchy(&self) -> Result<Vec<SchoolTreeEntry>> {
        let mut schools = self.store.schools().await?;
        schools.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));

        let mut result = Vec::with_capacity(schools.len());
        for school in schools {
            let mut classes = self.store.classes_of_school(school.id).await?;
            classes.sort_by_key(|class| (class.class_order, class.id));

            let personnel = try_join_all(
                classes
                    .iter()
                    .map(|class| self.store.personnel_of_class(class.id)),
            )
            .await?;

            let mut entries = Vec::with_capacity(classes.len());
            for (class, members) in classes.iter().zip(personnel) {
                if let Some(entry) =
                    assemble_class(class, members, &self.labels, self.teacher_policy)?
                {
                    entries.push(entry);
                }
            }
            result.push(SchoolTreeEntry {
                school: school.title,
                classes: entries,
            });
        }

        Ok(result)
    }
}
