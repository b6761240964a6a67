use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use super::err::SchoolError;

/// 成绩等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grade {
    A,
    BPlus,
    B,
    CPlus,
    C,
    DPlus,
    D,
    F,
}

/// Lower bound of each grade, highest first. Intervals are half-open
/// `[bound, next_bound)` except `A`, which closes at 100.
const THRESHOLDS: [(f64, Grade); 7] = [
    (80.0, Grade::A),
    (75.0, Grade::BPlus),
    (70.0, Grade::B),
    (65.0, Grade::CPlus),
    (60.0, Grade::C),
    (55.0, Grade::DPlus),
    (50.0, Grade::D),
];

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Grade points counted in half points, so sums stay exact.
    pub(crate) fn half_points(self) -> i64 {
        match self {
            Grade::A => 8,
            Grade::BPlus => 7,
            Grade::B => 6,
            Grade::CPlus => 5,
            Grade::C => 4,
            Grade::DPlus => 3,
            Grade::D => 2,
            Grade::F => 0,
        }
    }
}

/// 分数转换为等级
pub fn score_to_grade(score: f64) -> Grade {
    THRESHOLDS
        .iter()
        .find(|(bound, _)| score >= *bound)
        .map_or(Grade::F, |(_, grade)| *grade)
}

/// 等级转换为绩点
pub fn grade_to_points(grade: Grade) -> f64 {
    grade.half_points() as f64 / 2.0
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = SchoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Grade::A),
            "B+" => Ok(Grade::BPlus),
            "B" => Ok(Grade::B),
            "C+" => Ok(Grade::CPlus),
            "C" => Ok(Grade::C),
            "D+" => Ok(Grade::DPlus),
            "D" => Ok(Grade::D),
            "F" => Ok(Grade::F),
            other => Err(SchoolError::Validation(format!("unknown grade {other:?}"))),
        }
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
