use crate::error::GradebookError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreType {
    Attendance,
    Quiz,
    Project,
    Exam,
}

impl ScoreType {
    pub const ALL: [ScoreType; 4] = [
        ScoreType::Attendance,
        ScoreType::Quiz,
        ScoreType::Project,
        ScoreType::Exam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreType::Attendance => "Attendance",
            ScoreType::Quiz => "Quiz",
            ScoreType::Project => "Project",
            ScoreType::Exam => "Exam",
        }
    }
}

// Exact, case-sensitive match on the label.
impl FromStr for ScoreType {
    type Err = GradebookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScoreType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GradebookError::validation("invalid scoretype"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredStudent {
    pub studentgradeid: i64,
    #[serde(rename = "studentName")]
    pub student_name: String,
}

/// One `students.list` row: a student joined with its aggregate row.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub studentgradeid: i64,
    #[serde(rename = "studentName")]
    pub student_name: String,
    pub computedgradeid: Option<i64>,
    pub totalattendance: f64,
    pub perfectattendancescore: f64,
    pub attendance10percent: f64,
    pub totalquiz: f64,
    pub perfectquizscore: f64,
    pub quiz15percent: f64,
    pub totalproject: f64,
    pub perfectprojectscore: f64,
    pub project30percent: f64,
    pub totalexam: f64,
    pub perfectexamscore: f64,
    pub exam45percent: f64,
    pub finalcomputedgrade: f64,
    pub transmutedgrade: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRemoved {
    pub message: String,
    pub scores_deleted: usize,
    pub computed_grades_deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDefined {
    pub message: String,
    pub gradeid: i64,
    pub scores_created: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRemoved {
    pub message: String,
    pub scores_deleted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CeilingRevised {
    pub message: String,
    pub gradeid: i64,
    pub perfectscore: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecorded {
    pub message: String,
    pub scoreid: i64,
    pub new_score: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecorded {
    pub message: String,
    pub scoreid: i64,
    pub attendance_status: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradebookHeader {
    pub gradeid: i64,
    pub perfectscore: f64,
    pub attendance_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreCell {
    pub scoreid: i64,
    pub score: Option<f64>,
    pub attendance_status: String,
}

impl ScoreCell {
    /// Placeholder for a (student, grade) pair with no score row.
    pub fn missing() -> Self {
        Self {
            scoreid: 0,
            score: None,
            attendance_status: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradebookRow {
    pub studentgradeid: i64,
    pub student_name: String,
    pub scores: BTreeMap<i64, ScoreCell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Gradebook {
    pub headers: Vec<GradebookHeader>,
    pub students: Vec<GradebookRow>,
}
