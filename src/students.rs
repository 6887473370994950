use crate::error::{GradebookError, GradebookResult};
use crate::model::{RegisteredStudent, StudentRecord, StudentRemoved};
use crate::store::Store;
use rusqlite::OptionalExtension;
use tracing::{info, instrument};

/// Owns student identity and the rows that hang off a student.
pub struct StudentRegistry<'s> {
    store: &'s Store,
}

impl<'s> StudentRegistry<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Inserts the student, one zero score per existing grade and the
    /// placeholder aggregate row, all in one transaction.
    #[instrument(skip(self))]
    pub fn register(&self, name: &str) -> GradebookResult<RegisteredStudent> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GradebookError::validation(
                "studentName must be a non-empty string",
            ));
        }

        let (student, scores_created) = self.store.in_transaction(|tx| {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT studentgradeid FROM studentlists WHERE LOWER(studentName) = LOWER(?)",
                    [name],
                    |r| r.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Err(GradebookError::conflict(
                    "a student with this name already exists",
                ));
            }

            tx.execute("INSERT INTO studentlists(studentName) VALUES(?)", [name])?;
            let studentgradeid = tx.last_insert_rowid();

            let grade_ids = {
                let mut stmt = tx.prepare("SELECT gradeid FROM gradelists ORDER BY gradeid")?;
                let ids = stmt
                    .query_map([], |r| r.get::<_, i64>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            };
            {
                let mut insert = tx.prepare(
                    "INSERT INTO scorelists(studentgradeid, gradeid, attendanceStatus, score, active)
                     VALUES(?, ?, '', 0, 1)",
                )?;
                for gradeid in &grade_ids {
                    insert.execute((studentgradeid, gradeid))?;
                }
            }

            tx.execute(
                "INSERT INTO computedgradelists(studentgradeid) VALUES(?)",
                [studentgradeid],
            )?;

            Ok((
                RegisteredStudent {
                    studentgradeid,
                    student_name: name.to_string(),
                },
                grade_ids.len(),
            ))
        })?;

        info!(
            studentgradeid = student.studentgradeid,
            scores_created, "student registered"
        );
        Ok(student)
    }

    /// Every student, left-joined with its aggregate row, ordered by name.
    #[instrument(skip(self))]
    pub fn list_all(&self) -> GradebookResult<Vec<StudentRecord>> {
        let mut stmt = self.store.conn().prepare(
            "SELECT
               s.studentgradeid,
               s.studentName,
               c.computedgradeid,
               COALESCE(c.totalattendance, 0),
               COALESCE(c.perfectattendancescore, 0),
               COALESCE(c.attendance10percent, 0),
               COALESCE(c.totalquiz, 0),
               COALESCE(c.perfectquizscore, 0),
               COALESCE(c.quiz15percent, 0),
               COALESCE(c.totalproject, 0),
               COALESCE(c.perfectprojectscore, 0),
               COALESCE(c.project30percent, 0),
               COALESCE(c.totalexam, 0),
               COALESCE(c.perfectexamscore, 0),
               COALESCE(c.exam45percent, 0),
               COALESCE(c.finalcomputedgrade, 0),
               COALESCE(c.transmutedgrade, '')
             FROM studentlists s
             LEFT JOIN computedgradelists c ON c.studentgradeid = s.studentgradeid
             ORDER BY s.studentName ASC",
        )?;
        let rows = stmt
            .query_map([], |r| {
                Ok(StudentRecord {
                    studentgradeid: r.get(0)?,
                    student_name: r.get(1)?,
                    computedgradeid: r.get(2)?,
                    totalattendance: r.get(3)?,
                    perfectattendancescore: r.get(4)?,
                    attendance10percent: r.get(5)?,
                    totalquiz: r.get(6)?,
                    perfectquizscore: r.get(7)?,
                    quiz15percent: r.get(8)?,
                    totalproject: r.get(9)?,
                    perfectprojectscore: r.get(10)?,
                    project30percent: r.get(11)?,
                    totalexam: r.get(12)?,
                    perfectexamscore: r.get(13)?,
                    exam45percent: r.get(14)?,
                    finalcomputedgrade: r.get(15)?,
                    transmutedgrade: r.get(16)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Deletes the student's scores, aggregate row and the student itself.
    #[instrument(skip(self))]
    pub fn remove(&self, studentgradeid: i64) -> GradebookResult<StudentRemoved> {
        let removed = self.store.in_transaction(|tx| {
            let exists = tx
                .query_row(
                    "SELECT 1 FROM studentlists WHERE studentgradeid = ?",
                    [studentgradeid],
                    |r| r.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if !exists {
                return Err(GradebookError::not_found("student not found"));
            }

            let scores_deleted = tx.execute(
                "DELETE FROM scorelists WHERE studentgradeid = ?",
                [studentgradeid],
            )?;
            let computed_grades_deleted = tx.execute(
                "DELETE FROM computedgradelists WHERE studentgradeid = ?",
                [studentgradeid],
            )?;
            tx.execute(
                "DELETE FROM studentlists WHERE studentgradeid = ?",
                [studentgradeid],
            )?;

            Ok(StudentRemoved {
                message: "student and associated scores and computed grades deleted".to_string(),
                scores_deleted,
                computed_grades_deleted,
            })
        })?;

        info!(
            studentgradeid,
            scores_deleted = removed.scores_deleted,
            computed_grades_deleted = removed.computed_grades_deleted,
            "student removed"
        );
        Ok(removed)
    }
}
