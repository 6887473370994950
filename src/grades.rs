use crate::attendance::{normalize_status, AttendanceMark};
use crate::error::{GradebookError, GradebookResult};
use crate::model::{
    AttendanceRecorded, CeilingRevised, GradeDefined, GradeRemoved, Gradebook, GradebookHeader,
    GradebookRow, ScoreCell, ScoreRecorded, ScoreType,
};
use crate::store::Store;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, instrument};

pub const ATTENDANCE_PERFECT_SCORE: f64 = 10.0;

/// Grade columns and the per-student scores under them.
pub struct GradeLedger<'s> {
    store: &'s Store,
}

fn require_positive(value: f64, field: &str) -> GradebookResult<()> {
    // NaN fails this comparison too.
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GradebookError::validation(format!(
            "{} must be a positive number",
            field
        )))
    }
}

/// Blank means no date. Anything else must be `YYYY-MM-DD`.
pub fn parse_attendance_date(raw: Option<&str>) -> GradebookResult<Option<String>> {
    let Some(t) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|_| GradebookError::validation("attendanceDate must be YYYY-MM-DD"))
}

fn grade_ceiling(conn: &Connection, gradeid: i64) -> GradebookResult<Option<f64>> {
    Ok(conn
        .query_row(
            "SELECT perfectscore FROM gradelists WHERE gradeid = ?",
            [gradeid],
            |r| r.get(0),
        )
        .optional()?)
}

fn score_grade_id(conn: &Connection, scoreid: i64) -> GradebookResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT gradeid FROM scorelists WHERE scoreid = ?",
            [scoreid],
            |r| r.get(0),
        )
        .optional()?)
}

fn build_gradebook(conn: &Connection, scoretype: ScoreType) -> GradebookResult<Gradebook> {
    let headers = {
        let mut stmt = conn.prepare(
            "SELECT gradeid, perfectscore, attendanceDate
             FROM gradelists
             WHERE scoretype = ?
             ORDER BY gradeid ASC",
        )?;
        let rows = stmt
            .query_map([scoretype.as_str()], |r| {
                Ok(GradebookHeader {
                    gradeid: r.get(0)?,
                    perfectscore: r.get(1)?,
                    attendance_date: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let students = {
        let mut stmt = conn.prepare(
            "SELECT studentgradeid, studentName FROM studentlists ORDER BY studentName ASC",
        )?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let mut scores_stmt = conn.prepare(
        "SELECT scoreid, gradeid, score, attendanceStatus
         FROM scorelists
         WHERE studentgradeid = ?",
    )?;
    let mut rows = Vec::with_capacity(students.len());
    for (studentgradeid, student_name) in students {
        let mut by_grade: HashMap<i64, ScoreCell> = scores_stmt
            .query_map([studentgradeid], |r| {
                Ok((
                    r.get::<_, i64>(1)?,
                    ScoreCell {
                        scoreid: r.get(0)?,
                        score: r.get(2)?,
                        attendance_status: r.get(3)?,
                    },
                ))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        let scores: BTreeMap<i64, ScoreCell> = headers
            .iter()
            .map(|h| {
                let cell = by_grade
                    .remove(&h.gradeid)
                    .unwrap_or_else(ScoreCell::missing);
                (h.gradeid, cell)
            })
            .collect();

        rows.push(GradebookRow {
            studentgradeid,
            student_name,
            scores,
        });
    }

    Ok(Gradebook {
        headers,
        students: rows,
    })
}

impl<'s> GradeLedger<'s> {
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Inserts a grade column and one zero score per existing student.
    #[instrument(skip(self))]
    pub fn define_grade(
        &self,
        scoretype: ScoreType,
        perfectscore: f64,
        attendance_date: Option<&str>,
    ) -> GradebookResult<GradeDefined> {
        require_positive(perfectscore, "perfectscore")?;
        let attendance_date = parse_attendance_date(attendance_date)?;

        let defined = self.store.in_transaction(|tx| {
            tx.execute(
                "INSERT INTO gradelists(attendanceDate, scoretype, perfectscore, active)
                 VALUES(?, ?, ?, 1)",
                (attendance_date.as_deref(), scoretype.as_str(), perfectscore),
            )?;
            let gradeid = tx.last_insert_rowid();

            let student_ids = {
                let mut stmt = tx.prepare("SELECT studentgradeid FROM studentlists")?;
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
                for studentgradeid in &student_ids {
                    insert.execute((studentgradeid, gradeid))?;
                }
            }

            Ok(GradeDefined {
                message: "grade and scores created".to_string(),
                gradeid,
                scores_created: student_ids.len(),
            })
        })?;

        info!(
            gradeid = defined.gradeid,
            scores_created = defined.scores_created,
            "grade defined"
        );
        Ok(defined)
    }

    pub fn define_attendance_grade(
        &self,
        attendance_date: Option<&str>,
    ) -> GradebookResult<GradeDefined> {
        self.define_grade(
            ScoreType::Attendance,
            ATTENDANCE_PERFECT_SCORE,
            attendance_date,
        )
    }

    #[instrument(skip(self))]
    pub fn remove_grade(&self, gradeid: i64) -> GradebookResult<GradeRemoved> {
        let removed = self.store.in_transaction(|tx| {
            if grade_ceiling(tx, gradeid)?.is_none() {
                return Err(GradebookError::not_found("grade not found"));
            }
            let scores_deleted = tx.execute("DELETE FROM scorelists WHERE gradeid = ?", [gradeid])?;
            tx.execute("DELETE FROM gradelists WHERE gradeid = ?", [gradeid])?;
            Ok(GradeRemoved {
                message: "grade and scores deleted".to_string(),
                scores_deleted,
            })
        })?;

        info!(gradeid, scores_deleted = removed.scores_deleted, "grade removed");
        Ok(removed)
    }

    /// Sets a new ceiling and resets every score under the grade to 0.
    #[instrument(skip(self))]
    pub fn revise_ceiling(
        &self,
        gradeid: i64,
        perfectscore: f64,
    ) -> GradebookResult<CeilingRevised> {
        require_positive(perfectscore, "perfectscore")?;

        let reset = self.store.in_transaction(|tx| {
            if grade_ceiling(tx, gradeid)?.is_none() {
                return Err(GradebookError::not_found("grade not found"));
            }
            tx.execute(
                "UPDATE gradelists SET perfectscore = ? WHERE gradeid = ?",
                (perfectscore, gradeid),
            )?;
            let reset = tx.execute("UPDATE scorelists SET score = 0 WHERE gradeid = ?", [gradeid])?;
            Ok(reset)
        })?;

        info!(gradeid, perfectscore, scores_reset = reset, "ceiling revised");
        Ok(CeilingRevised {
            message: "perfect score updated, scores reset".to_string(),
            gradeid,
            perfectscore,
        })
    }

    /// Zero is rejected here on purpose; only the reset paths produce 0.
    #[instrument(skip(self))]
    pub fn record_score(&self, scoreid: i64, score: f64) -> GradebookResult<ScoreRecorded> {
        require_positive(score, "score")?;

        self.store.in_transaction(|tx| {
            let Some(gradeid) = score_grade_id(tx, scoreid)? else {
                return Err(GradebookError::not_found("score not found"));
            };
            let Some(ceiling) = grade_ceiling(tx, gradeid)? else {
                return Err(GradebookError::not_found("associated grade not found"));
            };
            if score > ceiling {
                return Err(GradebookError::validation(format!(
                    "score cannot exceed {}",
                    ceiling
                )));
            }
            tx.execute(
                "UPDATE scorelists SET score = ? WHERE scoreid = ?",
                (score, scoreid),
            )?;
            Ok(())
        })?;

        info!(scoreid, score, "score recorded");
        Ok(ScoreRecorded {
            message: "score updated".to_string(),
            scoreid,
            new_score: score,
        })
    }

    #[instrument(skip(self))]
    pub fn record_attendance(
        &self,
        scoreid: i64,
        raw_status: &str,
    ) -> GradebookResult<AttendanceRecorded> {
        let mark = self.store.in_transaction(|tx| {
            let Some(gradeid) = score_grade_id(tx, scoreid)? else {
                return Err(GradebookError::not_found("attendance not found"));
            };
            if grade_ceiling(tx, gradeid)?.is_none() {
                return Err(GradebookError::not_found("associated grade not found"));
            }
            let mark = AttendanceMark::from_normalized(&normalize_status(raw_status))
                .ok_or_else(|| GradebookError::validation("invalid attendance status"))?;
            tx.execute(
                "UPDATE scorelists SET score = ?, attendanceStatus = ? WHERE scoreid = ?",
                (mark.score(), mark.label(), scoreid),
            )?;
            Ok(mark)
        })?;

        info!(scoreid, status = mark.label(), "attendance recorded");
        Ok(AttendanceRecorded {
            message: "attendance updated".to_string(),
            scoreid,
            attendance_status: mark.label().to_string(),
            score: mark.score(),
        })
    }

    pub fn list_attendance_status_catalog(&self) -> GradebookResult<Vec<String>> {
        let mut stmt = self
            .store
            .conn()
            .prepare("SELECT status FROM attendance ORDER BY id ASC")?;
        let statuses = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }

    /// Headers are the grades of `scoretype`; every student gets one cell per
    /// header, with a placeholder cell where no score row exists.
    #[instrument(skip(self))]
    pub fn gradebook(&self, scoretype: ScoreType) -> GradebookResult<Gradebook> {
        self.store.in_transaction(|tx| build_gradebook(tx, scoretype))
    }

    pub fn attendance_gradebook(&self) -> GradebookResult<Gradebook> {
        self.gradebook(ScoreType::Attendance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::StudentRegistry;

    fn score_id(store: &Store, studentgradeid: i64, gradeid: i64) -> i64 {
        store
            .conn()
            .query_row(
                "SELECT scoreid FROM scorelists WHERE studentgradeid = ? AND gradeid = ?",
                (studentgradeid, gradeid),
                |r| r.get(0),
            )
            .expect("score row")
    }

    fn score_value(store: &Store, scoreid: i64) -> f64 {
        store
            .conn()
            .query_row(
                "SELECT score FROM scorelists WHERE scoreid = ?",
                [scoreid],
                |r| r.get(0),
            )
            .expect("score value")
    }

    #[test]
    fn cross_product_is_complete_regardless_of_order() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);

        let a = registry.register("Ana").expect("ana");
        let g1 = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("g1");
        assert_eq!(g1.scores_created, 1);
        let b = registry.register("Ben").expect("ben");
        let g2 = ledger
            .define_attendance_grade(Some("2024-09-02"))
            .expect("g2");
        assert_eq!(g2.scores_created, 2);
        let c = registry.register("Cy").expect("cy");

        let total: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM scorelists", [], |r| r.get(0))
            .expect("count");
        assert_eq!(total, 6);
        for s in [&a, &b, &c] {
            for g in [g1.gradeid, g2.gradeid] {
                let n: i64 = store
                    .conn()
                    .query_row(
                        "SELECT COUNT(*) FROM scorelists WHERE studentgradeid = ? AND gradeid = ?",
                        (s.studentgradeid, g),
                        |r| r.get(0),
                    )
                    .expect("pair count");
                assert_eq!(n, 1, "student {} grade {}", s.studentgradeid, g);
            }
        }
    }

    #[test]
    fn define_grade_validates_inputs() {
        let store = Store::open_in_memory().expect("store");
        let ledger = GradeLedger::new(&store);
        for bad in [0.0, -1.0, f64::NAN] {
            let e = ledger
                .define_grade(ScoreType::Exam, bad, None)
                .expect_err("bad ceiling");
            assert!(matches!(e, GradebookError::Validation(_)));
        }
        let e = ledger
            .define_grade(ScoreType::Exam, 10.0, Some("09/02/2024"))
            .expect_err("bad date");
        assert!(matches!(e, GradebookError::Validation(_)));

        let ok = ledger
            .define_grade(ScoreType::Exam, 10.0, Some("  "))
            .expect("blank date");
        let book = ledger.gradebook(ScoreType::Exam).expect("book");
        assert_eq!(book.headers[0].gradeid, ok.gradeid);
        assert_eq!(book.headers[0].attendance_date, None);
    }

    #[test]
    fn attendance_grade_forces_type_and_ceiling() {
        let store = Store::open_in_memory().expect("store");
        let ledger = GradeLedger::new(&store);
        let g = ledger
            .define_attendance_grade(Some("2024-09-02"))
            .expect("grade");
        let (scoretype, perfectscore): (String, f64) = store
            .conn()
            .query_row(
                "SELECT scoretype, perfectscore FROM gradelists WHERE gradeid = ?",
                [g.gradeid],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .expect("grade row");
        assert_eq!(scoretype, "Attendance");
        assert_eq!(perfectscore, 10.0);
    }

    #[test]
    fn remove_grade_cascades_scores() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        registry.register("Ana").expect("ana");
        registry.register("Ben").expect("ben");
        let keep = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("keep");
        let dropped = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("dropped");

        let removed = ledger.remove_grade(dropped.gradeid).expect("remove");
        assert_eq!(removed.scores_deleted, 2);
        let left: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM scorelists WHERE gradeid = ?",
                [keep.gradeid],
                |r| r.get(0),
            )
            .expect("count");
        assert_eq!(left, 2);

        let e = ledger.remove_grade(dropped.gradeid).expect_err("gone");
        assert!(matches!(e, GradebookError::NotFound(_)));
    }

    #[test]
    fn ceiling_revision_resets_scores() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");
        let g = ledger
            .define_grade(ScoreType::Project, 10.0, None)
            .expect("grade");
        let sid = score_id(&store, ana.studentgradeid, g.gradeid);

        ledger.record_score(sid, 5.0).expect("record");
        assert_eq!(score_value(&store, sid), 5.0);

        let revised = ledger.revise_ceiling(g.gradeid, 3.0).expect("revise");
        assert_eq!(revised.perfectscore, 3.0);
        assert_eq!(score_value(&store, sid), 0.0);

        let e = ledger.record_score(sid, 4.0).expect_err("over ceiling");
        match e {
            GradebookError::Validation(msg) => assert_eq!(msg, "score cannot exceed 3"),
            other => panic!("unexpected {:?}", other),
        }
        ledger.record_score(sid, 3.0).expect("at ceiling is allowed");
    }

    #[test]
    fn revise_ceiling_errors() {
        let store = Store::open_in_memory().expect("store");
        let ledger = GradeLedger::new(&store);
        let g = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("grade");
        let e = ledger.revise_ceiling(g.gradeid, 0.0).expect_err("zero");
        assert!(matches!(e, GradebookError::Validation(_)));
        let e = ledger.revise_ceiling(g.gradeid + 100, 5.0).expect_err("missing");
        assert!(matches!(e, GradebookError::NotFound(_)));
    }

    #[test]
    fn record_score_rejects_zero_and_unknown_rows() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");
        let g = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("grade");
        let sid = score_id(&store, ana.studentgradeid, g.gradeid);

        let e = ledger.record_score(sid, 0.0).expect_err("zero");
        assert!(matches!(e, GradebookError::Validation(_)));
        let e = ledger.record_score(sid, -2.0).expect_err("negative");
        assert!(matches!(e, GradebookError::Validation(_)));
        let e = ledger.record_score(sid + 100, 2.0).expect_err("missing");
        assert!(matches!(e, GradebookError::NotFound(_)));

        let recorded = ledger.record_score(sid, 7.5).expect("record");
        assert_eq!(recorded.new_score, 7.5);
    }

    #[test]
    fn record_score_with_orphaned_grade_is_not_found() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");
        let g = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("grade");
        let sid = score_id(&store, ana.studentgradeid, g.gradeid);
        store
            .conn()
            .execute_batch("PRAGMA foreign_keys = OFF")
            .expect("pragma");
        store
            .conn()
            .execute("DELETE FROM gradelists WHERE gradeid = ?", [g.gradeid])
            .expect("orphan");

        match ledger.record_score(sid, 1.0).expect_err("orphan") {
            GradebookError::NotFound(msg) => assert_eq!(msg, "associated grade not found"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn attendance_mapping_is_exact() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");
        let g = ledger.define_attendance_grade(None).expect("grade");
        let sid = score_id(&store, ana.studentgradeid, g.gradeid);

        let late = ledger.record_attendance(sid, "late").expect("late");
        assert_eq!(late.attendance_status, "Late");
        assert_eq!(late.score, 7.0);

        let present = ledger.record_attendance(sid, "  PRESENT ").expect("present");
        assert_eq!(present.attendance_status, "Present");
        assert_eq!(present.score, 10.0);

        let absent = ledger.record_attendance(sid, "absent").expect("absent");
        assert_eq!(absent.score, 0.0);
        assert_eq!(score_value(&store, sid), 0.0);

        let e = ledger.record_attendance(sid, "unknown").expect_err("unknown");
        assert!(matches!(e, GradebookError::Validation(_)));
        let status: String = store
            .conn()
            .query_row(
                "SELECT attendanceStatus FROM scorelists WHERE scoreid = ?",
                [sid],
                |r| r.get(0),
            )
            .expect("status");
        assert_eq!(status, "Absent");

        let e = ledger.record_attendance(sid + 100, "late").expect_err("missing");
        assert!(matches!(e, GradebookError::NotFound(_)));
    }

    #[test]
    fn attendance_marks_ignore_the_grade_ceiling() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");

        let day = ledger.define_attendance_grade(None).expect("attendance grade");
        ledger.revise_ceiling(day.gradeid, 3.0).expect("lower ceiling");
        let day_sid = score_id(&store, ana.studentgradeid, day.gradeid);
        let present = ledger
            .record_attendance(day_sid, "present")
            .expect("present above lowered ceiling");
        assert_eq!(present.score, 10.0);
        assert_eq!(score_value(&store, day_sid), 10.0);

        let quiz = ledger
            .define_grade(ScoreType::Quiz, 5.0, None)
            .expect("quiz");
        let quiz_sid = score_id(&store, ana.studentgradeid, quiz.gradeid);
        let marked = ledger
            .record_attendance(quiz_sid, "Present")
            .expect("attendance on a quiz score");
        assert_eq!(marked.score, 10.0);
        assert_eq!(score_value(&store, quiz_sid), 10.0);
    }

    #[test]
    fn catalog_is_ordered() {
        let store = Store::open_in_memory().expect("store");
        let ledger = GradeLedger::new(&store);
        assert_eq!(
            ledger.list_attendance_status_catalog().expect("catalog"),
            vec!["Present", "Absent", "Late", "Excused"]
        );
    }

    #[test]
    fn gradebook_shape_matches_headers() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);

        let lone = ledger
            .define_grade(ScoreType::Quiz, 10.0, None)
            .expect("grade without students");
        assert_eq!(lone.scores_created, 0);

        registry.register("Zoe").expect("zoe");
        registry.register("Abe").expect("abe");
        ledger
            .define_grade(ScoreType::Quiz, 20.0, None)
            .expect("second quiz");
        ledger
            .define_grade(ScoreType::Exam, 50.0, None)
            .expect("exam");

        let book = ledger.gradebook(ScoreType::Quiz).expect("book");
        assert_eq!(book.headers.len(), 2);
        assert!(book.headers[0].gradeid < book.headers[1].gradeid);
        let names: Vec<&str> = book.students.iter().map(|s| s.student_name.as_str()).collect();
        assert_eq!(names, vec!["Abe", "Zoe"]);
        for row in &book.students {
            assert_eq!(row.scores.len(), book.headers.len());
            for h in &book.headers {
                assert!(row.scores.contains_key(&h.gradeid));
            }
        }

        for g in book.headers.iter().map(|h| h.gradeid).collect::<Vec<_>>() {
            ledger.remove_grade(g).expect("remove");
        }
        let empty = ledger.gradebook(ScoreType::Quiz).expect("empty book");
        assert!(empty.headers.is_empty());
        assert_eq!(empty.students.len(), 2);
        assert!(empty.students.iter().all(|s| s.scores.is_empty()));
    }

    #[test]
    fn gradebook_fills_missing_pairs_with_placeholder() {
        let store = Store::open_in_memory().expect("store");
        let registry = StudentRegistry::new(&store);
        let ledger = GradeLedger::new(&store);
        let ana = registry.register("Ana").expect("ana");
        let g = ledger.define_attendance_grade(None).expect("grade");
        store
            .conn()
            .execute(
                "DELETE FROM scorelists WHERE studentgradeid = ? AND gradeid = ?",
                (ana.studentgradeid, g.gradeid),
            )
            .expect("break invariant");

        let book = ledger.attendance_gradebook().expect("book");
        assert_eq!(book.students[0].scores[&g.gradeid], ScoreCell::missing());
    }
}
