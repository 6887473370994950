use rusqlite::Connection;
use std::path::Path;

pub const DB_FILE_NAME: &str = "gradebook.sqlite3";

pub const ATTENDANCE_CATALOG: [&str; 4] = ["Present", "Absent", "Late", "Excused"];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS studentlists(
            studentgradeid INTEGER PRIMARY KEY AUTOINCREMENT,
            studentName TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_studentlists_name_nocase
         ON studentlists(LOWER(studentName))",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS gradelists(
            gradeid INTEGER PRIMARY KEY AUTOINCREMENT,
            attendanceDate TEXT,
            scoretype TEXT NOT NULL
              CHECK(scoretype IN ('Attendance', 'Quiz', 'Project', 'Exam')),
            perfectscore REAL NOT NULL CHECK(perfectscore > 0),
            active INTEGER NOT NULL DEFAULT 1
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_gradelists_scoretype ON gradelists(scoretype)",
        [],
    )?;

    // No ON DELETE CASCADE: dependents are removed explicitly, in order.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS scorelists(
            scoreid INTEGER PRIMARY KEY AUTOINCREMENT,
            studentgradeid INTEGER NOT NULL,
            gradeid INTEGER NOT NULL,
            attendanceStatus TEXT NOT NULL DEFAULT '',
            score REAL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(studentgradeid) REFERENCES studentlists(studentgradeid),
            FOREIGN KEY(gradeid) REFERENCES gradelists(gradeid)
        )",
        [],
    )?;
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_scorelists_student_grade
         ON scorelists(studentgradeid, gradeid)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_scorelists_grade ON scorelists(gradeid)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS computedgradelists(
            computedgradeid INTEGER PRIMARY KEY AUTOINCREMENT,
            studentgradeid INTEGER NOT NULL UNIQUE,
            totalattendance REAL NOT NULL DEFAULT 0,
            perfectattendancescore REAL NOT NULL DEFAULT 0,
            attendance10percent REAL NOT NULL DEFAULT 0,
            totalquiz REAL NOT NULL DEFAULT 0,
            perfectquizscore REAL NOT NULL DEFAULT 0,
            quiz15percent REAL NOT NULL DEFAULT 0,
            totalproject REAL NOT NULL DEFAULT 0,
            perfectprojectscore REAL NOT NULL DEFAULT 0,
            project30percent REAL NOT NULL DEFAULT 0,
            totalexam REAL NOT NULL DEFAULT 0,
            perfectexamscore REAL NOT NULL DEFAULT 0,
            exam45percent REAL NOT NULL DEFAULT 0,
            finalcomputedgrade REAL NOT NULL DEFAULT 0,
            transmutedgrade TEXT NOT NULL DEFAULT '',
            FOREIGN KEY(studentgradeid) REFERENCES studentlists(studentgradeid)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attendance(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            status TEXT NOT NULL UNIQUE
        )",
        [],
    )?;
    seed_attendance_catalog(conn)?;

    Ok(())
}

fn seed_attendance_catalog(conn: &Connection) -> anyhow::Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM attendance", [], |r| r.get(0))?;
    if existing > 0 {
        return Ok(());
    }
    let mut stmt = conn.prepare("INSERT OR IGNORE INTO attendance(status) VALUES(?)")?;
    for status in ATTENDANCE_CATALOG {
        stmt.execute([status])?;
    }
    Ok(())
}
