use crate::model::{ClassDraft, ClassRecord, EnrollmentRef, Semester};
use crate::service::{ClassService, ServiceError};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("classbook.sqlite3");
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS classes(
            id TEXT PRIMARY KEY,
            topic TEXT NOT NULL,
            semester INTEGER NOT NULL CHECK(semester IN (1, 2)),
            year INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS enrollments(
            class_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            enrolled_at TEXT NOT NULL,
            PRIMARY KEY(class_id, student_id),
            FOREIGN KEY(class_id) REFERENCES classes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_enrollments_class ON enrollments(class_id)",
        [],
    )?;

    Ok(())
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn semester_from_row(v: i64) -> rusqlite::Result<Semester> {
    Semester::try_from(v).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            e.into(),
        )
    })
}

fn check_draft(draft: &ClassDraft) -> Result<(), ServiceError> {
    if !draft.has_topic() {
        return Err(ServiceError::Validation("Topic is required".into()));
    }
    if !(1900..=9999).contains(&draft.year) {
        return Err(ServiceError::Validation(format!(
            "year out of range: {}",
            draft.year
        )));
    }
    Ok(())
}

/// Authoritative class listing: newest year first, then semester, then topic.
pub fn list_classes(conn: &Connection) -> Result<Vec<ClassRecord>, ServiceError> {
    let mut enrollments = load_enrollments(conn, None)?;

    let mut stmt = conn.prepare(
        "SELECT id, topic, semester, year
         FROM classes
         ORDER BY year DESC, semester, topic COLLATE NOCASE, id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                semester_from_row(row.get(2)?)?,
                row.get::<_, i32>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(id, topic, semester, year)| {
            let enrolled = enrollments.remove(&id).unwrap_or_default();
            ClassRecord {
                id,
                topic,
                semester,
                year,
                enrollments: enrolled,
            }
        })
        .collect())
}

pub fn load_class(conn: &Connection, class_id: &str) -> Result<ClassRecord, ServiceError> {
    let row = conn
        .query_row(
            "SELECT id, topic, semester, year FROM classes WHERE id = ?",
            [class_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    semester_from_row(row.get(2)?)?,
                    row.get::<_, i32>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((id, topic, semester, year)) = row else {
        return Err(ServiceError::NotFound(class_id.to_string()));
    };
    let enrollments = load_enrollments(conn, Some(&id))?
        .remove(&id)
        .unwrap_or_default();
    Ok(ClassRecord {
        id,
        topic,
        semester,
        year,
        enrollments,
    })
}

fn load_enrollments(
    conn: &Connection,
    class_id: Option<&str>,
) -> Result<HashMap<String, Vec<EnrollmentRef>>, ServiceError> {
    let mut stmt = conn.prepare(
        "SELECT class_id, student_id, enrolled_at
         FROM enrollments
         WHERE ?1 IS NULL OR class_id = ?1
         ORDER BY class_id, enrolled_at, student_id",
    )?;
    let rows = stmt
        .query_map([class_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                EnrollmentRef {
                    student_id: row.get(1)?,
                    enrolled_at: row.get(2)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out: HashMap<String, Vec<EnrollmentRef>> = HashMap::new();
    for (cid, e) in rows {
        out.entry(cid).or_default().push(e);
    }
    Ok(out)
}

fn class_exists(conn: &Connection, class_id: &str) -> Result<bool, ServiceError> {
    let hit: Option<i64> = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

/// Returns false when the student was already enrolled.
pub fn enroll(conn: &Connection, class_id: &str, student_id: &str) -> Result<bool, ServiceError> {
    let student_id = student_id.trim();
    if student_id.is_empty() {
        return Err(ServiceError::Validation("studentId must not be empty".into()));
    }
    if !class_exists(conn, class_id)? {
        return Err(ServiceError::NotFound(class_id.to_string()));
    }
    let changed = conn.execute(
        "INSERT OR IGNORE INTO enrollments(class_id, student_id, enrolled_at) VALUES(?, ?, ?)",
        (class_id, student_id, now_stamp()),
    )?;
    Ok(changed > 0)
}

/// Returns false when the student was not enrolled.
pub fn unenroll(conn: &Connection, class_id: &str, student_id: &str) -> Result<bool, ServiceError> {
    if !class_exists(conn, class_id)? {
        return Err(ServiceError::NotFound(class_id.to_string()));
    }
    let changed = conn.execute(
        "DELETE FROM enrollments WHERE class_id = ? AND student_id = ?",
        (class_id, student_id.trim()),
    )?;
    Ok(changed > 0)
}

/// Class persistence backed by the workspace database.
pub struct SqliteClassService<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteClassService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ClassService for SqliteClassService<'_> {
    fn create_class(&self, draft: &ClassDraft) -> Result<ClassRecord, ServiceError> {
        check_draft(draft)?;
        let class_id = Uuid::new_v4().to_string();
        let topic = draft.topic.trim();
        self.conn.execute(
            "INSERT INTO classes(id, topic, semester, year, created_at) VALUES(?, ?, ?, ?, ?)",
            (&class_id, topic, draft.semester.number(), draft.year, now_stamp()),
        )?;
        tracing::debug!(class_id = %class_id, topic, "class created");
        Ok(ClassRecord {
            id: class_id,
            topic: topic.to_string(),
            semester: draft.semester,
            year: draft.year,
            enrollments: Vec::new(),
        })
    }

    fn update_class(&self, id: &str, draft: &ClassDraft) -> Result<ClassRecord, ServiceError> {
        check_draft(draft)?;
        let changed = self.conn.execute(
            "UPDATE classes SET topic = ?, semester = ?, year = ?, updated_at = ? WHERE id = ?",
            (
                draft.topic.trim(),
                draft.semester.number(),
                draft.year,
                now_stamp(),
                id,
            ),
        )?;
        if changed == 0 {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        tracing::debug!(class_id = id, "class updated");
        load_class(self.conn, id)
    }

    fn delete_class(&self, id: &str) -> Result<(), ServiceError> {
        if !class_exists(self.conn, id)? {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        let tx = self.conn.unchecked_transaction()?;
        // No ON DELETE CASCADE: children go first.
        tx.execute("DELETE FROM enrollments WHERE class_id = ?", [id])?;
        tx.execute("DELETE FROM classes WHERE id = ?", [id])?;
        tx.commit()?;
        tracing::debug!(class_id = id, "class deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        init_schema(&conn).expect("schema");
        conn
    }

    fn draft(topic: &str, semester: Semester, year: i32) -> ClassDraft {
        ClassDraft {
            topic: topic.into(),
            semester,
            year,
        }
    }

    #[test]
    fn create_update_delete_roundtrip_through_listing() {
        let conn = mem_db();
        let svc = SqliteClassService::new(&conn);

        let algo = svc
            .create_class(&draft("Algorithms", Semester::First, 2024))
            .expect("create algorithms");
        let dbs = svc
            .create_class(&draft("Databases", Semester::Second, 2023))
            .expect("create databases");
        assert!(!algo.id.is_empty());
        assert_ne!(algo.id, dbs.id);

        let listed = list_classes(&conn).expect("list");
        let topics: Vec<&str> = listed.iter().map(|c| c.topic.as_str()).collect();
        assert_eq!(topics, vec!["Algorithms", "Databases"]);

        let updated = svc
            .update_class(&algo.id, &draft("Algorithms II", Semester::First, 2024))
            .expect("update");
        assert_eq!(updated.id, algo.id);
        assert_eq!(updated.topic, "Algorithms II");

        svc.delete_class(&dbs.id).expect("delete");
        let listed = list_classes(&conn).expect("list after delete");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].topic, "Algorithms II");
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let conn = mem_db();
        let svc = SqliteClassService::new(&conn);

        let err = svc
            .update_class("nope", &draft("X", Semester::First, 2024))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
        assert_eq!(err.code(), "not_found");

        let err = svc.delete_class("nope").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)), "{err:?}");
    }

    #[test]
    fn blank_topic_is_rejected_by_storage_too() {
        let conn = mem_db();
        let svc = SqliteClassService::new(&conn);
        let err = svc
            .create_class(&draft("   ", Semester::First, 2024))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(list_classes(&conn).expect("list").is_empty());
    }

    #[test]
    fn enrollments_attach_to_listing_and_go_with_the_class() {
        let conn = mem_db();
        let svc = SqliteClassService::new(&conn);
        let c = svc
            .create_class(&draft("Compilers", Semester::Second, 2025))
            .expect("create");

        assert!(enroll(&conn, &c.id, "s-1").expect("enroll s-1"));
        assert!(enroll(&conn, &c.id, "s-2").expect("enroll s-2"));
        assert!(!enroll(&conn, &c.id, "s-1").expect("re-enroll s-1"));

        let listed = list_classes(&conn).expect("list");
        assert_eq!(listed[0].enrollments.len(), 2);

        assert!(unenroll(&conn, &c.id, "s-2").expect("unenroll"));
        assert_eq!(load_class(&conn, &c.id).expect("load").enrollments.len(), 1);

        svc.delete_class(&c.id).expect("delete with enrollments");
        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM enrollments", [], |r| r.get(0))
            .expect("count");
        assert_eq!(left, 0);

        let err = enroll(&conn, &c.id, "s-3").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn updated_at_is_stamped_only_by_updates() {
        let conn = mem_db();
        let svc = SqliteClassService::new(&conn);
        let c = svc
            .create_class(&draft("Graphics", Semester::First, 2024))
            .expect("create");

        let stamp = |conn: &Connection| -> Option<String> {
            conn.query_row("SELECT updated_at FROM classes WHERE id = ?", [&c.id], |r| {
                r.get(0)
            })
            .expect("read updated_at")
        };
        assert_eq!(stamp(&conn), None);

        svc.update_class(&c.id, &draft("Graphics II", Semester::First, 2024))
            .expect("update");
        assert!(stamp(&conn).is_some());

        // Re-running the schema on an existing database is harmless.
        init_schema(&conn).expect("schema again");
        assert_eq!(list_classes(&conn).expect("list").len(), 1);
    }
}
