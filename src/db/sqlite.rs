use crate::db::models::{
    DashboardSummary, DbUser, Mapping, NewRequirement, NewTestCase, Requirement,
    RequirementPatch, TestCase, TestCasePatch, from_db_time, to_db_time,
};
use crate::db::schema::SQLITE_INIT;
use crate::error::{TrackerError, map_unique_violation};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Connection, Row, SqliteConnection};
use std::str::FromStr;

const REQUIREMENT_COLUMNS: &str = r#"r.id, r.title, r.description, r.priority, r.status,
    r.created_by, u.username AS creator, r.created_at, r.updated_at"#;

const TEST_CASE_COLUMNS: &str = r#"t.id, t.title, t.description, t.steps, t.expected_result,
    t.status, t.created_by, u.username AS creator, t.created_at, t.updated_at"#;

/// Raw SQL over the single store connection. Owned by the store actor, which
/// is the only caller; nothing here synchronizes on its own.
pub struct TrackerStorage {
    conn: SqliteConnection,
}

impl TrackerStorage {
    pub async fn connect(database_url: &str) -> Result<Self, TrackerError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let conn = SqliteConnection::connect_with(&opts).await?;
        Ok(Self { conn })
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&mut self) -> Result<(), TrackerError> {
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&mut self.conn).await?;
        }
        Ok(())
    }

    // ---- users ----

    pub async fn insert_user(
        &mut self,
        username: &str,
        password_hash: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let res = sqlx::query(
            "INSERT INTO users (username, password, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(to_db_time(now))
        .execute(&mut self.conn)
        .await
        .map_err(|e| map_unique_violation(e, "Username or email already exists"))?;
        Ok(res.last_insert_rowid())
    }

    pub async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<DbUser>, TrackerError> {
        let row = sqlx::query(
            "SELECT id, username, password, email, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&mut self.conn)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn get_user(&mut self, id: i64) -> Result<Option<DbUser>, TrackerError> {
        let row =
            sqlx::query("SELECT id, username, password, email, created_at FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut self.conn)
                .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn list_users(&mut self) -> Result<Vec<DbUser>, TrackerError> {
        let rows =
            sqlx::query("SELECT id, username, password, email, created_at FROM users ORDER BY id")
                .fetch_all(&mut self.conn)
                .await?;
        rows.into_iter().map(Self::row_to_user).collect()
    }

    /// Returns false when no user has that username.
    pub async fn set_password(
        &mut self,
        username: &str,
        password_hash: &str,
    ) -> Result<bool, TrackerError> {
        let res = sqlx::query("UPDATE users SET password = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&mut self.conn)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- requirements ----

    pub async fn list_requirements(&mut self) -> Result<Vec<Requirement>, TrackerError> {
        let sql = format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM requirements r
             LEFT JOIN users u ON r.created_by = u.id
             ORDER BY r.created_at DESC, r.id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&mut self.conn).await?;
        rows.into_iter().map(Self::row_to_requirement).collect()
    }

    pub async fn get_requirement(&mut self, id: i64) -> Result<Option<Requirement>, TrackerError> {
        let sql = format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM requirements r
             LEFT JOIN users u ON r.created_by = u.id
             WHERE r.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;
        row.map(Self::row_to_requirement).transpose()
    }

    pub async fn insert_requirement(
        &mut self,
        new: NewRequirement,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let now = to_db_time(now);
        let res = sqlx::query(
            r#"INSERT INTO requirements
                (title, description, priority, status, created_by, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.priority.as_str())
        .bind(new.status.as_str())
        .bind(new.created_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut self.conn)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Returns false when no row has that id.
    pub async fn update_requirement(
        &mut self,
        id: i64,
        patch: RequirementPatch,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        let res = sqlx::query(
            r#"UPDATE requirements SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                priority = COALESCE(?, priority),
                status = COALESCE(?, status),
                updated_at = ?
              WHERE id = ?"#,
        )
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(to_db_time(now))
        .bind(id)
        .execute(&mut self.conn)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Deletes the requirement and every mapping that references it.
    pub async fn delete_requirement(&mut self, id: i64) -> Result<bool, TrackerError> {
        let mut tx = self.conn.begin().await?;
        sqlx::query("DELETE FROM requirement_test_mapping WHERE requirement_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM requirements WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn requirements_for_test_case(
        &mut self,
        test_case_id: i64,
    ) -> Result<Vec<Requirement>, TrackerError> {
        let sql = format!(
            "SELECT {REQUIREMENT_COLUMNS} FROM requirements r
             INNER JOIN requirement_test_mapping m ON r.id = m.requirement_id
             LEFT JOIN users u ON r.created_by = u.id
             WHERE m.test_case_id = ?
             ORDER BY m.id"
        );
        let rows = sqlx::query(&sql)
            .bind(test_case_id)
            .fetch_all(&mut self.conn)
            .await?;
        rows.into_iter().map(Self::row_to_requirement).collect()
    }

    // ---- test cases ----

    pub async fn list_test_cases(&mut self) -> Result<Vec<TestCase>, TrackerError> {
        let sql = format!(
            "SELECT {TEST_CASE_COLUMNS} FROM test_cases t
             LEFT JOIN users u ON t.created_by = u.id
             ORDER BY t.created_at DESC, t.id DESC"
        );
        let rows = sqlx::query(&sql).fetch_all(&mut self.conn).await?;
        rows.into_iter().map(Self::row_to_test_case).collect()
    }

    pub async fn get_test_case(&mut self, id: i64) -> Result<Option<TestCase>, TrackerError> {
        let sql = format!(
            "SELECT {TEST_CASE_COLUMNS} FROM test_cases t
             LEFT JOIN users u ON t.created_by = u.id
             WHERE t.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut self.conn)
            .await?;
        row.map(Self::row_to_test_case).transpose()
    }

    pub async fn insert_test_case(
        &mut self,
        new: NewTestCase,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let now = to_db_time(now);
        let res = sqlx::query(
            r#"INSERT INTO test_cases
                (title, description, steps, expected_result, status, created_by,
                 created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new.title)
        .bind(new.description)
        .bind(new.steps)
        .bind(new.expected_result)
        .bind(new.status.as_str())
        .bind(new.created_by)
        .bind(&now)
        .bind(&now)
        .execute(&mut self.conn)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn update_test_case(
        &mut self,
        id: i64,
        patch: TestCasePatch,
        now: DateTime<Utc>,
    ) -> Result<bool, TrackerError> {
        let res = sqlx::query(
            r#"UPDATE test_cases SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                steps = COALESCE(?, steps),
                expected_result = COALESCE(?, expected_result),
                status = COALESCE(?, status),
                updated_at = ?
              WHERE id = ?"#,
        )
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.steps)
        .bind(patch.expected_result)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(to_db_time(now))
        .bind(id)
        .execute(&mut self.conn)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Deletes the test case and every mapping that references it.
    pub async fn delete_test_case(&mut self, id: i64) -> Result<bool, TrackerError> {
        let mut tx = self.conn.begin().await?;
        sqlx::query("DELETE FROM requirement_test_mapping WHERE test_case_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let res = sqlx::query("DELETE FROM test_cases WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn test_cases_for_requirement(
        &mut self,
        requirement_id: i64,
    ) -> Result<Vec<TestCase>, TrackerError> {
        let sql = format!(
            "SELECT {TEST_CASE_COLUMNS} FROM test_cases t
             INNER JOIN requirement_test_mapping m ON t.id = m.test_case_id
             LEFT JOIN users u ON t.created_by = u.id
             WHERE m.requirement_id = ?
             ORDER BY m.id"
        );
        let rows = sqlx::query(&sql)
            .bind(requirement_id)
            .fetch_all(&mut self.conn)
            .await?;
        rows.into_iter().map(Self::row_to_test_case).collect()
    }

    // ---- mappings ----

    pub async fn list_mappings(&mut self) -> Result<Vec<Mapping>, TrackerError> {
        let rows = sqlx::query(
            r#"SELECT m.id, m.requirement_id, m.test_case_id,
                      r.title AS requirement_title, t.title AS test_case_title, m.created_at
               FROM requirement_test_mapping m
               LEFT JOIN requirements r ON m.requirement_id = r.id
               LEFT JOIN test_cases t ON m.test_case_id = t.id
               ORDER BY m.id"#,
        )
        .fetch_all(&mut self.conn)
        .await?;
        rows.into_iter().map(Self::row_to_mapping).collect()
    }

    /// Both endpoints must exist; a repeated pair is a `Conflict`.
    pub async fn insert_mapping(
        &mut self,
        requirement_id: i64,
        test_case_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, TrackerError> {
        let (has_requirement, has_test_case): (i64, i64) = sqlx::query_as(
            r#"SELECT
                EXISTS (SELECT 1 FROM requirements WHERE id = ?),
                EXISTS (SELECT 1 FROM test_cases WHERE id = ?)"#,
        )
        .bind(requirement_id)
        .bind(test_case_id)
        .fetch_one(&mut self.conn)
        .await?;
        if has_requirement == 0 {
            return Err(TrackerError::validation(format!(
                "Requirement {requirement_id} does not exist"
            )));
        }
        if has_test_case == 0 {
            return Err(TrackerError::validation(format!(
                "Test case {test_case_id} does not exist"
            )));
        }

        let res = sqlx::query(
            r#"INSERT INTO requirement_test_mapping (requirement_id, test_case_id, created_at)
               VALUES (?, ?, ?)"#,
        )
        .bind(requirement_id)
        .bind(test_case_id)
        .bind(to_db_time(now))
        .execute(&mut self.conn)
        .await
        .map_err(|e| map_unique_violation(e, "Mapping already exists"))?;
        Ok(res.last_insert_rowid())
    }

    pub async fn delete_mapping(&mut self, id: i64) -> Result<bool, TrackerError> {
        let res = sqlx::query("DELETE FROM requirement_test_mapping WHERE id = ?")
            .bind(id)
            .execute(&mut self.conn)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // ---- dashboard ----

    pub async fn summary(&mut self) -> Result<DashboardSummary, TrackerError> {
        let row = sqlx::query(
            r#"SELECT
                (SELECT COUNT(*) FROM requirements) AS requirements,
                (SELECT COUNT(*) FROM test_cases) AS test_cases,
                (SELECT COUNT(*) FROM requirement_test_mapping) AS mappings,
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM requirements WHERE status = 'Active') AS active_requirements,
                (SELECT COUNT(*) FROM test_cases WHERE status = 'Passed') AS passed_tests"#,
        )
        .fetch_one(&mut self.conn)
        .await?;
        Ok(DashboardSummary {
            requirements: row.try_get("requirements")?,
            test_cases: row.try_get("test_cases")?,
            mappings: row.try_get("mappings")?,
            users: row.try_get("users")?,
            active_requirements: row.try_get("active_requirements")?,
            passed_tests: row.try_get("passed_tests")?,
        })
    }

    // ---- row mapping ----

    fn time_col(row: &SqliteRow, col: &str) -> Result<DateTime<Utc>, TrackerError> {
        let s: String = row.try_get(col)?;
        Ok(from_db_time(&s).map_err(|e| sqlx::Error::Decode(Box::new(e)))?)
    }

    fn label_col<T>(row: &SqliteRow, col: &str) -> Result<T, TrackerError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let s: String = row.try_get(col)?;
        Ok(s.parse::<T>().map_err(|e| sqlx::Error::Decode(Box::new(e)))?)
    }

    fn row_to_user(row: SqliteRow) -> Result<DbUser, TrackerError> {
        Ok(DbUser {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            email: row.try_get("email")?,
            created_at: Self::time_col(&row, "created_at")?,
        })
    }

    fn row_to_requirement(row: SqliteRow) -> Result<Requirement, TrackerError> {
        Ok(Requirement {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: Self::label_col(&row, "priority")?,
            status: Self::label_col(&row, "status")?,
            created_by: row.try_get("created_by")?,
            creator: row.try_get("creator")?,
            created_at: Self::time_col(&row, "created_at")?,
            updated_at: Self::time_col(&row, "updated_at")?,
        })
    }

    fn row_to_test_case(row: SqliteRow) -> Result<TestCase, TrackerError> {
        Ok(TestCase {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            steps: row.try_get("steps")?,
            expected_result: row.try_get("expected_result")?,
            status: Self::label_col(&row, "status")?,
            created_by: row.try_get("created_by")?,
            creator: row.try_get("creator")?,
            created_at: Self::time_col(&row, "created_at")?,
            updated_at: Self::time_col(&row, "updated_at")?,
        })
    }

    fn row_to_mapping(row: SqliteRow) -> Result<Mapping, TrackerError> {
        Ok(Mapping {
            id: row.try_get("id")?,
            requirement_id: row.try_get("requirement_id")?,
            test_case_id: row.try_get("test_case_id")?,
            requirement_title: row.try_get("requirement_title")?,
            test_case_title: row.try_get("test_case_title")?,
            created_at: Self::time_col(&row, "created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Priority, RequirementStatus, TestCaseStatus};

    async fn storage() -> TrackerStorage {
        let mut s = TrackerStorage::connect("sqlite::memory:")
            .await
            .expect("connect");
        s.init_schema().await.expect("schema");
        s
    }

    fn requirement(title: &str, created_by: Option<i64>) -> NewRequirement {
        NewRequirement {
            title: title.to_string(),
            description: None,
            priority: Priority::default(),
            status: RequirementStatus::default(),
            created_by,
        }
    }

    fn test_case(title: &str) -> NewTestCase {
        NewTestCase {
            title: title.to_string(),
            description: None,
            steps: Some("1. do it".to_string()),
            expected_result: None,
            status: TestCaseStatus::default(),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let mut s = storage().await;
        s.init_schema().await.expect("second init");
    }

    #[tokio::test]
    async fn missing_creator_reads_as_none() {
        let mut s = storage().await;
        let id = s
            .insert_requirement(requirement("orphan", Some(999)), Utc::now())
            .await
            .expect("insert");
        let r = s.get_requirement(id).await.expect("get").expect("row");
        assert_eq!(r.created_by, Some(999));
        assert_eq!(r.creator, None);
        assert_eq!(s.list_requirements().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn creator_username_is_joined() {
        let mut s = storage().await;
        let uid = s
            .insert_user("alice", "hash", "a@x.com", Utc::now())
            .await
            .expect("user");
        let id = s
            .insert_requirement(requirement("owned", Some(uid)), Utc::now())
            .await
            .expect("insert");
        let r = s.get_requirement(id).await.expect("get").expect("row");
        assert_eq!(r.creator.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn duplicate_user_is_a_conflict() {
        let mut s = storage().await;
        s.insert_user("alice", "h", "a@x.com", Utc::now())
            .await
            .expect("first");
        let err = s
            .insert_user("alice", "h", "other@x.com", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
        let err = s
            .insert_user("bob", "h", "a@x.com", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Conflict(_)));
    }

    #[tokio::test]
    async fn patch_keeps_unspecified_columns() {
        let mut s = storage().await;
        let mut new = requirement("keep me", None);
        new.description = Some("original".to_string());
        new.priority = Priority::High;
        let id = s.insert_requirement(new, Utc::now()).await.expect("insert");

        let patch = RequirementPatch {
            status: Some(RequirementStatus::Active),
            ..Default::default()
        };
        assert!(s.update_requirement(id, patch, Utc::now()).await.expect("update"));
        let r = s.get_requirement(id).await.expect("get").expect("row");
        assert_eq!(r.title, "keep me");
        assert_eq!(r.description.as_deref(), Some("original"));
        assert_eq!(r.priority, Priority::High);
        assert_eq!(r.status, RequirementStatus::Active);

        assert!(
            !s.update_requirement(id + 100, RequirementPatch::default(), Utc::now())
                .await
                .expect("update missing")
        );
    }

    #[tokio::test]
    async fn mapping_rules_are_enforced() {
        let mut s = storage().await;
        let r = s
            .insert_requirement(requirement("R", None), Utc::now())
            .await
            .expect("req");
        let t = s.insert_test_case(test_case("T"), Utc::now()).await.expect("tc");

        let m = s.insert_mapping(r, t, Utc::now()).await.expect("map");
        let dup = s.insert_mapping(r, t, Utc::now()).await.unwrap_err();
        assert!(matches!(dup, TrackerError::Conflict(_)));
        let dangling = s.insert_mapping(r, t + 1, Utc::now()).await.unwrap_err();
        assert!(matches!(dangling, TrackerError::Validation(_)));

        let listed = s.list_mappings().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, m);
        assert_eq!(listed[0].requirement_title.as_deref(), Some("R"));
        assert_eq!(listed[0].test_case_title.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn deleting_either_side_cascades() {
        let mut s = storage().await;
        let r1 = s.insert_requirement(requirement("R1", None), Utc::now()).await.expect("r1");
        let r2 = s.insert_requirement(requirement("R2", None), Utc::now()).await.expect("r2");
        let t1 = s.insert_test_case(test_case("T1"), Utc::now()).await.expect("t1");
        let t2 = s.insert_test_case(test_case("T2"), Utc::now()).await.expect("t2");
        for (r, t) in [(r1, t1), (r1, t2), (r2, t1)] {
            s.insert_mapping(r, t, Utc::now()).await.expect("map");
        }

        assert!(s.delete_requirement(r1).await.expect("delete r1"));
        let left = s.list_mappings().await.expect("list");
        assert_eq!(left.len(), 1);
        assert!(left.iter().all(|m| m.requirement_id != r1));

        assert!(s.delete_test_case(t1).await.expect("delete t1"));
        assert!(s.list_mappings().await.expect("list").is_empty());
        assert!(!s.delete_test_case(t1).await.expect("delete again"));
    }

    #[tokio::test]
    async fn summary_counts_by_status() {
        let mut s = storage().await;
        let mut active = requirement("A", None);
        active.status = RequirementStatus::Active;
        s.insert_requirement(active, Utc::now()).await.expect("a");
        s.insert_requirement(requirement("B", None), Utc::now()).await.expect("b");
        let mut passed = test_case("P");
        passed.status = TestCaseStatus::Passed;
        s.insert_test_case(passed, Utc::now()).await.expect("p");

        let sum = s.summary().await.expect("summary");
        assert_eq!(sum.requirements, 2);
        assert_eq!(sum.active_requirements, 1);
        assert_eq!(sum.test_cases, 1);
        assert_eq!(sum.passed_tests, 1);
        assert_eq!(sum.mappings, 0);
        assert_eq!(sum.users, 0);
    }
}
