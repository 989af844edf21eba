use crate::error::Result;
use crate::model::{ClassificationUpdate, NewVisit, ReferrerType, VisitRecord};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const TABLE_NAME: &str = "referrer_analytics";

const SELECT_COLUMNS: &str = "id, date_recorded, referrer_url, referrer_primary_url, referrer_host, \
     referrer_type, referrer_name, visitor_ip, user_id, url_destination, is_flagged";

/// Persistence seam for the visit log. Every method is a single statement.
pub trait LogStore {
    fn insert_visit(&self, visit: &NewVisit) -> Result<i64>;
    fn visits(&self, filter: &VisitFilter) -> Result<Vec<VisitRecord>>;
    fn update_classification(&self, id: i64, update: &ClassificationUpdate) -> Result<()>;
    fn delete_visit(&self, id: i64) -> Result<bool>;
    /// Removes every row, returning how many were removed.
    fn clear(&self) -> Result<usize>;
    fn count(&self) -> Result<usize>;
}

/// Optional bounds on a log query. Dates are inclusive and compared in UTC.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitFilter {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub limit: Option<usize>,
    /// Order by descending id, so a limit keeps the most recent visits
    pub newest_first: bool,
}

impl VisitFilter {
    pub fn all() -> Self {
        Self::default()
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT {} FROM {}", SELECT_COLUMNS, TABLE_NAME);
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(since) = self.since {
            clauses.push("date_recorded >= ?");
            values.push(Value::Text(format!("{} 00:00:00", since.format("%Y-%m-%d"))));
        }
        // Inclusive upper bound: everything before the following midnight
        if let Some(next) = self.until.and_then(|until| until.succ_opt()) {
            clauses.push("date_recorded < ?");
            values.push(Value::Text(format!("{} 00:00:00", next.format("%Y-%m-%d"))));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(if self.newest_first {
            " ORDER BY id DESC"
        } else {
            " ORDER BY id"
        });

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit as i64));
        }

        (sql, values)
    }
}

pub struct Database {
    conn: Connection,
}

fn row_to_visit(row: &Row<'_>) -> rusqlite::Result<VisitRecord> {
    let referrer_type: String = row.get(5)?;
    Ok(VisitRecord {
        id: row.get(0)?,
        recorded_at: row.get(1)?,
        referrer_url: row.get(2)?,
        referrer_primary_url: row.get(3)?,
        referrer_host: row.get(4)?,
        referrer_type: ReferrerType::from_column(&referrer_type),
        referrer_name: row.get(6)?,
        visitor_ip: row.get(7)?,
        user_id: row.get(8)?,
        destination_url: row.get(9)?,
        flagged: row.get(10)?,
    })
}

fn type_column(referrer_type: Option<ReferrerType>) -> &'static str {
    referrer_type.map(|t| t.as_str()).unwrap_or("")
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        debug!("Opened visit log at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS referrer_analytics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date_recorded TEXT NOT NULL,
    referrer_url TEXT NOT NULL DEFAULT '',
    referrer_primary_url TEXT NOT NULL DEFAULT '',
    referrer_host TEXT NOT NULL DEFAULT '',
    referrer_type TEXT NOT NULL DEFAULT '',   -- blank when unclassified
    referrer_name TEXT NOT NULL DEFAULT '',
    visitor_ip TEXT NOT NULL DEFAULT '',
    user_id INTEGER NOT NULL DEFAULT 0,       -- 0 for anonymous visitors
    url_destination TEXT NOT NULL DEFAULT '',
    is_flagged BOOLEAN NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_referrer_analytics_host ON referrer_analytics(referrer_host);
CREATE INDEX IF NOT EXISTS idx_referrer_analytics_date ON referrer_analytics(date_recorded);
            ",
        )?;
        Ok(())
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl LogStore for Database {
    fn insert_visit(&self, visit: &NewVisit) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO referrer_analytics (
                date_recorded, referrer_url, referrer_primary_url, referrer_host,
                referrer_type, referrer_name, visitor_ip, user_id, url_destination, is_flagged
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &visit.recorded_at,
                &visit.referrer_url,
                &visit.referrer_primary_url,
                &visit.referrer_host,
                type_column(visit.referrer_type),
                &visit.referrer_name,
                &visit.visitor_ip,
                visit.user_id,
                &visit.destination_url,
                visit.flagged,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn visits(&self, filter: &VisitFilter) -> Result<Vec<VisitRecord>> {
        let (sql, values) = filter.to_sql();
        let mut stmt = self.conn.prepare(&sql)?;

        let visits = stmt
            .query_map(params_from_iter(values.iter()), row_to_visit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(visits)
    }

    fn update_classification(&self, id: i64, update: &ClassificationUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();

        if let Some(referrer_type) = update.referrer_type {
            assignments.push("referrer_type = ?");
            values.push(Value::Text(type_column(referrer_type).to_string()));
        }
        if let Some(ref name) = update.referrer_name {
            assignments.push("referrer_name = ?");
            values.push(Value::Text(name.clone()));
        }
        if let Some(ref primary_url) = update.referrer_primary_url {
            assignments.push("referrer_primary_url = ?");
            values.push(Value::Text(primary_url.clone()));
        }
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            TABLE_NAME,
            assignments.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    fn delete_visit(&self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM referrer_analytics WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM referrer_analytics", [])?;
        info!("Cleared {} visits from the log", removed);
        Ok(removed)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM referrer_analytics", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
