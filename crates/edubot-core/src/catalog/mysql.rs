//! MySQL-backed catalog source.
//!
//! Reads active rows from the `courses` and `faqs` tables. Also owns the
//! schema and the seeding routine used by `edubot seed` and `POST /seed`.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use tracing::{info, warn};

use edubot_types::config::DatabaseConfig;
use edubot_types::errors::BotError;
use edubot_types::{CatalogSnapshot, CatalogSource, Course, Faq};

// ============================================================
// Schema
// ============================================================

const MIGRATION_CREATE_COURSES: &str = "\
CREATE TABLE IF NOT EXISTS courses (\
    id INT AUTO_INCREMENT PRIMARY KEY, \
    title VARCHAR(255) NOT NULL, \
    description TEXT NOT NULL, \
    price DECIMAL(10,2) NOT NULL, \
    duration INT NOT NULL, \
    instructor VARCHAR(255) NOT NULL, \
    is_active BOOLEAN DEFAULT TRUE, \
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP\
)";

const MIGRATION_CREATE_FAQS: &str = "\
CREATE TABLE IF NOT EXISTS faqs (\
    id INT AUTO_INCREMENT PRIMARY KEY, \
    question VARCHAR(500) NOT NULL, \
    answer TEXT NOT NULL, \
    keywords VARCHAR(500), \
    course_id INT NULL, \
    is_active BOOLEAN DEFAULT TRUE, \
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP, \
    FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL\
)";

const SELECT_COURSES: &str = "\
SELECT id, title, description, price, duration, instructor \
FROM courses WHERE is_active = 1 ORDER BY id";

const SELECT_FAQS: &str = "\
SELECT id, question, answer, keywords, course_id \
FROM faqs WHERE is_active = 1 ORDER BY id";

// ============================================================
// MySqlCatalog
// ============================================================

/// Catalog source reading the `courses` and `faqs` tables.
#[derive(Debug, Clone)]
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    /// Connect eagerly, failing if the database is unreachable within the
    /// configured timeout.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, BotError> {
        let url = config.connection_url()?;
        let pool = pool_options(config)
            .connect(&url)
            .await
            .map_err(|e| BotError::Database(format!("connection failed: {e}")))?;
        Ok(Self { pool })
    }

    /// Build a pool without connecting. Connections are opened on first use,
    /// so an unreachable database only surfaces as load or ping failures.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, BotError> {
        let url = config.connection_url()?;
        let pool = pool_options(config)
            .connect_lazy(&url)
            .map_err(|e| BotError::Database(format!("invalid connection settings: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Create the `courses` and `faqs` tables if they do not exist.
    pub async fn migrate(&self) -> Result<(), BotError> {
        for sql in [MIGRATION_CREATE_COURSES, MIGRATION_CREATE_FAQS] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| BotError::Database(format!("migration failed: {e}")))?;
        }
        info!("catalog schema ready");
        Ok(())
    }

    /// Replace both tables' contents with `snapshot` in one transaction.
    ///
    /// Ids are written explicitly so FAQ back-references stay valid.
    pub async fn seed(&self, snapshot: &CatalogSnapshot) -> Result<(), BotError> {
        snapshot.validate()?;
        let map_err = |e: sqlx::Error| BotError::Database(format!("seed failed: {e}"));

        let mut tx = self.pool.begin().await.map_err(map_err)?;

        sqlx::query("DELETE FROM faqs")
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        sqlx::query("DELETE FROM courses")
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;

        for course in &snapshot.courses {
            sqlx::query(
                "INSERT INTO courses (id, title, description, price, duration, instructor, is_active) \
                 VALUES (?, ?, ?, ?, ?, ?, TRUE)",
            )
            .bind(course.id)
            .bind(&course.title)
            .bind(&course.description)
            .bind(course.price)
            .bind(course.duration_weeks)
            .bind(&course.instructor)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        for faq in &snapshot.faqs {
            let course_id = faq
                .course_id
                .filter(|id| snapshot.course(*id).is_some());
            if faq.course_id.is_some() && course_id.is_none() {
                warn!(faq = faq.id, "FAQ references an unknown course, storing without link");
            }

            sqlx::query(
                "INSERT INTO faqs (id, question, answer, keywords, course_id, is_active) \
                 VALUES (?, ?, ?, ?, ?, TRUE)",
            )
            .bind(faq.id)
            .bind(&faq.question)
            .bind(&faq.answer)
            .bind(&faq.keywords)
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(map_err)?;
        }

        tx.commit().await.map_err(map_err)?;

        info!(
            courses = snapshot.courses.len(),
            faqs = snapshot.faqs.len(),
            "catalog seeded"
        );
        Ok(())
    }

    /// Load a snapshot from `source`, ensure the schema exists and seed it.
    pub async fn seed_from(&self, source: &dyn CatalogSource) -> Result<CatalogSnapshot, BotError> {
        let snapshot = source.load().await?;
        self.migrate().await?;
        self.seed(&snapshot).await?;
        Ok(snapshot)
    }

    async fn load_courses(&self) -> Result<Vec<Course>, BotError> {
        let rows = sqlx::query(SELECT_COURSES)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BotError::Database(format!("failed to load courses: {e}")))?;
        rows.into_iter().map(row_to_course).collect()
    }

    async fn load_faqs(&self) -> Result<Vec<Faq>, BotError> {
        let rows = sqlx::query(SELECT_FAQS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BotError::Database(format!("failed to load FAQs: {e}")))?;
        rows.into_iter().map(row_to_faq).collect()
    }
}

fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
}

#[async_trait]
impl CatalogSource for MySqlCatalog {
    /// Load courses and FAQs. Both must succeed for a snapshot to be returned.
    async fn load(&self) -> Result<CatalogSnapshot, BotError> {
        let courses = self.load_courses().await?;
        let faqs = self.load_faqs().await?;
        Ok(CatalogSnapshot::new(courses, faqs))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// Convert a `courses` row into a [`Course`].
fn row_to_course(row: MySqlRow) -> Result<Course, BotError> {
    let map_err = |e: sqlx::Error| BotError::Database(e.to_string());

    let duration: i32 = row.try_get("duration").map_err(map_err)?;
    let duration_weeks = u32::try_from(duration)
        .map_err(|_| BotError::Catalog(format!("negative course duration: {duration}")))?;

    Ok(Course {
        id: i64::from(row.try_get::<i32, _>("id").map_err(map_err)?),
        title: row.try_get("title").map_err(map_err)?,
        description: row.try_get("description").map_err(map_err)?,
        price: row.try_get::<Decimal, _>("price").map_err(map_err)?,
        duration_weeks,
        instructor: row.try_get("instructor").map_err(map_err)?,
    })
}

/// Convert a `faqs` row into a [`Faq`].
fn row_to_faq(row: MySqlRow) -> Result<Faq, BotError> {
    let map_err = |e: sqlx::Error| BotError::Database(e.to_string());

    let keywords: Option<String> = row.try_get("keywords").map_err(map_err)?;

    Ok(Faq {
        id: i64::from(row.try_get::<i32, _>("id").map_err(map_err)?),
        question: row.try_get("question").map_err(map_err)?,
        answer: row.try_get("answer").map_err(map_err)?,
        keywords: keywords.unwrap_or_default(),
        course_id: row
            .try_get::<Option<i32>, _>("course_id")
            .map_err(map_err)?
            .map(i64::from),
    })
}

// ============================================================
// Tests
// ============================================================
