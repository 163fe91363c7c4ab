//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    DirectoryRepository, ErrorContext, RepositoryError, RepositoryResult, ScheduleFilter,
    ScheduleQuery, ScheduleRepository,
};
use crate::models::{
    AcademicTerm, ClassRoom, ClassRoomId, NewClassRoom, NewSubject, NewTeacher, ScheduleDraft,
    ScheduleId, ScheduleRecord, Subject, SubjectId, Teacher, TeacherId,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from the environment variables listed in the
    /// module docs.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size,
            config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    /// Execute a database operation on the blocking pool, retrying up to
    /// `max_retries` times with exponential backoff when the error is
    /// retryable.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::warn!("Retrying database operation after error: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn term_schedules<'a>(term: &AcademicTerm, query: &ScheduleQuery) -> schedules::BoxedQuery<'a, Pg> {
    let mut q = schedules::table
        .filter(schedules::academic_year.eq(term.academic_year.clone()))
        .filter(schedules::semester.eq(i16::from(term.semester)))
        .into_boxed();

    if !query.include_inactive {
        q = q.filter(schedules::is_active.eq(true));
    }
    if let Some(id) = query.teacher_id {
        q = q.filter(schedules::teacher_id.eq(id.0));
    }
    if let Some(id) = query.class_room_id {
        q = q.filter(schedules::class_room_id.eq(id.0));
    }
    if let Some(id) = query.subject_id {
        q = q.filter(schedules::subject_id.eq(id.0));
    }
    if let Some(day) = query.day_of_week {
        q = q.filter(schedules::day_of_week.eq(day.iso_number()));
    }
    q
}

fn filtered_schedules<'a>(filter: &ScheduleFilter) -> schedules::BoxedQuery<'a, Pg> {
    let mut q = schedules::table.into_boxed();

    if let Some(id) = filter.class_room_id {
        q = q.filter(schedules::class_room_id.eq(id.0));
    }
    if let Some(id) = filter.subject_id {
        q = q.filter(schedules::subject_id.eq(id.0));
    }
    if let Some(id) = filter.teacher_id {
        q = q.filter(schedules::teacher_id.eq(id.0));
    }
    if let Some(year) = filter.academic_year.clone() {
        q = q.filter(schedules::academic_year.eq(year));
    }
    if let Some(semester) = filter.semester {
        q = q.filter(schedules::semester.eq(i16::from(semester)));
    }
    if let Some(day) = filter.day_of_week {
        q = q.filter(schedules::day_of_week.eq(day.iso_number()));
    }
    if let Some(active) = filter.is_active {
        q = q.filter(schedules::is_active.eq(active));
    }
    q
}

#[async_trait]
impl ScheduleRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn store_schedule(&self, draft: &ScheduleDraft) -> RepositoryResult<ScheduleRecord> {
        let row = NewScheduleRow::from(draft);
        self.with_conn(move |conn| {
            let inserted: ScheduleRow = diesel::insert_into(schedules::table)
                .values(&row)
                .returning(ScheduleRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;
            ScheduleRecord::try_from(inserted)
        })
        .await
    }

    async fn store_schedules(
        &self,
        drafts: &[ScheduleDraft],
    ) -> RepositoryResult<Vec<ScheduleRecord>> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewScheduleRow> = drafts.iter().map(NewScheduleRow::from).collect();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let inserted: Vec<ScheduleRow> = diesel::insert_into(schedules::table)
                    .values(&rows)
                    .returning(ScheduleRow::as_returning())
                    .get_results(tx)?;
                rows_to_records(inserted)
            })
        })
        .await
    }

    async fn update_schedule(
        &self,
        id: ScheduleId,
        draft: &ScheduleDraft,
    ) -> RepositoryResult<ScheduleRecord> {
        let changes = ScheduleChangeset::from_draft(draft, Utc::now());
        self.with_conn(move |conn| {
            let updated: Option<ScheduleRow> = diesel::update(schedules::table.find(id.0))
                .set(&changes)
                .returning(ScheduleRow::as_returning())
                .get_result(conn)
                .optional()
                .map_err(map_diesel_error)?;
            let row = updated.ok_or_else(|| {
                RepositoryError::entity_not_found("update_schedule", "schedule", id)
            })?;
            ScheduleRecord::try_from(row)
        })
        .await
    }

    async fn set_schedule_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> RepositoryResult<ScheduleRecord> {
        self.with_conn(move |conn| {
            let updated: Option<ScheduleRow> = diesel::update(schedules::table.find(id.0))
                .set((
                    schedules::is_active.eq(active),
                    schedules::updated_at.eq(Some(Utc::now())),
                ))
                .returning(ScheduleRow::as_returning())
                .get_result(conn)
                .optional()
                .map_err(map_diesel_error)?;
            let row = updated.ok_or_else(|| {
                RepositoryError::entity_not_found("set_schedule_active", "schedule", id)
            })?;
            ScheduleRecord::try_from(row)
        })
        .await
    }

    async fn get_schedule(&self, id: ScheduleId) -> RepositoryResult<ScheduleRecord> {
        self.with_conn(move |conn| {
            let row: Option<ScheduleRow> = schedules::table
                .find(id.0)
                .select(ScheduleRow::as_select())
                .first(conn)
                .optional()
                .map_err(map_diesel_error)?;
            let row = row
                .ok_or_else(|| RepositoryError::entity_not_found("get_schedule", "schedule", id))?;
            ScheduleRecord::try_from(row)
        })
        .await
    }

    async fn list_schedules_for_term(
        &self,
        term: &AcademicTerm,
        query: &ScheduleQuery,
    ) -> RepositoryResult<Vec<ScheduleRecord>> {
        let term = term.clone();
        let query = query.clone();
        self.with_conn(move |conn| {
            let rows: Vec<ScheduleRow> = term_schedules(&term, &query)
                .order((
                    schedules::day_of_week.asc(),
                    schedules::start_time.asc(),
                    schedules::schedule_id.asc(),
                ))
                .select(ScheduleRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("list_schedules_for_term"))?;
            rows_to_records(rows)
        })
        .await
    }

    async fn search_schedules(
        &self,
        filter: &ScheduleFilter,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<ScheduleRecord>, usize)> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let total: i64 = filtered_schedules(&filter)
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;

            let rows: Vec<ScheduleRow> = filtered_schedules(&filter)
                .order((
                    schedules::day_of_week.asc(),
                    schedules::start_time.asc(),
                    schedules::schedule_id.asc(),
                ))
                .offset(offset as i64)
                .limit(limit as i64)
                .select(ScheduleRow::as_select())
                .load(conn)
                .map_err(|e| map_diesel_error(e).with_operation("search_schedules"))?;

            Ok((rows_to_records(rows)?, total.max(0) as usize))
        })
        .await
    }
}

#[async_trait]
impl DirectoryRepository for PostgresRepository {
    async fn store_class_room(&self, class_room: &NewClassRoom) -> RepositoryResult<ClassRoom> {
        let row = NewClassRoomRow::from(class_room);
        self.with_conn(move |conn| {
            diesel::insert_into(class_rooms::table)
                .values(&row)
                .returning(ClassRoomRow::as_returning())
                .get_result::<ClassRoomRow>(conn)
                .map(ClassRoom::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_class_room(&self, id: ClassRoomId) -> RepositoryResult<ClassRoom> {
        self.with_conn(move |conn| {
            class_rooms::table
                .find(id.0)
                .select(ClassRoomRow::as_select())
                .first::<ClassRoomRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(ClassRoom::from)
                .ok_or_else(|| RepositoryError::entity_not_found("get_class_room", "class room", id))
        })
        .await
    }

    async fn list_class_rooms(&self) -> RepositoryResult<Vec<ClassRoom>> {
        self.with_conn(|conn| {
            let rows: Vec<ClassRoomRow> = class_rooms::table
                .order(class_rooms::class_room_id.asc())
                .select(ClassRoomRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(ClassRoom::from).collect())
        })
        .await
    }

    async fn store_subject(&self, subject: &NewSubject) -> RepositoryResult<Subject> {
        let row = NewSubjectRow::from(subject);
        self.with_conn(move |conn| {
            diesel::insert_into(subjects::table)
                .values(&row)
                .returning(SubjectRow::as_returning())
                .get_result::<SubjectRow>(conn)
                .map(Subject::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject> {
        self.with_conn(move |conn| {
            subjects::table
                .find(id.0)
                .select(SubjectRow::as_select())
                .first::<SubjectRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Subject::from)
                .ok_or_else(|| RepositoryError::entity_not_found("get_subject", "subject", id))
        })
        .await
    }

    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        self.with_conn(|conn| {
            let rows: Vec<SubjectRow> = subjects::table
                .order(subjects::subject_id.asc())
                .select(SubjectRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Subject::from).collect())
        })
        .await
    }

    async fn store_teacher(&self, teacher: &NewTeacher) -> RepositoryResult<Teacher> {
        let row = NewTeacherRow::from(teacher);
        self.with_conn(move |conn| {
            diesel::insert_into(teachers::table)
                .values(&row)
                .returning(TeacherRow::as_returning())
                .get_result::<TeacherRow>(conn)
                .map(Teacher::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher> {
        self.with_conn(move |conn| {
            teachers::table
                .find(id.0)
                .select(TeacherRow::as_select())
                .first::<TeacherRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Teacher::from)
                .ok_or_else(|| RepositoryError::entity_not_found("get_teacher", "teacher", id))
        })
        .await
    }

    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        self.with_conn(|conn| {
            let rows: Vec<TeacherRow> = teachers::table
                .order(teachers::teacher_id.asc())
                .select(TeacherRow::as_select())
                .load(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(Teacher::from).collect())
        })
        .await
    }
}
