//! Repository for cached Quran text
//!
//! The full text (Arabic, transliteration, translation) is mirrored
//! locally once at startup and served read-only afterwards.

use crate::error::DbError;
use crate::DbClient;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::Row;
use tracing::{debug, error, info};

/// A surah (chapter) of the Quran.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Surah {
    pub id: i64,
    pub name: String,
    pub english_name: String,
    pub number_of_ayahs: i64,
    pub revelation_type: String,
}

/// An ayah (verse) with its three text editions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Ayah {
    pub id: Option<i64>,
    pub surah_id: i64,
    pub number_in_surah: i64,
    pub juz: i64,
    pub page: Option<i64>,
    pub text_arabic: String,
    pub text_latin: Option<String>,
    pub text_translation: Option<String>,
}

/// A surah together with its ordered ayahs.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SurahWithAyahs {
    #[serde(flatten)]
    pub surah: Surah,
    pub ayahs: Vec<Ayah>,
}

/// An ayah together with its surah.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AyahWithSurah {
    #[serde(flatten)]
    pub ayah: Ayah,
    pub surah: Surah,
}

/// Repository for the Quran text cache
pub trait QuranRepository: Send + Sync {
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Number of cached surahs; 114 means the cache is complete.
    fn count_surahs(&self) -> impl std::future::Future<Output = Result<i64, DbError>> + Send;

    fn upsert_surah(
        &self,
        surah: &Surah,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Upsert by the (surah, number-in-surah) natural key.
    fn upsert_ayah(
        &self,
        ayah: &Ayah,
    ) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    fn list_surahs(&self)
        -> impl std::future::Future<Output = Result<Vec<Surah>, DbError>> + Send;

    fn find_surah_with_ayahs(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<SurahWithAyahs>, DbError>> + Send;

    fn find_ayah(
        &self,
        surah_id: i64,
        number_in_surah: i64,
    ) -> impl std::future::Future<Output = Result<Option<AyahWithSurah>, DbError>> + Send;
}

/// SQL implementation of the Quran repository
#[derive(Debug, Clone)]
pub struct SqlQuranRepository {
    db_client: DbClient,
}

impl SqlQuranRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

fn row_to_surah(row: &AnyRow) -> Surah {
    Surah {
        id: row.try_get("id").unwrap_or_default(),
        name: row.try_get("name").unwrap_or_default(),
        english_name: row.try_get("english_name").unwrap_or_default(),
        number_of_ayahs: row.try_get("number_of_ayahs").unwrap_or_default(),
        revelation_type: row.try_get("revelation_type").unwrap_or_default(),
    }
}

fn row_to_ayah(row: &AnyRow) -> Ayah {
    Ayah {
        id: row.try_get("id").ok(),
        surah_id: row.try_get("surah_id").unwrap_or_default(),
        number_in_surah: row.try_get("number_in_surah").unwrap_or_default(),
        juz: row.try_get("juz").unwrap_or_default(),
        page: row.try_get::<Option<i64>, _>("page").unwrap_or(None),
        text_arabic: row.try_get("text_arabic").unwrap_or_default(),
        text_latin: row.try_get::<Option<String>, _>("text_latin").unwrap_or(None),
        text_translation: row
            .try_get::<Option<String>, _>("text_translation")
            .unwrap_or(None),
    }
}

impl QuranRepository for SqlQuranRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing Quran schema");

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS surahs (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                english_name TEXT NOT NULL,
                number_of_ayahs INTEGER NOT NULL,
                revelation_type TEXT NOT NULL
            )
        "#,
            )
            .await?;

        self.db_client
            .execute(
                r#"
            CREATE TABLE IF NOT EXISTS ayahs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                surah_id INTEGER NOT NULL,
                number_in_surah INTEGER NOT NULL,
                juz INTEGER NOT NULL,
                page INTEGER,
                text_arabic TEXT NOT NULL,
                text_latin TEXT,
                text_translation TEXT,
                UNIQUE(surah_id, number_in_surah)
            )
        "#,
            )
            .await?;

        info!("Quran schema initialized successfully");
        Ok(())
    }

    async fn count_surahs(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM surahs")
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(row.try_get("n").unwrap_or(0))
    }

    async fn upsert_surah(&self, surah: &Surah) -> Result<(), DbError> {
        let existing = sqlx::query("SELECT id FROM surahs WHERE id = $1")
            .bind(surah.id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| DbError::QueryError(e.to_string()))?;

        let query = if existing.is_some() {
            r#"
                UPDATE surahs
                SET name = $2, english_name = $3, number_of_ayahs = $4, revelation_type = $5
                WHERE id = $1
            "#
        } else {
            r#"
                INSERT INTO surahs (id, name, english_name, number_of_ayahs, revelation_type)
                VALUES ($1, $2, $3, $4, $5)
            "#
        };

        sqlx::query(query)
            .bind(surah.id)
            .bind(&surah.name)
            .bind(&surah.english_name)
            .bind(surah.number_of_ayahs)
            .bind(&surah.revelation_type)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to upsert surah {}: {}", surah.id, e);
                DbError::QueryError(e.to_string())
            })?;

        Ok(())
    }

    async fn upsert_ayah(&self, ayah: &Ayah) -> Result<(), DbError> {
        let existing =
            sqlx::query("SELECT id FROM ayahs WHERE surah_id = $1 AND number_in_surah = $2")
                .bind(ayah.surah_id)
                .bind(ayah.number_in_surah)
                .fetch_optional(self.db_client.pool())
                .await
                .map_err(|e| DbError::QueryError(e.to_string()))?;

        if existing.is_some() {
            sqlx::query(
                r#"
                UPDATE ayahs
                SET juz = $3, page = $4, text_arabic = $5, text_latin = $6, text_translation = $7
                WHERE surah_id = $1 AND number_in_surah = $2
            "#,
            )
            .bind(ayah.surah_id)
            .bind(ayah.number_in_surah)
            .bind(ayah.juz)
            .bind(ayah.page)
            .bind(&ayah.text_arabic)
            .bind(&ayah.text_latin)
            .bind(&ayah.text_translation)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to update ayah: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO ayahs
                    (surah_id, number_in_surah, juz, page, text_arabic, text_latin, text_translation)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
            )
            .bind(ayah.surah_id)
            .bind(ayah.number_in_surah)
            .bind(ayah.juz)
            .bind(ayah.page)
            .bind(&ayah.text_arabic)
            .bind(&ayah.text_latin)
            .bind(&ayah.text_translation)
            .execute(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to insert ayah: {}", e);
                DbError::QueryError(e.to_string())
            })?;
        }

        Ok(())
    }

    async fn list_surahs(&self) -> Result<Vec<Surah>, DbError> {
        let rows = sqlx::query(
            "SELECT id, name, english_name, number_of_ayahs, revelation_type FROM surahs ORDER BY id ASC",
        )
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| {
            error!("Failed to list surahs: {}", e);
            DbError::QueryError(e.to_string())
        })?;

        Ok(rows.iter().map(row_to_surah).collect())
    }

    async fn find_surah_with_ayahs(&self, id: i64) -> Result<Option<SurahWithAyahs>, DbError> {
        let surah_row = sqlx::query(
            "SELECT id, name, english_name, number_of_ayahs, revelation_type FROM surahs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let surah = match surah_row.as_ref() {
            Some(row) => row_to_surah(row),
            None => return Ok(None),
        };

        let ayah_rows = sqlx::query(
            r#"
            SELECT id, surah_id, number_in_surah, juz, page, text_arabic, text_latin, text_translation
            FROM ayahs
            WHERE surah_id = $1
            ORDER BY number_in_surah ASC
        "#,
        )
        .bind(id)
        .fetch_all(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        Ok(Some(SurahWithAyahs {
            surah,
            ayahs: ayah_rows.iter().map(row_to_ayah).collect(),
        }))
    }

    async fn find_ayah(
        &self,
        surah_id: i64,
        number_in_surah: i64,
    ) -> Result<Option<AyahWithSurah>, DbError> {
        let ayah_row = sqlx::query(
            r#"
            SELECT id, surah_id, number_in_surah, juz, page, text_arabic, text_latin, text_translation
            FROM ayahs
            WHERE surah_id = $1 AND number_in_surah = $2
        "#,
        )
        .bind(surah_id)
        .bind(number_in_surah)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let ayah = match ayah_row.as_ref() {
            Some(row) => row_to_ayah(row),
            None => return Ok(None),
        };

        let surah_row = sqlx::query(
            "SELECT id, name, english_name, number_of_ayahs, revelation_type FROM surahs WHERE id = $1",
        )
        .bind(surah_id)
        .fetch_optional(self.db_client.pool())
        .await
        .map_err(|e| DbError::QueryError(e.to_string()))?;

        let surah = match surah_row.as_ref() {
            Some(row) => row_to_surah(row),
            None => return Ok(None),
        };

        Ok(Some(AyahWithSurah { ayah, surah }))
    }
}
