//! Quran text service: one-time cache initialization from the upstream
//! API, then local read-only serving.

use deenify_config::QuranConfig;
use deenify_db::{Ayah, AyahWithSurah, DbError, QuranRepository, Surah, SurahWithAyahs};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

const DEFAULT_API_BASE: &str = "https://api.alquran.cloud/v1";
const SURAH_COUNT: i64 = 114;

const EDITION_ARABIC: &str = "quran-simple";
const EDITION_TRANSLITERATION: &str = "en.transliteration";
const EDITION_TRANSLATION: &str = "id.indonesian";

/// Pause between surah fetches so the mirror run stays polite upstream.
const FETCH_PACING: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum QuranError {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Quran API error: {0}")]
    ApiError(String),
    #[error("Database error: {0}")]
    DbError(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ApiSurah {
    number: i64,
    name: String,
    #[serde(rename = "englishName")]
    english_name: String,
    #[serde(rename = "numberOfAyahs")]
    number_of_ayahs: i64,
    #[serde(rename = "revelationType")]
    revelation_type: String,
    ayahs: Option<Vec<ApiAyah>>,
}

#[derive(Debug, Deserialize)]
struct ApiAyah {
    text: String,
    #[serde(rename = "numberInSurah")]
    number_in_surah: i64,
    juz: i64,
    page: Option<i64>,
}

/// Service over the local Quran mirror.
pub struct QuranService<Q> {
    repo: Arc<Q>,
    client: reqwest::Client,
    api_base: String,
}

impl<Q: QuranRepository> QuranService<Q> {
    pub fn new(repo: Arc<Q>, config: Option<&QuranConfig>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            repo,
            client,
            api_base: config
                .and_then(|c| c.api_base_url.clone())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        }
    }

    async fn fetch_surah(&self, number: i64, edition: &str) -> Result<ApiSurah, QuranError> {
        let url = format!("{}/surah/{}/{}", self.api_base, number, edition);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(QuranError::ApiError(format!(
                "surah {} edition {} returned {}",
                number,
                edition,
                response.status()
            )));
        }

        let envelope: ApiEnvelope<ApiSurah> = response.json().await?;
        Ok(envelope.data)
    }

    /// Mirror all 114 surahs (Arabic, transliteration, translation) into
    /// the local store. Skipped entirely when the mirror is already
    /// complete, so it is safe to run on every boot.
    pub async fn initialize_cache(&self) -> Result<(), QuranError> {
        if self.repo.count_surahs().await? == SURAH_COUNT {
            info!("Quran cache already initialized");
            return Ok(());
        }

        info!("Initializing Quran cache...");

        for number in 1..=SURAH_COUNT {
            let arabic = self.fetch_surah(number, EDITION_ARABIC).await?;
            let transliteration = self.fetch_surah(number, EDITION_TRANSLITERATION).await?;
            let translation = self.fetch_surah(number, EDITION_TRANSLATION).await?;

            self.repo
                .upsert_surah(&Surah {
                    id: arabic.number,
                    name: arabic.name.clone(),
                    english_name: arabic.english_name.clone(),
                    number_of_ayahs: arabic.number_of_ayahs,
                    revelation_type: arabic.revelation_type.clone(),
                })
                .await?;

            if let Some(ayahs) = &arabic.ayahs {
                for (index, ayah) in ayahs.iter().enumerate() {
                    let latin = transliteration
                        .ayahs
                        .as_ref()
                        .and_then(|list| list.get(index))
                        .map(|a| a.text.clone());
                    let translated = translation
                        .ayahs
                        .as_ref()
                        .and_then(|list| list.get(index))
                        .map(|a| a.text.clone());

                    self.repo
                        .upsert_ayah(&Ayah {
                            id: None,
                            surah_id: arabic.number,
                            number_in_surah: ayah.number_in_surah,
                            juz: ayah.juz,
                            page: ayah.page,
                            text_arabic: ayah.text.clone(),
                            text_latin: latin,
                            text_translation: translated,
                        })
                        .await?;
                }
            }

            info!(
                "Cached Surah {}/{}: {}",
                number, SURAH_COUNT, arabic.english_name
            );

            tokio::time::sleep(FETCH_PACING).await;
        }

        info!("Quran cache initialization completed");
        Ok(())
    }

    pub async fn all_surahs(&self) -> Result<Vec<Surah>, QuranError> {
        Ok(self.repo.list_surahs().await?)
    }

    pub async fn surah_by_id(&self, id: i64) -> Result<SurahWithAyahs, QuranError> {
        self.repo
            .find_surah_with_ayahs(id)
            .await?
            .ok_or_else(|| QuranError::NotFound(format!("surah not found: {}", id)))
    }

    pub async fn ayah(
        &self,
        surah_id: i64,
        number_in_surah: i64,
    ) -> Result<AyahWithSurah, QuranError> {
        self.repo
            .find_ayah(surah_id, number_in_surah)
            .await?
            .ok_or_else(|| {
                QuranError::NotFound(format!("ayah not found: {}:{}", surah_id, number_in_surah))
            })
    }
}
