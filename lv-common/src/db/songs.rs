//! Song repository

use crate::models::{KeyField, LooseNumber, SongDraft, SongRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

const SONG_COLUMNS: &str = "guid, song_name, url, movie, cast_and_crew, music, director, \
     producer, language, year, year_text, total_songs, total_songs_text, created_at";

/// Searchable text columns and their lowercased shadows
const SEARCH_COLUMNS: [&str; 5] = ["song_name_lc", "movie_lc", "music_lc", "director_lc", "language_lc"];

/// Listing order: newest year first, songs without a numeric year last
const LIST_ORDER: &str = " ORDER BY year IS NULL, year DESC, rowid";

/// Values sharing one key, ids in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKeyGroup {
    pub value: String,
    pub ids: Vec<Uuid>,
}

/// Insert one song on an existing connection (usually inside a transaction)
pub async fn insert_song(conn: &mut SqliteConnection, draft: &SongDraft) -> Result<SongRecord> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();

    let cast_and_crew = draft
        .cast_and_crew
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to encode cast_and_crew: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO songs (
            guid, song_name, url, movie, cast_and_crew, music, director, producer,
            language, year, year_text, total_songs, total_songs_text,
            song_name_lc, movie_lc, music_lc, director_lc, language_lc, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&draft.song_name)
    .bind(&draft.url)
    .bind(&draft.movie)
    .bind(cast_and_crew)
    .bind(&draft.music)
    .bind(&draft.director)
    .bind(&draft.producer)
    .bind(&draft.language)
    .bind(draft.year.as_ref().and_then(LooseNumber::as_number))
    .bind(draft.year.as_ref().and_then(LooseNumber::as_text))
    .bind(draft.total_songs.as_ref().and_then(LooseNumber::as_number))
    .bind(draft.total_songs.as_ref().and_then(LooseNumber::as_text))
    .bind(fold_case(&draft.song_name))
    .bind(draft.movie.as_deref().map(fold_case))
    .bind(draft.music.as_deref().map(fold_case))
    .bind(draft.director.as_deref().map(fold_case))
    .bind(draft.language.as_deref().map(fold_case))
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(SongRecord {
        id,
        song: draft.clone(),
        created_at,
    })
}

/// Insert a batch atomically; returns the number of rows written
pub async fn insert_songs(pool: &SqlitePool, drafts: &[SongDraft]) -> Result<usize> {
    let mut tx = pool.begin().await?;
    for draft in drafts {
        insert_song(&mut *tx, draft).await?;
    }
    tx.commit().await?;
    Ok(drafts.len())
}

/// Does a stored song already hold this value for `field`?
pub async fn key_exists(pool: &SqlitePool, field: KeyField, value: &str) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM songs WHERE {} = ?)",
        field.column()
    );
    let exists: bool = sqlx::query_scalar(&sql).bind(value).fetch_one(pool).await?;
    Ok(exists)
}

/// First key of `draft` already present in the store, checked in [`KeyField::ALL`] order
pub async fn find_conflict(pool: &SqlitePool, draft: &SongDraft) -> Result<Option<KeyField>> {
    for field in KeyField::ALL {
        if key_exists(pool, field, draft.key(field)).await? {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

pub async fn get_song(pool: &SqlitePool, id: Uuid) -> Result<Option<SongRecord>> {
    let sql = format!("SELECT {} FROM songs WHERE guid = ?", SONG_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(song_from_row).transpose()
}

/// Number of songs matching `keyword` (all songs when `None`)
pub async fn count_songs(pool: &SqlitePool, keyword: Option<&str>) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM songs");
    if let Some(keyword) = keyword {
        qb.push(" WHERE ");
        push_keyword_filter(&mut qb, keyword);
    }
    let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

/// One page of songs, newest year first
pub async fn list_songs(
    pool: &SqlitePool,
    keyword: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SongRecord>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM songs", SONG_COLUMNS));
    if let Some(keyword) = keyword {
        qb.push(" WHERE ");
        push_keyword_filter(&mut qb, keyword);
    }
    qb.push(LIST_ORDER);
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(song_from_row).collect()
}

/// Songs matching `query`, capped at `limit`
///
/// A song matches when `song_name`, `movie`, `music`, `director` or
/// `language` contains the query case-insensitively, or when
/// `cast_and_crew` has an element exactly equal to it.
pub async fn search_songs(pool: &SqlitePool, query: &str, limit: i64) -> Result<Vec<SongRecord>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM songs WHERE ", SONG_COLUMNS));
    push_keyword_filter(&mut qb, query);
    qb.push(LIST_ORDER);
    qb.push(" LIMIT ").push_bind(limit);

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(song_from_row).collect()
}

fn push_keyword_filter(qb: &mut QueryBuilder<'_, Sqlite>, keyword: &str) {
    let pattern = format!("%{}%", escape_like(&fold_case(keyword)));

    qb.push("(");
    for (i, column) in SEARCH_COLUMNS.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("{} LIKE ", column))
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\'");
    }
    qb.push(" OR EXISTS (SELECT 1 FROM json_each(songs.cast_and_crew) WHERE json_each.value = ")
        .push_bind(keyword.to_string())
        .push("))");
}

/// Unicode lowercase, applied identically to stored text and queries
fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Distinct non-empty movie names, alphabetical
pub async fn distinct_movies(pool: &SqlitePool) -> Result<Vec<String>> {
    let movies: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT movie FROM songs WHERE movie IS NOT NULL AND movie <> '' ORDER BY movie",
    )
    .fetch_all(pool)
    .await?;
    Ok(movies)
}

/// Delete one song (liked-song references cascade); false if absent
pub async fn delete_song(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Snapshot of every value of `field` held by more than one song
pub async fn duplicate_groups(pool: &SqlitePool, field: KeyField) -> Result<Vec<DuplicateKeyGroup>> {
    let column = field.column();
    let sql = format!(
        "SELECT {column}, guid FROM songs \
         WHERE {column} IN (SELECT {column} FROM songs GROUP BY {column} HAVING COUNT(*) > 1) \
         ORDER BY {column}, rowid"
    );
    let rows: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(pool).await?;

    let mut groups: Vec<DuplicateKeyGroup> = Vec::new();
    for (value, guid) in rows {
        let id = parse_guid(&guid)?;
        match groups.last_mut() {
            Some(group) if group.value == value => group.ids.push(id),
            _ => groups.push(DuplicateKeyGroup {
                value,
                ids: vec![id],
            }),
        }
    }
    Ok(groups)
}

/// Move liked-song references from `from` onto `to`
///
/// References that would duplicate an existing (user, `to`) pair are left
/// in place and disappear with their song.
pub async fn repoint_liked_songs(conn: &mut SqliteConnection, from: &[Uuid], to: Uuid) -> Result<u64> {
    let mut moved = 0;
    for id in from {
        let result = sqlx::query("UPDATE OR IGNORE liked_songs SET song_id = ? WHERE song_id = ?")
            .bind(to.to_string())
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;
        moved += result.rows_affected();
    }
    Ok(moved)
}

/// Delete songs by id; returns rows removed
pub async fn delete_songs(conn: &mut SqliteConnection, ids: &[Uuid]) -> Result<u64> {
    let mut removed = 0;
    for id in ids {
        let result = sqlx::query("DELETE FROM songs WHERE guid = ?")
            .bind(id.to_string())
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}

pub(crate) fn parse_guid(guid: &str) -> Result<Uuid> {
    Uuid::parse_str(guid).map_err(|e| Error::Internal(format!("Invalid guid '{}': {}", guid, e)))
}

/// Decode a row selected with [`SONG_COLUMNS`] (optionally prefixed by a join)
pub(crate) fn song_from_row(row: &SqliteRow) -> Result<SongRecord> {
    let guid: String = row.try_get("guid")?;
    let cast_and_crew: Option<String> = row.try_get("cast_and_crew")?;
    let cast_and_crew = cast_and_crew
        .map(|json| serde_json::from_str::<Vec<String>>(&json))
        .transpose()
        .map_err(|e| Error::Internal(format!("Corrupt cast_and_crew for {}: {}", guid, e)))?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(SongRecord {
        id: parse_guid(&guid)?,
        song: SongDraft {
            song_name: row.try_get("song_name")?,
            url: row.try_get("url")?,
            movie: row.try_get("movie")?,
            cast_and_crew,
            music: row.try_get("music")?,
            director: row.try_get("director")?,
            producer: row.try_get("producer")?,
            language: row.try_get("language")?,
            year: LooseNumber::from_columns(row.try_get("year")?, row.try_get("year_text")?),
            total_songs: LooseNumber::from_columns(
                row.try_get("total_songs")?,
                row.try_get("total_songs_text")?,
            ),
        },
        created_at,
    })
}
