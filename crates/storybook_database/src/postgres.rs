//! PostgreSQL implementation of the record store.

use crate::connection::PgPool;
use crate::models::{
    CharacterChangeset, CharacterRow, NewCharacterRow, NewPageRow, NewStorybookRow,
    PageChangeset, PageRow, StorybookChangeset, StorybookRow,
};
use crate::schema::{characters, pages, profiles, storybooks};
use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::upsert::excluded;
use storybook_core::{
    Character, CharacterPatch, NewCharacter, NewPage, NewStorybook, Page, PagePatch,
    PipelineState, Storybook,
};
use storybook_error::{DatabaseError, DatabaseErrorKind, StorybookResult};
use storybook_interface::{
    CategoryCount, CharacterRepository, Listing, PageRepository, StorybookFilter,
    StorybookPatch, StorybookRepository, StorybookSort, UsageLedger,
};
use tracing::instrument;

/// Record store backed by PostgreSQL through an r2d2 pool.
///
/// Diesel is synchronous, so every call checks out a connection and runs
/// on the blocking thread pool. Multi-statement writes run in a transaction.
///
/// # Example
/// ```no_run
/// use storybook_database::{PgStoryStore, establish_pool, run_migrations};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = establish_pool("postgres://localhost/storybook", 10)?;
/// run_migrations(&pool)?;
/// let store = PgStoryStore::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PgStoryStore {
    pool: PgPool,
}

impl std::fmt::Debug for PgStoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStoryStore")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl PgStoryStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run `f` with a pooled connection on the blocking thread pool.
    async fn interact<T, F>(&self, f: F) -> StorybookResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| DatabaseError::new(DatabaseErrorKind::Pool(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Task(e.to_string())))?;
        result.map_err(|e| {
            tracing::error!(error = %e, "Database operation failed");
            e.into()
        })
    }
}

/// Unique violations are conflicts; everything else keeps its default mapping.
fn write_error(err: diesel::result::Error) -> DatabaseError {
    match err {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            info,
        ) => DatabaseError::new(DatabaseErrorKind::Conflict(info.message().to_string())),
        other => other.into(),
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn filtered(filter: &StorybookFilter) -> storybooks::BoxedQuery<'static, Pg> {
    let mut query = storybooks::table.into_boxed();
    if let Some(owner) = &filter.owner {
        query = query.filter(storybooks::user_id.eq(owner.clone()));
    }
    if filter.public_only {
        query = query.filter(storybooks::is_public.eq(true));
    }
    if let Some(title) = &filter.title_query {
        query = query.filter(storybooks::title.ilike(format!("%{}%", escape_like(title))));
    }
    if let Some(category) = &filter.category {
        query = query.filter(storybooks::category.eq(category.clone()));
    }
    if !filter.tags.is_empty() {
        query = query.filter(storybooks::tags.contains(filter.tags.clone()));
    }
    query
}

fn load_storybook(conn: &mut PgConnection, id: &str) -> Result<Option<Storybook>, DatabaseError> {
    storybooks::table
        .find(id)
        .select(StorybookRow::as_select())
        .first::<StorybookRow>(conn)
        .optional()?
        .map(Storybook::try_from)
        .transpose()
}

fn storybook_missing(id: &str) -> DatabaseError {
    DatabaseError::new(DatabaseErrorKind::NotFound(format!("storybook {}", id)))
}

#[async_trait]
impl StorybookRepository for PgStoryStore {
    #[instrument(skip(self, new), fields(user_id = %new.user_id))]
    async fn create_storybook(&self, new: NewStorybook) -> StorybookResult<Storybook> {
        let row = NewStorybookRow::from_new(new)?;
        let storybook = self
            .interact(move |conn| {
                let stored: StorybookRow = diesel::insert_into(storybooks::table)
                    .values(&row)
                    .returning(StorybookRow::as_returning())
                    .get_result(conn)
                    .map_err(write_error)?;
                Storybook::try_from(stored)
            })
            .await?;
        tracing::info!(storybook_id = %storybook.id, "Created storybook");
        Ok(storybook)
    }

    #[instrument(skip(self))]
    async fn get_storybook(&self, id: &str) -> StorybookResult<Option<Storybook>> {
        let id = id.to_string();
        self.interact(move |conn| load_storybook(conn, &id)).await
    }

    #[instrument(skip(self, params))]
    async fn update_creation_params(
        &self,
        id: &str,
        expected_version: i64,
        params: &PipelineState,
    ) -> StorybookResult<Storybook> {
        let value = params.to_value()?;
        let id = id.to_string();
        self.interact(move |conn| {
            let updated = diesel::update(
                storybooks::table
                    .filter(storybooks::id.eq(&id))
                    .filter(storybooks::params_version.eq(expected_version)),
            )
            .set((
                storybooks::creation_params.eq(Some(value)),
                storybooks::params_version.eq(expected_version + 1),
                storybooks::updated_at.eq(Utc::now()),
            ))
            .returning(StorybookRow::as_returning())
            .get_result::<StorybookRow>(conn)
            .optional()?;

            match updated {
                Some(row) => Storybook::try_from(row),
                None => {
                    let exists: bool =
                        diesel::select(diesel::dsl::exists(storybooks::table.find(&id)))
                            .get_result(conn)?;
                    if exists {
                        Err(DatabaseError::new(DatabaseErrorKind::Conflict(format!(
                            "creation_params of storybook {} changed since version {}",
                            id, expected_version
                        ))))
                    } else {
                        Err(storybook_missing(&id))
                    }
                }
            }
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_storybook(
        &self,
        id: &str,
        patch: &StorybookPatch,
    ) -> StorybookResult<Storybook> {
        let changes = StorybookChangeset::from(patch);
        let id = id.to_string();
        self.interact(move |conn| {
            diesel::update(storybooks::table.find(&id))
                .set(&changes)
                .returning(StorybookRow::as_returning())
                .get_result::<StorybookRow>(conn)
                .optional()?
                .ok_or_else(|| storybook_missing(&id))
                .and_then(Storybook::try_from)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_storybook(&self, id: &str) -> StorybookResult<bool> {
        let id = id.to_string();
        let deleted = self
            .interact(move |conn| {
                Ok(diesel::delete(storybooks::table.find(&id)).execute(conn)? > 0)
            })
            .await?;
        tracing::info!(deleted, "Deleted storybook");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_storybooks(
        &self,
        filter: &StorybookFilter,
    ) -> StorybookResult<Listing<Storybook>> {
        let filter = filter.clone();
        self.interact(move |conn| {
            let total: i64 = filtered(&filter).count().get_result(conn)?;

            let query = filtered(&filter);
            let query = match filter.sort {
                StorybookSort::Latest => query.order(storybooks::created_at.desc()),
                StorybookSort::Popular => {
                    query.order((storybooks::like_count.desc(), storybooks::created_at.desc()))
                }
                StorybookSort::Viewed => {
                    query.order((storybooks::view_count.desc(), storybooks::created_at.desc()))
                }
            };
            let rows: Vec<StorybookRow> = query
                .offset(filter.offset)
                .limit(filter.limit)
                .select(StorybookRow::as_select())
                .load(conn)?;
            let items = rows
                .into_iter()
                .map(Storybook::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Listing { items, total })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn category_counts(&self) -> StorybookResult<Vec<CategoryCount>> {
        self.interact(|conn| {
            let rows: Vec<(Option<String>, i64)> = storybooks::table
                .filter(storybooks::is_public.eq(true))
                .filter(storybooks::category.is_not_null())
                .group_by(storybooks::category)
                .select((storybooks::category, diesel::dsl::count_star()))
                .load(conn)?;
            let mut counts: Vec<CategoryCount> = rows
                .into_iter()
                .filter_map(|(category, count)| category.map(|category| CategoryCount { category, count }))
                .collect();
            counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
            Ok(counts)
        })
        .await
    }
}

#[async_trait]
impl PageRepository for PgStoryStore {
    #[instrument(skip(self, pages), fields(count = pages.len()))]
    async fn insert_pages(
        &self,
        storybook_id: &str,
        pages: Vec<NewPage>,
    ) -> StorybookResult<Vec<Page>> {
        let rows: Vec<NewPageRow> = pages
            .into_iter()
            .map(|page| NewPageRow::from_new(storybook_id, page))
            .collect();
        let inserted = self
            .interact(move |conn| {
                conn.transaction::<_, DatabaseError, _>(|conn| {
                    let mut stored: Vec<PageRow> = diesel::insert_into(pages::table)
                        .values(&rows)
                        .returning(PageRow::as_returning())
                        .get_results(conn)
                        .map_err(write_error)?;
                    stored.sort_by_key(|row| row.page_number);
                    Ok(stored.into_iter().map(Page::from).collect::<Vec<_>>())
                })
                .map_err(|e| match e.kind {
                    // Deferred unique checks fire at commit as a plain query error.
                    DatabaseErrorKind::Query(ref message) if message.contains("unique") => {
                        DatabaseError::new(DatabaseErrorKind::Conflict(message.clone()))
                    }
                    _ => e,
                })
            })
            .await?;
        tracing::info!(count = inserted.len(), "Inserted pages");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn list_pages(&self, storybook_id: &str) -> StorybookResult<Vec<Page>> {
        let storybook_id = storybook_id.to_string();
        self.interact(move |conn| {
            let rows: Vec<PageRow> = pages::table
                .filter(pages::storybook_id.eq(&storybook_id))
                .order(pages::page_number.asc())
                .select(PageRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Page::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_page(&self, storybook_id: &str, page_number: i32) -> StorybookResult<Option<Page>> {
        let storybook_id = storybook_id.to_string();
        self.interact(move |conn| {
            Ok(pages::table
                .filter(pages::storybook_id.eq(&storybook_id))
                .filter(pages::page_number.eq(page_number))
                .select(PageRow::as_select())
                .first::<PageRow>(conn)
                .optional()?
                .map(Page::from))
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_page(
        &self,
        storybook_id: &str,
        page_number: i32,
        patch: &PagePatch,
    ) -> StorybookResult<Page> {
        let changes = PageChangeset::from(patch);
        let empty = patch.is_empty();
        let storybook_id = storybook_id.to_string();
        self.interact(move |conn| {
            let target = pages::table
                .filter(pages::storybook_id.eq(&storybook_id))
                .filter(pages::page_number.eq(page_number));
            let row = if empty {
                target.select(PageRow::as_select()).first::<PageRow>(conn).optional()?
            } else {
                diesel::update(target)
                    .set(&changes)
                    .returning(PageRow::as_returning())
                    .get_result::<PageRow>(conn)
                    .optional()?
            };
            row.map(Page::from).ok_or_else(|| {
                DatabaseError::new(DatabaseErrorKind::NotFound(format!(
                    "page {} of storybook {}",
                    page_number, storybook_id
                )))
            })
        })
        .await
    }

    #[instrument(skip(self, page))]
    async fn append_page(&self, storybook_id: &str, page: NewPage) -> StorybookResult<Page> {
        let storybook_id = storybook_id.to_string();
        self.interact(move |conn| {
            conn.transaction::<_, DatabaseError, _>(|conn| {
                let page_count: i32 = storybooks::table
                    .find(&storybook_id)
                    .select(storybooks::page_count)
                    .for_update()
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| storybook_missing(&storybook_id))?;

                let mut row = NewPageRow::from_new(&storybook_id, page);
                row.page_number = page_count + 1;
                let stored: PageRow = diesel::insert_into(pages::table)
                    .values(&row)
                    .returning(PageRow::as_returning())
                    .get_result(conn)
                    .map_err(write_error)?;

                diesel::update(storybooks::table.find(&storybook_id))
                    .set((
                        storybooks::page_count.eq(page_count + 1),
                        storybooks::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)?;
                Ok(Page::from(stored))
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_page(&self, storybook_id: &str, page_number: i32) -> StorybookResult<i32> {
        let storybook_id = storybook_id.to_string();
        let page_count = self
            .interact(move |conn| {
                conn.transaction::<_, DatabaseError, _>(|conn| {
                    let page_count: i32 = storybooks::table
                        .find(&storybook_id)
                        .select(storybooks::page_count)
                        .for_update()
                        .first(conn)
                        .optional()?
                        .ok_or_else(|| storybook_missing(&storybook_id))?;

                    let deleted = diesel::delete(
                        pages::table
                            .filter(pages::storybook_id.eq(&storybook_id))
                            .filter(pages::page_number.eq(page_number)),
                    )
                    .execute(conn)?;
                    if deleted == 0 {
                        return Err(DatabaseError::new(DatabaseErrorKind::NotFound(format!(
                            "page {} of storybook {}",
                            page_number, storybook_id
                        ))));
                    }

                    diesel::update(
                        pages::table
                            .filter(pages::storybook_id.eq(&storybook_id))
                            .filter(pages::page_number.gt(page_number)),
                    )
                    .set(pages::page_number.eq(pages::page_number - 1))
                    .execute(conn)?;

                    let remaining = (page_count - 1).max(0);
                    diesel::update(storybooks::table.find(&storybook_id))
                        .set((
                            storybooks::page_count.eq(remaining),
                            storybooks::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                    Ok(remaining)
                })
            })
            .await?;
        tracing::info!(page_count, "Deleted page and renumbered");
        Ok(page_count)
    }
}

#[async_trait]
impl CharacterRepository for PgStoryStore {
    #[instrument(skip(self), fields(count = ids.len()))]
    async fn get_characters(&self, ids: &[String]) -> StorybookResult<Vec<Character>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.interact(move |conn| {
            let rows: Vec<CharacterRow> = characters::table
                .filter(characters::id.eq_any(&ids))
                .select(CharacterRow::as_select())
                .load(conn)?;
            // Return in the order the ids were requested.
            let mut by_id: std::collections::HashMap<String, CharacterRow> =
                rows.into_iter().map(|row| (row.id.clone(), row)).collect();
            Ok(ids
                .iter()
                .filter_map(|id| by_id.remove(id))
                .map(Character::from)
                .collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_character(&self, id: &str) -> StorybookResult<Option<Character>> {
        let id = id.to_string();
        self.interact(move |conn| {
            Ok(characters::table
                .find(&id)
                .select(CharacterRow::as_select())
                .first::<CharacterRow>(conn)
                .optional()?
                .map(Character::from))
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_characters(
        &self,
        user_id: &str,
        include_presets: bool,
    ) -> StorybookResult<Vec<Character>> {
        let user_id = user_id.to_string();
        self.interact(move |conn| {
            let mut rows: Vec<CharacterRow> = characters::table
                .filter(characters::user_id.eq(&user_id))
                .filter(characters::is_preset.eq(false))
                .order(characters::created_at.desc())
                .select(CharacterRow::as_select())
                .load(conn)?;
            if include_presets {
                let presets: Vec<CharacterRow> = characters::table
                    .filter(characters::is_preset.eq(true))
                    .order(characters::character_name.asc())
                    .select(CharacterRow::as_select())
                    .load(conn)?;
                rows.extend(presets);
            }
            Ok(rows.into_iter().map(Character::from).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_presets(&self) -> StorybookResult<Vec<Character>> {
        self.interact(|conn| {
            let rows: Vec<CharacterRow> = characters::table
                .filter(characters::is_preset.eq(true))
                .order(characters::character_name.asc())
                .select(CharacterRow::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(Character::from).collect())
        })
        .await
    }

    #[instrument(skip(self, new))]
    async fn create_character(
        &self,
        user_id: &str,
        new: NewCharacter,
    ) -> StorybookResult<Character> {
        let row = NewCharacterRow::owned_by(user_id, new);
        self.interact(move |conn| {
            let stored: CharacterRow = diesel::insert_into(characters::table)
                .values(&row)
                .returning(CharacterRow::as_returning())
                .get_result(conn)
                .map_err(write_error)?;
            Ok(Character::from(stored))
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_character(
        &self,
        id: &str,
        patch: &CharacterPatch,
    ) -> StorybookResult<Character> {
        let changes = CharacterChangeset::from(patch);
        let id = id.to_string();
        self.interact(move |conn| {
            diesel::update(characters::table.find(&id))
                .set(&changes)
                .returning(CharacterRow::as_returning())
                .get_result::<CharacterRow>(conn)
                .optional()?
                .map(Character::from)
                .ok_or_else(|| {
                    DatabaseError::new(DatabaseErrorKind::NotFound(format!("character {}", id)))
                })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_character(&self, id: &str) -> StorybookResult<bool> {
        let id = id.to_string();
        self.interact(move |conn| {
            Ok(diesel::delete(characters::table.find(&id)).execute(conn)? > 0)
        })
        .await
    }
}

#[async_trait]
impl UsageLedger for PgStoryStore {
    #[instrument(skip(self))]
    async fn increment_credits_used(&self, user_id: &str, tokens: i64) -> StorybookResult<()> {
        let user_id = user_id.to_string();
        self.interact(move |conn| {
            diesel::insert_into(profiles::table)
                .values((
                    profiles::id.eq(&user_id),
                    profiles::credits_used.eq(tokens),
                    profiles::updated_at.eq(Utc::now()),
                ))
                .on_conflict(profiles::id)
                .do_update()
                .set((
                    profiles::credits_used.eq(profiles::credits_used + excluded(profiles::credits_used)),
                    profiles::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
