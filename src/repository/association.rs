use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::category::Category;
use crate::domain::owner::OwnerKey;
use crate::domain::types::{CategoryId, OwnerId};
use crate::models::categorizable::NewCategorizable;
use crate::models::category::Category as DbCategory;
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AssociationReader, AssociationWriter, CategoryKeys, DieselRepository, OwnerFilter,
    OwnerListQuery,
};

/// Upper bound of candidate ids bound into one query, well below SQLite's
/// bound-variable limit.
const CANDIDATE_CHUNK_SIZE: usize = 10_000;

/// Candidates of `owner_type` linked to a category matching `keys`.
fn owners_matching(
    conn: &mut SqliteConnection,
    owner_type: &str,
    candidates: &[i32],
    keys: &CategoryKeys,
) -> QueryResult<HashSet<i32>> {
    use crate::schema::{categories, categorizables};

    let mut owners = HashSet::new();
    for chunk in candidates.chunks(CANDIDATE_CHUNK_SIZE) {
        let query = categorizables::table
            .inner_join(categories::table)
            .filter(categorizables::categorizable_type.eq(owner_type))
            .filter(categorizables::categorizable_id.eq_any(chunk))
            .select(categorizables::categorizable_id)
            .distinct()
            .into_boxed::<Sqlite>();

        let query = match keys {
            CategoryKeys::Slugs(slugs) => {
                let raw: Vec<&str> = slugs.iter().map(|s| s.as_str()).collect();
                query.filter(categories::slug.eq_any(raw))
            }
            CategoryKeys::Ids(ids) => {
                let raw: Vec<i32> = ids.iter().map(|id| id.get()).collect();
                query.filter(categories::id.eq_any(raw))
            }
        };

        owners.extend(query.load::<i32>(conn)?);
    }

    Ok(owners)
}

/// Candidates of `owner_type` linked to any category at all.
fn owners_with_any_category(
    conn: &mut SqliteConnection,
    owner_type: &str,
    candidates: &[i32],
) -> QueryResult<HashSet<i32>> {
    use crate::schema::categorizables;

    let mut owners = HashSet::new();
    for chunk in candidates.chunks(CANDIDATE_CHUNK_SIZE) {
        let linked = categorizables::table
            .filter(categorizables::categorizable_type.eq(owner_type))
            .filter(categorizables::categorizable_id.eq_any(chunk))
            .select(categorizables::categorizable_id)
            .distinct()
            .load::<i32>(conn)?;
        owners.extend(linked);
    }

    Ok(owners)
}

fn new_rows<'a>(owner: &'a OwnerKey, ids: impl Iterator<Item = i32>) -> Vec<NewCategorizable<'a>> {
    let now = Utc::now().naive_utc();
    ids.map(|category_id| NewCategorizable {
        categorizable_id: owner.owner_id.get(),
        categorizable_type: owner.owner_type.as_str(),
        category_id,
        created_at: now,
        updated_at: now,
    })
    .collect()
}

impl AssociationReader for DieselRepository {
    fn list_owner_categories(&self, owner: &OwnerKey) -> RepositoryResult<Vec<Category>> {
        use crate::schema::{categories, categorizables};

        let mut conn = self.conn()?;

        let items = categorizables::table
            .inner_join(categories::table)
            .filter(categorizables::categorizable_id.eq(owner.owner_id.get()))
            .filter(categorizables::categorizable_type.eq(owner.owner_type.as_str()))
            .select(DbCategory::as_select())
            .order(categories::id.asc())
            .load::<DbCategory>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Category>, _>>()?;

        Ok(items)
    }

    fn filter_owners(&self, query: &OwnerListQuery) -> RepositoryResult<Vec<OwnerId>> {
        let mut conn = self.conn()?;
        let owner_type = query.owner_type.as_str();

        let mut remaining: Vec<i32> = query.candidates.iter().map(|id| id.get()).collect();

        for filter in &query.filters {
            if remaining.is_empty() {
                break;
            }
            match filter {
                OwnerFilter::WithAll(keys) => {
                    for single in keys.singles() {
                        let matching = owners_matching(&mut conn, owner_type, &remaining, &single)?;
                        remaining.retain(|id| matching.contains(id));
                    }
                }
                OwnerFilter::WithAny(keys) => {
                    let matching = owners_matching(&mut conn, owner_type, &remaining, keys)?;
                    remaining.retain(|id| matching.contains(id));
                }
                OwnerFilter::Without(keys) => {
                    let matching = owners_matching(&mut conn, owner_type, &remaining, keys)?;
                    remaining.retain(|id| !matching.contains(id));
                }
                OwnerFilter::WithoutAny => {
                    let linked = owners_with_any_category(&mut conn, owner_type, &remaining)?;
                    remaining.retain(|id| !linked.contains(id));
                }
            }
        }

        let owners = remaining
            .into_iter()
            .map(OwnerId::try_from)
            .collect::<Result<Vec<OwnerId>, _>>()?;
        Ok(owners)
    }
}

impl AssociationWriter for DieselRepository {
    fn attach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        use crate::schema::categorizables;

        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let rows = new_rows(owner, ids.iter().map(|id| id.get()));

        let affected = diesel::insert_or_ignore_into(categorizables::table)
            .values(&rows)
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn sync_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        use crate::schema::categorizables;

        let mut conn = self.conn()?;
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();

        let affected = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let removed = diesel::delete(
                categorizables::table
                    .filter(categorizables::categorizable_id.eq(owner.owner_id.get()))
                    .filter(categorizables::categorizable_type.eq(owner.owner_type.as_str()))
                    .filter(categorizables::category_id.ne_all(&raw_ids)),
            )
            .execute(conn)?;

            if raw_ids.is_empty() {
                return Ok(removed);
            }

            let rows = new_rows(owner, raw_ids.iter().copied());
            let added = diesel::insert_or_ignore_into(categorizables::table)
                .values(&rows)
                .execute(conn)?;

            Ok(removed + added)
        })?;

        Ok(affected)
    }

    fn detach_categories(
        &self,
        owner: &OwnerKey,
        ids: &BTreeSet<CategoryId>,
    ) -> RepositoryResult<usize> {
        use crate::schema::categorizables;

        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();

        let affected = diesel::delete(
            categorizables::table
                .filter(categorizables::categorizable_id.eq(owner.owner_id.get()))
                .filter(categorizables::categorizable_type.eq(owner.owner_type.as_str()))
                .filter(categorizables::category_id.eq_any(raw_ids)),
        )
        .execute(&mut conn)?;

        Ok(affected)
    }
}
