//! Lead table operations

use chrono::Utc;
use leads_common::db::{Lead, NewLead};
use leads_common::Result;
use sqlx::{Executor, Sqlite, SqlitePool};

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct LeadUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    pub country_code: Option<String>,
    pub company_name: Option<String>,
}

/// Ids bound per `IN (...)` statement
const CHUNK_SIZE: usize = 500;

/// `?, ?, ?` for an `IN (...)` clause
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Insert a lead and return the stored row
///
/// Generic over the executor so the CSV import can insert inside its
/// transaction.
pub async fn insert_lead<'e, E>(executor: E, lead: &NewLead) -> Result<Lead>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();

    let created = sqlx::query_as::<_, Lead>(
        r#"
        INSERT INTO leads (
            first_name, last_name, email, job_title,
            country_code, company_name, gender,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.email)
    .bind(&lead.job_title)
    .bind(&lead.country_code)
    .bind(&lead.company_name)
    .bind(&lead.gender)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(created)
}

/// All leads, oldest first
pub async fn list_leads(pool: &SqlitePool) -> Result<Vec<Lead>> {
    let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY id ASC")
        .fetch_all(pool)
        .await?;
    Ok(leads)
}

pub async fn get_lead(pool: &SqlitePool, id: i64) -> Result<Option<Lead>> {
    let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(lead)
}

/// Leads whose id is in `ids` (missing ids are simply absent)
///
/// Queried in chunks so any number of ids stays under SQLite's
/// bound-parameter limit.
pub async fn find_leads_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<Lead>> {
    let mut found = Vec::new();

    for chunk in ids.chunks(CHUNK_SIZE) {
        let sql = format!(
            "SELECT * FROM leads WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query_as::<_, Lead>(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        found.extend(query.fetch_all(pool).await?);
    }

    found.sort_by_key(|lead| lead.id);
    found.dedup_by_key(|lead| lead.id);
    Ok(found)
}

/// Apply a partial update; returns `None` when the lead does not exist
pub async fn update_lead(pool: &SqlitePool, id: i64, update: &LeadUpdate) -> Result<Option<Lead>> {
    let updated = sqlx::query_as::<_, Lead>(
        r#"
        UPDATE leads SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            email = COALESCE(?, email),
            job_title = COALESCE(?, job_title),
            country_code = COALESCE(?, country_code),
            company_name = COALESCE(?, company_name),
            updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&update.first_name)
    .bind(&update.last_name)
    .bind(&update.email)
    .bind(&update.job_title)
    .bind(&update.country_code)
    .bind(&update.company_name)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(updated)
}

/// Returns whether a row was deleted
pub async fn delete_lead(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM leads WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every lead in `ids`; returns the number of rows that existed
///
/// All chunks run in one transaction, so the delete is all-or-nothing.
pub async fn delete_leads(pool: &SqlitePool, ids: &[i64]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut deleted = 0;

    for chunk in ids.chunks(CHUNK_SIZE) {
        let sql = format!("DELETE FROM leads WHERE id IN ({})", placeholders(chunk.len()));
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id);
        }
        deleted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(deleted)
}

pub async fn set_message(pool: &SqlitePool, id: i64, message: &str) -> Result<()> {
    sqlx::query("UPDATE leads SET message = ?, updated_at = ? WHERE id = ?")
        .bind(message)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_gender(pool: &SqlitePool, id: i64, gender: &str) -> Result<()> {
    sqlx::query("UPDATE leads SET gender = ?, updated_at = ? WHERE id = ?")
        .bind(gender)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// (first_name, last_name) of every stored lead
pub async fn load_name_pairs(pool: &SqlitePool) -> Result<Vec<(String, Option<String>)>> {
    let pairs = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT first_name, last_name FROM leads",
    )
    .fetch_all(pool)
    .await?;
    Ok(pairs)
}

/// Point `lead_ids` at the import report that created them
///
/// Chunked like the bulk lookups.
pub async fn link_to_import_report(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    report_id: i64,
    lead_ids: &[i64],
) -> Result<()> {
    for chunk in lead_ids.chunks(CHUNK_SIZE) {
        let sql = format!(
            "UPDATE leads SET import_report_id = ? WHERE id IN ({})",
            placeholders(chunk.len())
        );
        let mut query = sqlx::query(&sql).bind(report_id);
        for id in chunk {
            query = query.bind(id);
        }
        query.execute(&mut **tx).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use leads_common::db::init_memory_database;

    fn new_lead(first: &str, last: Option<&str>) -> NewLead {
        NewLead {
            first_name: first.to_string(),
            last_name: last.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = init_memory_database().await.unwrap();

        let created = insert_lead(&pool, &new_lead("Ada", Some("Lovelace"))).await.unwrap();
        let fetched = get_lead(&pool, created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.first_name, "Ada");
        assert!(fetched.import_report_id.is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_unset_columns() {
        let pool = init_memory_database().await.unwrap();
        let mut lead = new_lead("Ada", Some("Lovelace"));
        lead.email = Some("ada@example.com".to_string());
        let created = insert_lead(&pool, &lead).await.unwrap();

        let update = LeadUpdate {
            job_title: Some("Engineer".to_string()),
            ..Default::default()
        };
        let updated = update_lead(&pool, created.id, &update).await.unwrap().unwrap();

        assert_eq!(updated.job_title.as_deref(), Some("Engineer"));
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));
        assert_eq!(updated.last_name.as_deref(), Some("Lovelace"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_lead_returns_none() {
        let pool = init_memory_database().await.unwrap();
        let result = update_lead(&pool, 42, &LeadUpdate::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_leads_counts_existing_rows_only() {
        let pool = init_memory_database().await.unwrap();
        let a = insert_lead(&pool, &new_lead("A", None)).await.unwrap();
        let b = insert_lead(&pool, &new_lead("B", None)).await.unwrap();

        let deleted = delete_leads(&pool, &[a.id, b.id, 9999]).await.unwrap();

        assert_eq!(deleted, 2);
        assert!(list_leads(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_operations_past_parameter_limit() {
        let pool = init_memory_database().await.unwrap();
        let kept = insert_lead(&pool, &new_lead("Keep", None)).await.unwrap();
        let doomed = insert_lead(&pool, &new_lead("Doomed", None)).await.unwrap();

        // More ids than SQLite accepts as bound parameters in one statement
        let mut ids: Vec<i64> = (100_000..140_000).collect();
        ids.push(doomed.id);
        ids.push(doomed.id);

        let found = find_leads_by_ids(&pool, &ids).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, doomed.id);

        assert_eq!(delete_leads(&pool, &ids).await.unwrap(), 1);
        let remaining = list_leads(&pool).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, kept.id);
    }

    #[tokio::test]
    async fn test_find_leads_by_ids() {
        let pool = init_memory_database().await.unwrap();
        let a = insert_lead(&pool, &new_lead("A", None)).await.unwrap();
        insert_lead(&pool, &new_lead("B", None)).await.unwrap();

        let found = find_leads_by_ids(&pool, &[a.id, 777]).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
        assert!(find_leads_by_ids(&pool, &[]).await.unwrap().is_empty());
    }
}
