use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{AdminActivity, NewActivity, TargetType};
use super::DbPool;
use crate::error::{AppError, AppResult};

pub const DEFAULT_PER_PAGE: i64 = 50;
pub const MAX_PER_PAGE: i64 = 200;

/// Append one entry to the activity log. Returns the new entry id.
pub async fn record(db: &DbPool, entry: NewActivity) -> AppResult<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let details = entry.details.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        "INSERT INTO admin_activity
            (id, user_id, user_display_name, action, target_type, target_id, target_name, timestamp, details)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&entry.user_id)
    .bind(&entry.user_display_name)
    .bind(&entry.action)
    .bind(entry.target_type.as_str())
    .bind(entry.target_id.as_deref())
    .bind(entry.target_name.as_deref())
    .bind(&now)
    .bind(details.as_deref())
    .execute(db)
    .await?;

    Ok(id)
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub target_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityPage {
    pub data: Vec<AdminActivity>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

type ActivityRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
);

/// Newest-first page of the activity log.
pub async fn list(db: &DbPool, filter: &ActivityFilter) -> AppResult<ActivityPage> {
    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let offset = (page - 1).saturating_mul(per_page);

    let mut conditions: Vec<&str> = Vec::new();
    if filter.user_id.is_some() {
        conditions.push("user_id = ?");
    }
    if filter.action.is_some() {
        conditions.push("action = ?");
    }
    if filter.target_type.is_some() {
        conditions.push("target_type = ?");
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM admin_activity {}", where_clause);
    let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
    if let Some(ref v) = filter.user_id { count_query = count_query.bind(v); }
    if let Some(ref v) = filter.action { count_query = count_query.bind(v); }
    if let Some(ref v) = filter.target_type { count_query = count_query.bind(v); }
    let (total,) = count_query.fetch_one(db).await?;

    let data_sql = format!(
        "SELECT id, user_id, user_display_name, action, target_type, target_id, target_name, timestamp, details \
         FROM admin_activity {} ORDER BY timestamp DESC, rowid DESC LIMIT ? OFFSET ?",
        where_clause
    );
    let mut data_query = sqlx::query_as::<_, ActivityRow>(&data_sql);
    if let Some(ref v) = filter.user_id { data_query = data_query.bind(v); }
    if let Some(ref v) = filter.action { data_query = data_query.bind(v); }
    if let Some(ref v) = filter.target_type { data_query = data_query.bind(v); }
    let rows = data_query.bind(per_page).bind(offset).fetch_all(db).await?;

    let data = rows
        .into_iter()
        .map(into_activity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ActivityPage { data, total, page, per_page })
}

fn into_activity(row: ActivityRow) -> AppResult<AdminActivity> {
    let (id, user_id, user_display_name, action, target_type, target_id, target_name, timestamp, details) = row;
    let target_type: TargetType = target_type
        .parse()
        .map_err(|_| AppError::Internal(format!("Activity {} has invalid target type '{}'", id, target_type)))?;
    let details: Option<serde_json::Value> = details.as_deref().map(serde_json::from_str).transpose()?;

    Ok(AdminActivity {
        id,
        user_id,
        user_display_name,
        action,
        target_type,
        target_id,
        target_name,
        timestamp,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, Role};
    use crate::db::{connect, MEMORY_PATH};
    use serde_json::json;

    fn actor(id: &str) -> Identity {
        Identity::new(id, format!("{}@beyond2c.org", id), Role::Admin)
    }

    #[tokio::test]
    async fn recorded_entry_is_listed() {
        let db = connect(MEMORY_PATH).await.unwrap();
        let entry = NewActivity::new(&actor("ayse").with_display_name("Ayşe"), "users.create", TargetType::User)
            .target("u-9", "mehmet@beyond2c.org")
            .details(json!({"role": "editor"}));
        let id = record(&db, entry).await.unwrap();

        let page = list(&db, &ActivityFilter::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let item = &page.data[0];
        assert_eq!(item.id, id);
        assert_eq!(item.user_display_name, "Ayşe");
        assert_eq!(item.target_type, TargetType::User);
        assert_eq!(item.target_name.as_deref(), Some("mehmet@beyond2c.org"));
        assert_eq!(item.details, Some(json!({"role": "editor"})));
    }

    #[tokio::test]
    async fn newest_first_with_paging() {
        let db = connect(MEMORY_PATH).await.unwrap();
        for i in 0..5 {
            record(&db, NewActivity::new(&actor("a"), format!("step-{}", i), TargetType::System))
                .await
                .unwrap();
        }

        let filter = ActivityFilter { page: Some(1), per_page: Some(2), ..Default::default() };
        let first = list(&db, &filter).await.unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.data.len(), 2);
        assert_eq!(first.data[0].action, "step-4");
        assert_eq!(first.data[1].action, "step-3");

        let filter = ActivityFilter { page: Some(3), per_page: Some(2), ..Default::default() };
        let last = list(&db, &filter).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.data[0].action, "step-0");
    }

    #[tokio::test]
    async fn filters_combine() {
        let db = connect(MEMORY_PATH).await.unwrap();
        record(&db, NewActivity::new(&actor("a"), "login", TargetType::System)).await.unwrap();
        record(&db, NewActivity::new(&actor("b"), "login", TargetType::System)).await.unwrap();
        record(&db, NewActivity::new(&actor("b"), "logout", TargetType::System)).await.unwrap();

        let filter = ActivityFilter {
            user_id: Some("b".to_string()),
            action: Some("login".to_string()),
            ..Default::default()
        };
        let page = list(&db, &filter).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].user_id, "b");

        let filter = ActivityFilter { target_type: Some("user".to_string()), ..Default::default() };
        assert_eq!(list(&db, &filter).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn paging_bounds_are_clamped() {
        let db = connect(MEMORY_PATH).await.unwrap();
        let filter = ActivityFilter { page: Some(0), per_page: Some(10_000), ..Default::default() };
        let page = list(&db, &filter).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);

        let filter = ActivityFilter { per_page: Some(0), ..Default::default() };
        assert_eq!(list(&db, &filter).await.unwrap().per_page, 1);

        let filter = ActivityFilter { page: Some(i64::MAX), per_page: Some(50), ..Default::default() };
        let far = list(&db, &filter).await.unwrap();
        assert_eq!(far.page, i64::MAX);
        assert!(far.data.is_empty());
    }
}
