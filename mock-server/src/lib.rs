use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const LOCATION_GROUP_HEADER: &str = "x-location-group";
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const RATELIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Value reported in `X-Ratelimit-Remaining`; the stub never throttles.
pub const RATELIMIT_REMAINING: u32 = 1000;

/// Articles keyed by location group, then by `articleId`.
pub type Db = Arc<RwLock<HashMap<String, BTreeMap<String, Value>>>>;

type Failure = (StatusCode, Json<Value>);

#[derive(Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/knowledge/articles", get(list_articles).post(create_article))
        .route(
            "/knowledge/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/knowledge/tags", get(list_tags))
        .layer(middleware::map_response(add_ratelimit_header))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn add_ratelimit_header(mut response: Response) -> Response {
    response.headers_mut().insert(
        RATELIMIT_REMAINING_HEADER,
        HeaderValue::from(RATELIMIT_REMAINING),
    );
    response
}

fn failure(status: StatusCode, message: impl Into<String>) -> Failure {
    (status, Json(json!({ "error": message.into() })))
}

fn location_group(headers: &HeaderMap) -> Result<String, Failure> {
    headers
        .get(LOCATION_GROUP_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| failure(StatusCode::BAD_REQUEST, "missing x-location-group header"))
}

fn not_found(id: &str) -> Failure {
    failure(StatusCode::NOT_FOUND, format!("article {id} not found"))
}

/// Parse the `filter` query value into field criteria.
pub fn parse_filter(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("filter must be a JSON object".to_string()),
        Err(e) => Err(format!("filter is not valid JSON: {e}")),
    }
}

/// Each criterion must equal the article's field; an array field matches
/// when it contains the (non-array) criterion.
pub fn matches_filter(article: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(field, expected)| match article.get(field) {
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
        None => false,
    })
}

async fn list_articles(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, Failure> {
    let group = location_group(&headers)?;
    let filter = match query.filter.as_deref() {
        Some(raw) => parse_filter(raw).map_err(|e| failure(StatusCode::BAD_REQUEST, e))?,
        None => Map::new(),
    };
    let db = db.read().await;
    let articles: Vec<Value> = db
        .get(&group)
        .into_iter()
        .flat_map(|articles| articles.values())
        .filter(|article| matches_filter(article, &filter))
        .cloned()
        .collect();
    debug!(%group, count = articles.len(), "listed articles");
    Ok((
        [(TOTAL_COUNT_HEADER, articles.len().to_string())],
        Json(articles),
    ))
}

async fn create_article(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> Result<(StatusCode, Json<Value>), Failure> {
    let group = location_group(&headers)?;
    let Value::Object(mut article) = input else {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "article must be a JSON object",
        ));
    };
    let id = match article.get("articleId") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => Uuid::new_v4().to_string(),
    };
    article.insert("articleId".to_string(), Value::String(id.clone()));

    let mut db = db.write().await;
    let articles = db.entry(group).or_default();
    if articles.contains_key(&id) {
        return Err(failure(
            StatusCode::CONFLICT,
            format!("article {id} already exists"),
        ));
    }
    let article = Value::Object(article);
    articles.insert(id, article.clone());
    Ok((StatusCode::CREATED, Json(article)))
}

async fn get_article(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let group = location_group(&headers)?;
    let db = db.read().await;
    db.get(&group)
        .and_then(|articles| articles.get(&id))
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

async fn update_article(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, Failure> {
    let group = location_group(&headers)?;
    let Value::Object(mut article) = input else {
        return Err(failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            "article must be a JSON object",
        ));
    };
    let mut db = db.write().await;
    let stored = db
        .get_mut(&group)
        .and_then(|articles| articles.get_mut(&id))
        .ok_or_else(|| not_found(&id))?;
    article.insert("articleId".to_string(), Value::String(id));
    *stored = Value::Object(article);
    Ok(Json(stored.clone()))
}

async fn delete_article(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, Failure> {
    let group = location_group(&headers)?;
    let mut db = db.write().await;
    db.get_mut(&group)
        .and_then(|articles| articles.remove(&id))
        .map(|_| Json(json!({ "articleId": id, "deleted": true })))
        .ok_or_else(|| not_found(&id))
}

async fn list_tags(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<String>>, Failure> {
    let group = location_group(&headers)?;
    let db = db.read().await;
    let tags: BTreeSet<String> = db
        .get(&group)
        .into_iter()
        .flat_map(|articles| articles.values())
        .filter_map(|article| article.get("tags").and_then(Value::as_array))
        .flatten()
        .filter_map(|tag| tag.as_str().map(str::to_string))
        .collect();
    Ok(Json(tags.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(raw: &str) -> Map<String, Value> {
        parse_filter(raw).unwrap()
    }

    #[test]
    fn filter_must_be_object() {
        assert!(parse_filter(r#"{"status":"published"}"#).is_ok());
        assert!(parse_filter(r#"["status"]"#).is_err());
        assert!(parse_filter("status=published").is_err());
    }

    #[test]
    fn scalar_fields_match_by_equality() {
        let article = json!({"articleId": "a1", "status": "published", "views": 3});
        assert!(matches_filter(&article, &criteria(r#"{"status":"published"}"#)));
        assert!(matches_filter(&article, &criteria(r#"{"status":"published","views":3}"#)));
        assert!(!matches_filter(&article, &criteria(r#"{"status":"draft"}"#)));
    }

    #[test]
    fn missing_field_never_matches() {
        let article = json!({"articleId": "a1"});
        assert!(!matches_filter(&article, &criteria(r#"{"status":"published"}"#)));
    }

    #[test]
    fn array_field_matches_contained_value() {
        let article = json!({"tags": ["rust", "http"]});
        assert!(matches_filter(&article, &criteria(r#"{"tags":"rust"}"#)));
        assert!(!matches_filter(&article, &criteria(r#"{"tags":"php"}"#)));
        assert!(matches_filter(&article, &criteria(r#"{"tags":["rust","http"]}"#)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(matches_filter(&json!({}), &Map::new()));
    }
}
