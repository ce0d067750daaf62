//! In-process backend holding JSON rows per table.
//!
//! Mirrors the semantics the dashboard relies on from the hosted store:
//! equality filters, single-column ordering with PostgreSQL null placement,
//! limits, exact counts, parent embedding, primary-key conflicts and
//! cascading deletes. Failures can be injected per table and for remote
//! functions.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{Backend, BackendError, Direction, Embed, Filter, Query, Selection};

/// A recorded remote function call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Function name.
    pub function: String,
    /// Query parameters.
    pub params: Vec<(String, String)>,
    /// JSON body.
    pub body: Value,
}

/// Delete rule: removing a `parent` row removes `child` rows whose
/// `child_key` equals the parent's `key`.
#[derive(Debug, Clone)]
struct Cascade {
    parent: String,
    key: String,
    child: String,
    child_key: String,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    unavailable: HashSet<String>,
    function_failure: Option<u16>,
    invocations: Vec<Invocation>,
}

/// Backend keeping every table in memory behind a [`RwLock`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<State>,
    primary_keys: HashMap<String, String>,
    cascades: Vec<Cascade>,
}

impl MemoryBackend {
    /// Creates an empty backend with no keys and no cascades.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend shaped like the fleet schema: `projects` keyed by
    /// `project_id`, `devices` keyed by `device_id`, and deletes cascading
    /// from projects to devices, samples and models.
    #[must_use]
    pub fn fleet() -> Self {
        Self::new()
            .with_primary_key("projects", "project_id")
            .with_primary_key("devices", "device_id")
            .with_cascade("projects", "project_id", "devices", "project_id")
            .with_cascade("projects", "project_id", "wp_samples", "project_id")
            .with_cascade("projects", "project_id", "ml_models", "project_id")
            .with_cascade("devices", "device_id", "wp_samples", "device_id")
    }

    /// Declares `column` as the unique key of `table`.
    #[must_use]
    pub fn with_primary_key(mut self, table: &str, column: &str) -> Self {
        self.primary_keys
            .insert(table.to_string(), column.to_string());
        self
    }

    /// Declares a cascading delete from `parent` to `child`.
    #[must_use]
    pub fn with_cascade(mut self, parent: &str, key: &str, child: &str, child_key: &str) -> Self {
        self.cascades.push(Cascade {
            parent: parent.to_string(),
            key: key.to_string(),
            child: child.to_string(),
            child_key: child_key.to_string(),
        });
        self
    }

    /// Appends rows to `table`, bypassing key checks.
    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut state = self.state.write().await;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    /// Returns a snapshot of every row in `table`, in insertion order.
    pub async fn rows(&self, table: &str) -> Vec<Value> {
        let state = self.state.read().await;
        state.tables.get(table).cloned().unwrap_or_default()
    }

    /// Makes every call touching `table` fail (or succeed again).
    pub async fn set_unavailable(&self, table: &str, unavailable: bool) {
        let mut state = self.state.write().await;
        if unavailable {
            state.unavailable.insert(table.to_string());
        } else {
            state.unavailable.remove(table);
        }
    }

    /// Makes every function invocation answer with `status` (`None` for
    /// success).
    pub async fn fail_functions(&self, status: Option<u16>) {
        self.state.write().await.function_failure = status;
    }

    /// Returns every function invocation attempted so far.
    pub async fn invocations(&self) -> Vec<Invocation> {
        self.state.read().await.invocations.clone()
    }
}

fn unavailable(state: &State, table: &str) -> Result<(), BackendError> {
    if state.unavailable.contains(table) {
        return Err(BackendError::Rejected {
            status: 503,
            message: format!("relation \"{table}\" is unavailable"),
        });
    }
    Ok(())
}

/// Textual form of a scalar, as used by equality filters. Null has none.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| row.get(&f.column).and_then(text_of).as_deref() == Some(f.value.as_str()))
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => text_of(a).cmp(&text_of(b)),
    }
}

fn compare_rows(a: &Value, b: &Value, column: &str, direction: Direction) -> Ordering {
    let present = |row: &Value| row.get(column).filter(|v| !v.is_null()).cloned();
    let descending = direction == Direction::Descending;
    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) if descending => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) if descending => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = compare_present(&x, &y);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
    }
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns {
        if let Some(value) = row.get(column) {
            out.insert(column.clone(), value.clone());
        }
    }
    Value::Object(out)
}

fn embed_parent(state: &State, row: &mut Value, embed: &Embed) {
    let key = row.get(&embed.key).and_then(text_of);
    let parent = key.and_then(|key| {
        state.tables.get(&embed.table).and_then(|parents| {
            parents
                .iter()
                .find(|p| p.get(&embed.key).and_then(text_of).as_deref() == Some(key.as_str()))
        })
    });
    let embedded = parent.map_or(Value::Null, |p| project(p, &embed.columns));
    if let Value::Object(map) = row {
        map.insert(embed.table.clone(), embedded);
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, query: &Query) -> Result<Selection, BackendError> {
        let state = self.state.read().await;
        unavailable(&state, &query.table)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| compare_rows(a, b, &order.column, order.direction));
        }

        let total = query.count.then_some(rows.len() as u64);
        if query.head {
            return Ok(Selection {
                rows: Vec::new(),
                total,
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }

        let rows = rows
            .iter()
            .map(|row| {
                let mut projected = project(row, &query.columns);
                if let Some(embed) = &query.embed {
                    embed_parent(&state, &mut projected, embed);
                }
                projected
            })
            .collect();
        Ok(Selection { rows, total })
    }

    async fn insert(&self, table: &str, row: &Value) -> Result<Value, BackendError> {
        let mut state = self.state.write().await;
        unavailable(&state, table)?;
        if !row.is_object() {
            return Err(BackendError::Rejected {
                status: 400,
                message: "row must be a JSON object".to_string(),
            });
        }

        if let Some(pk) = self.primary_keys.get(table) {
            let Some(key) = row.get(pk).and_then(text_of) else {
                return Err(BackendError::Rejected {
                    status: 400,
                    message: format!("null value in column \"{pk}\" violates not-null constraint"),
                });
            };
            let taken = state.tables.get(table).is_some_and(|rows| {
                rows.iter()
                    .any(|r| r.get(pk).and_then(text_of).as_deref() == Some(key.as_str()))
            });
            if taken {
                return Err(BackendError::Rejected {
                    status: 409,
                    message: format!(
                        "duplicate key value violates unique constraint \"{table}_pkey\""
                    ),
                });
            }
        }

        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row.clone())
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<u64, BackendError> {
        let mut state = self.state.write().await;
        unavailable(&state, table)?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::Rejected {
                status: 400,
                message: "patch must be a JSON object".to_string(),
            });
        };

        let mut changed = 0;
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, filters)) {
                if let Value::Object(map) = row {
                    for (k, v) in patch {
                        map.insert(k.clone(), v.clone());
                    }
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let mut state = self.state.write().await;
        unavailable(&state, table)?;

        let removed: Vec<Value> = match state.tables.get_mut(table) {
            Some(rows) => {
                let (gone, kept): (Vec<Value>, Vec<Value>) =
                    rows.drain(..).partition(|row| matches(row, filters));
                *rows = kept;
                gone
            }
            None => Vec::new(),
        };
        let count = removed.len() as u64;

        let mut pending = vec![(table.to_string(), removed)];
        while let Some((parent, rows)) = pending.pop() {
            for cascade in self.cascades.iter().filter(|c| c.parent == parent) {
                let keys: HashSet<String> = rows
                    .iter()
                    .filter_map(|r| r.get(&cascade.key).and_then(text_of))
                    .collect();
                if keys.is_empty() {
                    continue;
                }
                if let Some(children) = state.tables.get_mut(&cascade.child) {
                    let (gone, kept): (Vec<Value>, Vec<Value>) =
                        children.drain(..).partition(|row| {
                            row.get(&cascade.child_key)
                                .and_then(text_of)
                                .is_some_and(|k| keys.contains(&k))
                        });
                    *children = kept;
                    if !gone.is_empty() {
                        pending.push((cascade.child.clone(), gone));
                    }
                }
            }
        }

        Ok(count)
    }

    async fn invoke(
        &self,
        function: &str,
        params: &[(String, String)],
        body: &Value,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        state.invocations.push(Invocation {
            function: function.to_string(),
            params: params.to_vec(),
            body: body.clone(),
        });
        match state.function_failure {
            Some(status) => Err(BackendError::Function {
                name: function.to_string(),
                status,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn seeded() -> MemoryBackend {
        let backend = MemoryBackend::fleet();
        backend
            .seed(
                "projects",
                vec![
                    json!({"project_id": "WP01", "project_name": "Tanks", "project_type": "water_pump", "created_at": "2024-01-01T00:00:00Z"}),
                    json!({"project_id": "SL01", "project_name": "Lights", "project_type": "smart_light", "created_at": "2024-01-02T00:00:00Z"}),
                ],
            )
            .await;
        backend
            .seed(
                "devices",
                vec![
                    json!({"device_id": "WP01-D001", "project_id": "WP01", "updated_at": "2024-02-01T00:00:00Z"}),
                    json!({"device_id": "WP01-D002", "project_id": "WP01", "updated_at": null}),
                    json!({"device_id": "SL01-D001", "project_id": "SL01", "updated_at": "2024-03-01T00:00:00Z"}),
                ],
            )
            .await;
        backend
            .seed(
                "wp_samples",
                vec![
                    json!({"project_id": "WP01", "device_id": "WP01-D001", "ts_utc": "2024-02-01T00:00:00Z"}),
                    json!({"project_id": "WP01", "device_id": "WP01-D002", "ts_utc": "2024-02-02T00:00:00Z"}),
                ],
            )
            .await;
        backend
    }

    fn ids(rows: &[Value], key: &str) -> Vec<String> {
        rows.iter()
            .filter_map(|r| r.get(key).and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn descending_order_puts_nulls_first() {
        let backend = seeded().await;
        let Ok(selection) = backend
            .select(&Query::table("devices").order_desc("updated_at"))
            .await
        else {
            panic!("select failed");
        };
        assert_eq!(
            ids(&selection.rows, "device_id"),
            vec!["WP01-D002", "SL01-D001", "WP01-D001"]
        );
    }

    #[tokio::test]
    async fn count_ignores_limit() {
        let backend = seeded().await;
        let query = Query::table("devices")
            .eq("project_id", "WP01")
            .limit(1)
            .with_count();
        let Ok(selection) = backend.select(&query).await else {
            panic!("select failed");
        };
        assert_eq!(selection.rows.len(), 1);
        assert_eq!(selection.total, Some(2));
    }

    #[tokio::test]
    async fn head_returns_no_rows() {
        let backend = seeded().await;
        let Ok(selection) = backend
            .select(&Query::table("devices").eq("project_id", "SL01").head())
            .await
        else {
            panic!("select failed");
        };
        assert!(selection.rows.is_empty());
        assert_eq!(selection.total, Some(1));
    }

    #[tokio::test]
    async fn embed_attaches_parent_projection() {
        let backend = seeded().await;
        let query = Query::table("devices")
            .eq("device_id", "SL01-D001")
            .embed("projects", "project_id", &["project_name"]);
        let Ok(selection) = backend.select(&query).await else {
            panic!("select failed");
        };
        let Some(row) = selection.rows.first() else {
            panic!("expected a row");
        };
        assert_eq!(row["projects"], json!({"project_name": "Lights"}));
    }

    #[tokio::test]
    async fn duplicate_primary_key_is_a_conflict() {
        let backend = seeded().await;
        let result = backend
            .insert("projects", &json!({"project_id": "WP01", "project_name": "Again"}))
            .await;
        let Err(BackendError::Rejected { status, .. }) = result else {
            panic!("expected conflict, got {result:?}");
        };
        assert_eq!(status, 409);
    }

    #[tokio::test]
    async fn update_reports_changed_rows() {
        let backend = seeded().await;
        let filters = [Filter::eq("device_id", "WP01-D001")];
        let changed = backend
            .update("devices", &filters, &json!({"role": "beta"}))
            .await;
        tokio_test::assert_ok!(&changed);
        assert_eq!(changed, Ok(1));

        let missing = backend
            .update("devices", &[Filter::eq("device_id", "nope")], &json!({"role": "beta"}))
            .await;
        assert_eq!(missing, Ok(0));
    }

    #[tokio::test]
    async fn project_delete_cascades_to_devices_and_samples() {
        let backend = seeded().await;
        let removed = backend
            .delete("projects", &[Filter::eq("project_id", "WP01")])
            .await;
        assert_eq!(removed, Ok(1));

        assert_eq!(ids(&backend.rows("projects").await, "project_id"), vec!["SL01"]);
        assert_eq!(ids(&backend.rows("devices").await, "device_id"), vec!["SL01-D001"]);
        assert!(backend.rows("wp_samples").await.is_empty());
    }

    #[tokio::test]
    async fn unavailable_table_rejects_reads() {
        let backend = seeded().await;
        backend.set_unavailable("devices", true).await;
        let result = backend.select(&Query::table("devices")).await;
        tokio_test::assert_err!(&result);

        backend.set_unavailable("devices", false).await;
        tokio_test::assert_ok!(backend.select(&Query::table("devices")).await);
    }

    #[tokio::test]
    async fn invocations_are_recorded_even_when_failing() {
        let backend = MemoryBackend::new();
        backend.fail_functions(Some(500)).await;
        let result = backend
            .invoke("esp32-switch", &[], &json!({"manual_switch": 1}))
            .await;
        tokio_test::assert_err!(result);
        assert_eq!(backend.invocations().await.len(), 1);
    }
}
