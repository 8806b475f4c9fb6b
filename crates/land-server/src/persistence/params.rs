//! Parameter persistence.

use anyhow::{bail, Result};
use land_core::ParamValue;
use sqlx::{Sqlite, SqlitePool, Transaction};

#[derive(sqlx::FromRow)]
struct ParamRow {
    name: String,
    kind: String,
    int_value: Option<i64>,
    float_value: Option<f64>,
}

impl ParamRow {
    fn into_param(self) -> Result<(String, ParamValue)> {
        let value = match (self.kind.as_str(), self.int_value, self.float_value) {
            ("int", Some(v), _) => ParamValue::Int(i32::try_from(v)?),
            ("float", _, Some(v)) => ParamValue::Float(v as f32),
            (kind, _, _) => bail!("parameter {} has malformed {} row", self.name, kind),
        };
        Ok((self.name, value))
    }
}

/// Upsert a parameter inside an open transaction.
pub async fn upsert_param_tx(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
    value: ParamValue,
) -> Result<()> {
    let (kind, int_value, float_value) = match value {
        ParamValue::Int(v) => ("int", Some(i64::from(v)), None),
        ParamValue::Float(v) => ("float", None, Some(f64::from(v))),
    };

    sqlx::query(
        r#"
        INSERT INTO params (name, kind, int_value, float_value, updated_at)
        VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
        ON CONFLICT(name) DO UPDATE SET
            kind = ?2,
            int_value = ?3,
            float_value = ?4,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(name)
    .bind(kind)
    .bind(int_value)
    .bind(float_value)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Load all persisted parameters, skipping malformed rows.
pub async fn load_all_params(pool: &SqlitePool) -> Result<Vec<(String, ParamValue)>> {
    let rows = sqlx::query_as::<_, ParamRow>(
        "SELECT name, kind, int_value, float_value FROM params",
    )
    .fetch_all(pool)
    .await?;

    let mut params = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_param() {
            Ok(param) => params.push(param),
            Err(err) => tracing::warn!("Ignoring stored parameter: {}", err),
        }
    }
    Ok(params)
}
