// ABOUTME: Body composition entry upsert/query, keyed by vendor sample timestamp
// ABOUTME: Grounded on spec.md §4.7 BODY_COMPOSITION per-measurement-entry contract
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use crate::models::BodyCompositionEntry;
use crate::store::Store;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::Row;

impl Store {
    /// Merge on `(user_id, timestamp_gmt)` — the vendor's sample primary key
    /// (spec.md §4.7); `store_if_not_exists` semantics, since a range refetch
    /// returns already-stored measurements verbatim.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn store_body_composition(&self, entry: &BodyCompositionEntry) -> SyncResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO body_composition (
                user_id, measurement_date, timestamp_gmt, weight_grams, bmi, body_fat_pct,
                body_water_pct, bone_mass_g, muscle_mass_g, visceral_fat, metabolic_age,
                physique_rating, source_type
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id)
        .bind(entry.measurement_date.to_string())
        .bind(entry.timestamp_gmt.to_rfc3339())
        .bind(entry.weight_grams)
        .bind(entry.bmi)
        .bind(entry.body_fat_pct)
        .bind(entry.body_water_pct)
        .bind(entry.bone_mass_g)
        .bind(entry.muscle_mass_g)
        .bind(entry.visceral_fat)
        .bind(entry.metabolic_age)
        .bind(&entry.physique_rating)
        .bind(&entry.source_type)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn body_composition_exists(
        &self,
        user_id: i64,
        timestamp_gmt: DateTime<Utc>,
    ) -> SyncResult<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM body_composition WHERE user_id = ? AND timestamp_gmt = ?",
        )
        .bind(user_id)
        .bind(timestamp_gmt.to_rfc3339())
        .fetch_one(self.pool())
        .await?;
        Ok(row.0 > 0)
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_body_composition(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SyncResult<Vec<BodyCompositionEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM body_composition
             WHERE user_id = ? AND measurement_date >= ? AND measurement_date <= ?
             ORDER BY timestamp_gmt",
        )
        .bind(user_id)
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_entry).collect()
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> SyncResult<BodyCompositionEntry> {
    let measurement_date: String = row.try_get("measurement_date")?;
    let timestamp_gmt: String = row.try_get("timestamp_gmt")?;
    Ok(BodyCompositionEntry {
        user_id: row.try_get("user_id")?,
        measurement_date: measurement_date.parse().map_err(crate::errors::SyncError::from)?,
        timestamp_gmt: DateTime::parse_from_rfc3339(&timestamp_gmt)
            .map_err(crate::errors::SyncError::from)?
            .with_timezone(&Utc),
        weight_grams: row.try_get("weight_grams")?,
        bmi: row.try_get("bmi")?,
        body_fat_pct: row.try_get("body_fat_pct")?,
        body_water_pct: row.try_get("body_water_pct")?,
        bone_mass_g: row.try_get("bone_mass_g")?,
        muscle_mass_g: row.try_get("muscle_mass_g")?,
        visceral_fat: row.try_get("visceral_fat")?,
        metabolic_age: row.try_get("metabolic_age")?,
        physique_rating: row.try_get("physique_rating")?,
        source_type: row.try_get("source_type")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_if_not_exists_does_not_duplicate() {
        let store = Store::connect_in_memory().await.unwrap();
        let entry = BodyCompositionEntry {
            user_id: 1,
            measurement_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            timestamp_gmt: DateTime::from_timestamp(1_767_225_600, 0).unwrap(),
            weight_grams: Some(72_000),
            bmi: Some(22.0),
            body_fat_pct: None,
            body_water_pct: None,
            bone_mass_g: None,
            muscle_mass_g: None,
            visceral_fat: None,
            metabolic_age: None,
            physique_rating: None,
            source_type: Some("INDEX_SCALE".into()),
        };
        store.store_body_composition(&entry).await.unwrap();
        store.store_body_composition(&entry).await.unwrap();

        let rows = store
            .get_body_composition(1, entry.measurement_date, entry.measurement_date)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
