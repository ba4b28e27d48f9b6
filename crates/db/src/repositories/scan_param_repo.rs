//! Repository for the `mr_scanparams` table.

use sqlx::PgPool;
use nidb_core::mr_qa::ScanParamRange;
use nidb_core::types::DbId;

use crate::models::scan_param::ScanParamRow;

const COLUMNS: &str = "mrscanparam_id, project_id, protocol_name, sequence_name, \
    tr_min, tr_max, te_min, te_max, ti_min, ti_max, flip_min, flip_max, \
    xdim_min, xdim_max, ydim_min, ydim_max, zdim_min, zdim_max, tdim_min, tdim_max, \
    slicethickness_min, slicethickness_max, slicespacing_min, slicespacing_max, \
    bandwidth_min, bandwidth_max";

/// Value columns in the order [`bind_range`] binds them, starting at `$3`.
const VALUE_COLUMNS: &str = "protocol_name, sequence_name, \
    tr_min, tr_max, te_min, te_max, ti_min, ti_max, flip_min, flip_max, \
    xdim_min, xdim_max, ydim_min, ydim_max, zdim_min, zdim_max, tdim_min, tdim_max, \
    slicethickness_min, slicethickness_max, slicespacing_min, slicespacing_max, \
    bandwidth_min, bandwidth_max";

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

fn bind_range<'q>(query: PgQuery<'q>, range: &'q ScanParamRange) -> PgQuery<'q> {
    let mut query = query.bind(&range.protocol).bind(&range.sequence);
    for r in [
        range.tr,
        range.te,
        range.ti,
        range.flip,
        range.xdim,
        range.ydim,
        range.zdim,
        range.tdim,
        range.slice_thickness,
        range.slice_spacing,
        range.bandwidth,
    ] {
        query = query.bind(r.min).bind(r.max);
    }
    query
}

pub struct ScanParamRepo;

impl ScanParamRepo {
    /// Ranges of a project in table order.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ScanParamRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM mr_scanparams WHERE project_id = $1 ORDER BY mrscanparam_id"
        );
        sqlx::query_as::<_, ScanParamRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a range for a project, returning its ID.
    pub async fn insert(
        pool: &PgPool,
        project_id: DbId,
        range: &ScanParamRange,
    ) -> Result<DbId, sqlx::Error> {
        let placeholders = (2..=25).map(|n| format!("${n}")).collect::<Vec<_>>().join(", ");
        let query = format!(
            "INSERT INTO mr_scanparams (project_id, {VALUE_COLUMNS})
             VALUES ($1, {placeholders})
             RETURNING mrscanparam_id"
        );
        let q = sqlx::query(&query).bind(project_id);
        let row = bind_range(q, range).fetch_one(pool).await?;
        sqlx::Row::try_get(&row, "mrscanparam_id")
    }

    /// Overwrite a range row of a project. Returns `false` if no such row.
    pub async fn update(
        pool: &PgPool,
        project_id: DbId,
        id: DbId,
        range: &ScanParamRange,
    ) -> Result<bool, sqlx::Error> {
        let assignments = VALUE_COLUMNS
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(i, col)| format!("{col} = ${}", i + 3))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "UPDATE mr_scanparams SET {assignments}
             WHERE project_id = $1 AND mrscanparam_id = $2"
        );
        let q = sqlx::query(&query).bind(project_id).bind(id);
        let result = bind_range(q, range).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a range row of a project. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, project_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM mr_scanparams WHERE project_id = $1 AND mrscanparam_id = $2")
                .bind(project_id)
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
