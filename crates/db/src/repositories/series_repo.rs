//! Repository for the per-modality `{modality}_series` tables.
//!
//! Table and ID column names come from a validated [`Modality`]; callers
//! that take a modality from stored data should confirm the table exists
//! with [`SeriesRepo::table_exists`] first.

use sqlx::PgPool;
use nidb_core::modality::Modality;
use nidb_core::types::DbId;

use crate::models::series::{
    CreateMrParams, CreateSeries, MrSeries, Series, SeriesListRow, SeriesName,
};

const MR_COLUMNS: &str = "mrseries_id, study_id, series_num, series_desc, series_protocol, \
    series_sequencename, series_tr, series_te, series_ti, series_flip, dimx, dimy, dimz, dimt, \
    slicethickness, slicespacing, bandwidth";

/// Columns shared by every series table, with the ID aliased.
fn series_columns(modality: &Modality) -> String {
    format!(
        "{} AS series_id, study_id, series_num, series_datetime, series_desc, series_protocol, \
         series_altdesc, data_type, numfiles, numfiles_beh, series_size, ishidden",
        modality.series_id_column()
    )
}

/// Studies of a project, as a subquery.
const PROJECT_STUDIES: &str = "SELECT st.study_id FROM studies st
    JOIN enrollment e ON e.enrollment_id = st.enrollment_id
    WHERE e.project_id = $1";

pub struct SeriesRepo;

impl SeriesRepo {
    /// Whether `{modality}_series` exists in the current schema.
    pub async fn table_exists(pool: &PgPool, modality: &Modality) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
             )",
        )
        .bind(modality.series_table())
        .fetch_one(pool)
        .await
    }

    /// Insert a series into its modality table, returning the new ID.
    pub async fn create(
        pool: &PgPool,
        modality: &Modality,
        input: &CreateSeries,
    ) -> Result<DbId, sqlx::Error> {
        let query = format!(
            "INSERT INTO {table} (study_id, series_num, series_datetime, series_desc,
                                  series_protocol, data_type, numfiles, series_size, ishidden)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {id}",
            table = modality.series_table(),
            id = modality.series_id_column(),
        );
        sqlx::query_scalar(&query)
            .bind(input.study_id)
            .bind(input.series_num)
            .bind(input.series_datetime)
            .bind(&input.series_desc)
            .bind(&input.series_protocol)
            .bind(&input.data_type)
            .bind(input.numfiles)
            .bind(input.series_size)
            .bind(input.ishidden)
            .fetch_one(pool)
            .await
    }

    /// Insert an MR series with acquisition parameters.
    pub async fn create_mr(
        pool: &PgPool,
        input: &CreateSeries,
        params: &CreateMrParams,
    ) -> Result<DbId, sqlx::Error> {
        let v = &params.values;
        sqlx::query_scalar(
            "INSERT INTO mr_series (study_id, series_num, series_datetime, series_desc,
                                    series_protocol, data_type, numfiles, series_size, ishidden,
                                    series_sequencename, series_tr, series_te, series_ti,
                                    series_flip, dimx, dimy, dimz, dimt, slicethickness,
                                    slicespacing, bandwidth)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                     $17, $18, $19, $20, $21)
             RETURNING mrseries_id",
        )
        .bind(input.study_id)
        .bind(input.series_num)
        .bind(input.series_datetime)
        .bind(&input.series_desc)
        .bind(&input.series_protocol)
        .bind(&input.data_type)
        .bind(input.numfiles)
        .bind(input.series_size)
        .bind(input.ishidden)
        .bind(&params.series_sequencename)
        .bind(v.tr)
        .bind(v.te)
        .bind(v.ti)
        .bind(v.flip)
        .bind(v.xdim)
        .bind(v.ydim)
        .bind(v.zdim)
        .bind(v.tdim)
        .bind(v.slice_thickness)
        .bind(v.slice_spacing)
        .bind(v.bandwidth)
        .fetch_one(pool)
        .await
    }

    /// Series of one study, by series number.
    pub async fn list_for_study(
        pool: &PgPool,
        modality: &Modality,
        study_id: DbId,
    ) -> Result<Vec<Series>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM {table} WHERE study_id = $1 ORDER BY series_num",
            cols = series_columns(modality),
            table = modality.series_table(),
        );
        sqlx::query_as::<_, Series>(&query)
            .bind(study_id)
            .fetch_all(pool)
            .await
    }

    /// MR series of one study with acquisition parameters.
    pub async fn mr_for_study(pool: &PgPool, study_id: DbId) -> Result<Vec<MrSeries>, sqlx::Error> {
        let query =
            format!("SELECT {MR_COLUMNS} FROM mr_series WHERE study_id = $1 ORDER BY series_num");
        sqlx::query_as::<_, MrSeries>(&query)
            .bind(study_id)
            .fetch_all(pool)
            .await
    }

    /// Series names of a project's studies of this modality.
    pub async fn names_for_project(
        pool: &PgPool,
        modality: &Modality,
        project_id: DbId,
        include_hidden: bool,
    ) -> Result<Vec<SeriesName>, sqlx::Error> {
        let query = format!(
            "SELECT s.subject_id, s.uid, se.series_desc, se.series_protocol, se.series_altdesc
             FROM {table} se
             JOIN studies st ON st.study_id = se.study_id
             JOIN enrollment e ON e.enrollment_id = st.enrollment_id
             JOIN subjects s ON s.subject_id = e.subject_id
             WHERE e.project_id = $1 AND LOWER(st.study_modality) = $2
               AND ($3 OR NOT se.ishidden)
             ORDER BY s.uid, st.study_num, se.series_num",
            table = modality.series_table(),
        );
        sqlx::query_as::<_, SeriesName>(&query)
            .bind(project_id)
            .bind(modality.as_str())
            .bind(include_hidden)
            .fetch_all(pool)
            .await
    }

    /// Visible series names of active subjects across an instance.
    pub async fn names_for_instance(
        pool: &PgPool,
        modality: &Modality,
        instance_id: DbId,
    ) -> Result<Vec<SeriesName>, sqlx::Error> {
        let query = format!(
            "SELECT s.subject_id, s.uid, se.series_desc, se.series_protocol, se.series_altdesc
             FROM {table} se
             JOIN studies st ON st.study_id = se.study_id
             JOIN enrollment e ON e.enrollment_id = st.enrollment_id
             JOIN projects p ON p.project_id = e.project_id
             JOIN subjects s ON s.subject_id = e.subject_id
             WHERE p.instance_id = $1 AND LOWER(st.study_modality) = $2
               AND s.isactive AND NOT se.ishidden
             ORDER BY s.uid, st.study_num, se.series_num",
            table = modality.series_table(),
        );
        sqlx::query_as::<_, SeriesName>(&query)
            .bind(instance_id)
            .bind(modality.as_str())
            .fetch_all(pool)
            .await
    }

    /// Set the alternate name of a project's series named `old_name`.
    ///
    /// A series is named by its description, or by its protocol when the
    /// description is empty. Returns the number of series updated.
    pub async fn update_altdesc(
        pool: &PgPool,
        modality: &Modality,
        project_id: DbId,
        old_name: &str,
        new_name: &str,
    ) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE {table} SET series_altdesc = $3
             WHERE study_id IN ({PROJECT_STUDIES})
               AND (series_desc = $2 OR (series_desc = '' AND series_protocol = $2))",
            table = modality.series_table(),
        );
        let result = sqlx::query(&query)
            .bind(project_id)
            .bind(old_name)
            .bind(new_name)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Total archived bytes of a project's series of this modality.
    pub async fn total_size(
        pool: &PgPool,
        modality: &Modality,
        project_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COALESCE(SUM(series_size), 0)::BIGINT FROM {table}
             WHERE study_id IN ({PROJECT_STUDIES})",
            table = modality.series_table(),
        );
        sqlx::query_scalar(&query)
            .bind(project_id)
            .fetch_one(pool)
            .await
    }

    /// One row per MR series of a project, plus one row for each enrolled
    /// subject or study without series. Ordered by study date then series.
    pub async fn mr_series_list(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<SeriesListRow>, sqlx::Error> {
        sqlx::query_as::<_, SeriesListRow>(
            "SELECT s.subject_id, e.enrollment_id, s.uid, st.study_datetime, se.series_num,
                    se.series_datetime, se.series_desc, se.series_protocol,
                    se.numfiles, se.numfiles_beh
             FROM subjects s
             JOIN enrollment e ON e.subject_id = s.subject_id
             LEFT JOIN studies st ON st.enrollment_id = e.enrollment_id
             LEFT JOIN mr_series se ON se.study_id = st.study_id
             WHERE e.project_id = $1
             ORDER BY st.study_datetime NULLS FIRST, se.series_num",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
