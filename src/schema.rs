/// Field and column name constants for the merged case data.
/// Single source of truth for the CSV layout and the NDJSON keys.

// ── Input CSV columns ───────────────────────────────────────────────────────
pub mod input {
    pub const REGION_NAME: usize = 0;
    pub const REGION_CODE: usize = 1;
    pub const SUBREGION_NAME: usize = 2;
    pub const SUBREGION_CODE: usize = 3;
    pub const POPULATION: usize = 4;
    /// First column holding a daily count; the header gives its date.
    pub const FIRST_DATE: usize = 5;

    /// Cell values that mean "no data" and read as zero.
    pub const MISSING_VALUE_SENTINELS: [&str; 3] = ["", "SIN DATO", "SIN DATOS"];
}

// ── Output record keys ──────────────────────────────────────────────────────
pub mod record {
    pub const DEPARTAMENTO: &str = "departamento";
    pub const MUNICIPIO: &str = "municipio";
    pub const POBLACION: &str = "poblacion";
    pub const FECHA: &str = "fecha";
}

// ── Case categories (raw, smoothed) ─────────────────────────────────────────
pub mod category {
    pub const CASOS_TAMIZADOS: &str = "casos_tamizados";
    pub const EXP_TAMIZADOS: &str = "exp_tamizados";
    pub const CASOS_CONFIRMADOS: &str = "casos_confirmados";
    pub const EXP_CONFIRMADOS: &str = "exp_confirmados";
    pub const CASOS_FALLECIDOS: &str = "casos_fallecidos";
    pub const EXP_FALLECIDOS: &str = "exp_fallecidos";

    pub const ALL: [&str; 6] = [
        CASOS_TAMIZADOS,
        EXP_TAMIZADOS,
        CASOS_CONFIRMADOS,
        EXP_CONFIRMADOS,
        CASOS_FALLECIDOS,
        EXP_FALLECIDOS,
    ];
}
