//! Member usage aggregation: projected annual cost per corporation

use std::collections::BTreeMap;

use crate::assembly::CorporationId;
use crate::error::{ReadjustResult, SourceKind};
use crate::reference::{AgeBand, CostTable, Sex};
use crate::table::{canonical_key, MalformedCells, RawTable};

pub const CORPORATION_ID: &str = "id_corporacao_contrato";
pub const SEX: &str = "descricao_tipo_sexo";
pub const AGE_BAND: &str = "descricao_faixa_etaria_10_faixas";
pub const ACTIVE_USERS: &str = "qtd_usuarios_ativos_ultimo_dia_competencia";

#[derive(Debug, Clone, Default)]
pub struct MemberAggregate {
    pub projected_cost: BTreeMap<CorporationId, f64>,
}

/// projected cost = active members × average cost(band, sex) × 12, summed per corporation.
/// Rows with an unrecognised age band are excluded.
pub fn aggregate_members(table: &RawTable, costs: &CostTable) -> ReadjustResult<MemberAggregate> {
    let file = SourceKind::Members;
    let corp_col = table.require(file, CORPORATION_ID)?;
    let sex_col = table.require(file, SEX)?;
    let band_col = table.require(file, AGE_BAND)?;
    let users_col = table.require(file, ACTIVE_USERS)?;

    let mut agg = MemberAggregate::default();
    let mut unmapped_bands = 0usize;
    let mut unknown_sex = 0usize;
    let mut cells = MalformedCells::new();

    for row in 0..table.len() {
        let Some(corp) = canonical_key(table.cell(row, corp_col)) else {
            continue;
        };
        let Some(band) = AgeBand::from_member_label(table.cell(row, band_col)) else {
            log::debug!("{}: row {} has unmapped age band '{}'", file, row + 1, table.cell(row, band_col));
            unmapped_bands += 1;
            continue;
        };
        let sex = Sex::from_label(table.cell(row, sex_col));
        if sex == Sex::Unknown {
            unknown_sex += 1;
        }
        let Some(avg_cost) = costs.average_cost(band, sex) else {
            continue;
        };

        let members = cells.number_or_zero(table, row, users_col);
        *agg.projected_cost.entry(CorporationId::new(corp)).or_insert(0.0) += members * avg_cost * 12.0;
    }

    cells.report(file);
    if unmapped_bands > 0 {
        log::warn!("{}: dropped {} rows with an unmapped age band", file, unmapped_bands);
    }
    if unknown_sex > 0 {
        log::warn!("{}: {} rows with unrecognised sex priced with the female column", file, unknown_sex);
    }
    log::info!("{}: {} rows -> {} corporations", file, table.len(), agg.projected_cost.len());
    Ok(agg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn headers() -> [&'static str; 4] {
        [CORPORATION_ID, SEX, AGE_BAND, ACTIVE_USERS]
    }

    #[test]
    fn test_projected_cost_by_sex_and_band() {
        let table = RawTable::from_rows(
            &headers(),
            &[
                &["1", "masculino ", "0 a 18", "2"],
                &["1", "FEMININO", "ACIMA DE 59", "1"],
                &["2", "MASCULINO", "24 A 28", "10"],
            ],
        );
        let agg = aggregate_members(&table, &CostTable::default()).unwrap();
        let corp1 = agg.projected_cost[&CorporationId::new("1")];
        assert_relative_eq!(corp1, 2.0 * 350.57 * 12.0 + 1058.30 * 12.0, epsilon = 1e-9);
        let corp2 = agg.projected_cost[&CorporationId::new("2")];
        assert_relative_eq!(corp2, 10.0 * 187.26 * 12.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unmapped_band_dropped_and_unknown_sex_uses_female() {
        let table = RawTable::from_rows(
            &headers(),
            &[
                &["1", "MASCULINO", "60 A 64", "5"],
                &["1", "", "34 A 38", "1"],
                &["3", "MASCULINO", "sem faixa", "7"],
            ],
        );
        let agg = aggregate_members(&table, &CostTable::default()).unwrap();
        assert_eq!(agg.projected_cost.len(), 1);
        assert_relative_eq!(agg.projected_cost[&CorporationId::new("1")], 401.83 * 12.0, epsilon = 1e-9);
    }
}
