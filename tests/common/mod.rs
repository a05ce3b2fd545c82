//! Extract fixtures shared by the integration tests
#![allow(dead_code)]

use readjustment_system::{RawTable, SourceTables};

/// Corporation 1 (ACME): two contracts, 300 lives, index 5%.
/// Corporation 2 (BETA): one contract, 10 lives, index 4%.
/// Corporation 3 exists only in the financial base; contract 30 only in the census.
pub fn financial() -> RawTable {
    RawTable::from_rows(
        &[
            "ID Contrato",
            "ID Corporação",
            "Receita Assistencial",
            "Custo Assistencial Líquido",
            "Custo Assistencial Bruto",
            "Valor Receita Faturada Fator Moderador ESP017",
        ],
        &[
            &["10", "1", "60000", "70000", "80000", "2000"],
            &["11", "1", "40000", "30000", "30000", "1000"],
            &["20", "2", "100000", "40000", "50000", "0"],
            &["25", "3", "5000", "5000", "5000", "0"],
        ],
    )
}

pub fn census() -> RawTable {
    RawTable::from_rows(
        &[
            "Código Contrato",
            "Empresa",
            "Total Usuários Coletivo",
            "Total Usuários Privativo",
            "Reajuste Financeiro",
            "Vigente Coletivo",
            "Vigente Privativo",
        ],
        &[
            &["10", "ACME", "150", "50", "5", "40", "60"],
            &["11", "ACME", "100", "", "5", "40", ""],
            &["20", "BETA", "10", "0", "4", "100", "0"],
            &["30", "GHOST", "900", "0", "3", "1", "1"],
        ],
    )
}

pub fn members() -> RawTable {
    RawTable::from_rows(
        &[
            "id_corporacao_contrato",
            "descricao_tipo_sexo",
            "descricao_faixa_etaria_10_faixas",
            "qtd_usuarios_ativos_ultimo_dia_competencia",
        ],
        &[
            &["1", "MASCULINO", "29 A 33", "200"],
            &["1", "FEMININO", "29 a 33", "100"],
            &["1", "MASCULINO", "IDADE DESCONHECIDA", "5000"],
            &["2", "MASCULINO", "ACIMA DE 59", "1"],
        ],
    )
}

pub fn full_sources() -> SourceTables {
    SourceTables::new(financial(), census(), Some(members()))
}

pub fn required_only() -> SourceTables {
    SourceTables::new(financial(), census(), None)
}
