mod common;

use approx::assert_relative_eq;
use readjustment_system::{
    CorporationId, EngineConfig, ManualAdjustment, ReadjustmentSession, ReferenceTables,
};

fn loaded(config: EngineConfig) -> ReadjustmentSession {
    let mut s = ReadjustmentSession::new(config, ReferenceTables::default());
    s.load(&common::full_sources()).unwrap();
    s
}

fn edit(id: &str, company: &str, mv: Option<f64>, purge: Option<f64>) -> ManualAdjustment {
    ManualAdjustment {
        corporation_id: CorporationId::new(id),
        company_name: company.to_string(),
        manual_mv_adjustment: mv,
        manual_purge_adjustment: purge,
    }
}

#[test]
fn test_editable_subset_applies_eligibility_gate() {
    let s = loaded(EngineConfig::default());
    let editable = s.editable_subset().unwrap();

    // BETA has 10 lives and a floored target; only ACME qualifies
    assert_eq!(editable, vec![edit("1", "ACME", Some(0.0), Some(0.0))]);
}

#[test]
fn test_edits_recompute_target_and_classification() {
    let mut s = loaded(EngineConfig::default());
    let table = s
        .apply_edits(&[edit("1", "ACME", Some(20_000.0), Some(10_000.0))])
        .unwrap();

    let acme = table.get(&CorporationId::new("1")).unwrap();
    assert_eq!(acme.manual_mv_adjustment, 20_000.0);
    assert_eq!(acme.manual_purge_adjustment, 10_000.0);
    // sinistrality ignores the adjustments
    assert_relative_eq!(acme.derived.sinistrality.value().unwrap(), 1.0, epsilon = 1e-12);
    // 0.7 / 0.75 * 1.05 - 1 = -0.02, floored at the 5% index
    assert_relative_eq!(acme.derived.target_readjustment.value().unwrap(), 0.05, epsilon = 1e-12);
    assert_eq!(acme.derived.reason.as_deref(), Some("IPCA + Problema de Preço"));

    // the target now sits below 15%
    assert!(s.editable_subset().unwrap().is_empty());
}

#[test]
fn test_unknown_corporation_edit_ignored() {
    let mut s = loaded(EngineConfig::default());
    let before = s.current().cloned().unwrap();
    let after = s
        .apply_edits(&[
            edit("99", "ACME", Some(1.0), Some(1.0)),
            edit("1", "NOT ACME", Some(1.0), Some(1.0)),
        ])
        .unwrap();
    assert_eq!(after, &before);
}

/// Target and commercial readjustments of ACME after a single edit on a fresh load
fn acme_after(mv: Option<f64>, purge: Option<f64>) -> (f64, f64) {
    let mut s = loaded(EngineConfig::default());
    let table = s.apply_edits(&[edit("1", "ACME", mv, purge)]).unwrap();
    let acme = &table.get(&CorporationId::new("1")).unwrap().derived;
    (
        acme.target_readjustment.value().unwrap(),
        acme.commercial_readjustment.value().unwrap(),
    )
}

#[test]
fn test_purge_never_raises_target() {
    let mut previous = (f64::INFINITY, f64::INFINITY);
    for step in 0..10 {
        let purge = step as f64 * 5_000.0;
        let (target, commercial) = acme_after(None, Some(purge));
        assert!(target <= previous.0, "target rose from {} to {target} at purge {purge}", previous.0);
        assert!(commercial <= previous.1, "commercial rose from {} to {commercial} at purge {purge}", previous.1);
        assert!(target >= 0.05 - 1e-12);
        assert!(commercial >= 0.05 - 1e-12);
        previous = (target, commercial);
    }
}

#[test]
fn test_mv_never_raises_target_or_commercial() {
    let mut previous = (f64::INFINITY, f64::INFINITY);
    for step in 0..12 {
        let mv = step as f64 * 4_000.0;
        let (target, commercial) = acme_after(Some(mv), None);
        assert!(target <= previous.0, "target rose from {} to {target} at MV {mv}", previous.0);
        assert!(commercial <= previous.1, "commercial rose from {} to {commercial} at MV {mv}", previous.1);
        assert!(target >= 0.05 - 1e-12);
        assert!(commercial >= 0.05 - 1e-12);
        previous = (target, commercial);
    }
    // large enough MV pins both to the 5% index
    assert_relative_eq!(previous.0, 0.05, epsilon = 1e-12);
    assert_relative_eq!(previous.1, 0.05, epsilon = 1e-12);
}

#[test]
fn test_edit_outside_editable_subset_ignored() {
    let mut s = loaded(EngineConfig::default());
    let beta = CorporationId::new("2");
    let before = s.current().unwrap().get(&beta).cloned().unwrap();

    let table = s
        .apply_edits(&[edit("2", "BETA", Some(30_000.0), Some(5_000.0))])
        .unwrap();
    let after = table.get(&beta).unwrap();
    assert_eq!(after.manual_mv_adjustment, 0.0);
    assert_eq!(after.manual_purge_adjustment, 0.0);
    assert_eq!(after, &before);
}

#[test]
fn test_row_leaving_subset_takes_no_further_edits() {
    let mut s = loaded(EngineConfig::default());
    // pins ACME's target to the 5% floor, below the 15% gate
    s.apply_edits(&[edit("1", "ACME", Some(20_000.0), Some(10_000.0))])
        .unwrap();
    assert!(s.editable_subset().unwrap().is_empty());

    let table = s.apply_edits(&[edit("1", "ACME", Some(0.0), Some(0.0))]).unwrap();
    let acme = table.get(&CorporationId::new("1")).unwrap();
    assert_eq!(acme.manual_mv_adjustment, 20_000.0);
    assert_eq!(acme.manual_purge_adjustment, 10_000.0);
}

#[test]
fn test_edits_leave_other_rows_alone() {
    let mut s = loaded(EngineConfig::default());
    let beta_before = s.current().unwrap().records[1].clone();
    let table = s.apply_edits(&[edit("1", "ACME", Some(500.0), None)]).unwrap();
    assert_eq!(table.records[1], beta_before);
}

#[test]
fn test_overwrite_policy_replaces_operator_classification() {
    let mut s = loaded(EngineConfig::default());
    let beta = CorporationId::new("2");
    assert!(s.set_classification(&beta, "Negociação comercial").unwrap());

    let table = s.apply_edits(&[]).unwrap();
    assert_eq!(
        table.get(&beta).unwrap().derived.reason.as_deref(),
        Some("IPCA + Problema de Preço + Problema de Custo")
    );
}

#[test]
fn test_preserve_policy_keeps_operator_classification() {
    let config = EngineConfig { overwrite_classification: false, ..EngineConfig::default() };
    let mut s = loaded(config);
    let beta = CorporationId::new("2");
    assert!(s.set_classification(&beta, "Negociação comercial").unwrap());

    let table = s
        .apply_edits(&[edit("1", "ACME", Some(20_000.0), Some(10_000.0))])
        .unwrap();
    assert_eq!(
        table.get(&beta).unwrap().derived.reason.as_deref(),
        Some("Negociação comercial")
    );
    // numeric fields are still recomputed
    let acme = table.get(&CorporationId::new("1")).unwrap();
    assert_relative_eq!(acme.derived.target_readjustment.value().unwrap(), 0.05, epsilon = 1e-12);
}

#[test]
fn test_reload_discards_edits() {
    let mut s = loaded(EngineConfig::default());
    s.apply_edits(&[edit("1", "ACME", Some(20_000.0), None)]).unwrap();
    let table = s.load(&common::full_sources()).unwrap();
    assert_eq!(table.records[0].manual_mv_adjustment, 0.0);
    assert_relative_eq!(table.records[0].derived.target_readjustment.value().unwrap(), 0.4, epsilon = 1e-12);
}
