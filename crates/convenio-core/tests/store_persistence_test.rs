//! Store persistence across reopen
//!
//! Tests:
//! 1. Fragments and salary rows survive a close/reopen cycle
//! 2. Latest fingerprint tracks the newest insert
//! 3. Salary upsert replaces the amount instead of duplicating the row
//! 4. Level listing, with and without a group filter

use convenio_core::db::FragmentInsert;
use convenio_core::{Database, FragmentType, Intent, SalaryLineItem};

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("convenio.sqlite");

    let fragment_id = {
        let db = Database::open(&path).unwrap();
        db.initialize().unwrap();

        let doc_id = db
            .insert_document("Convenio Iberia", "convenio", "iberia")
            .unwrap();
        let fragment_id = db
            .insert_fragment(&FragmentInsert {
                document_id: doc_id,
                content: "Artículo 12. Jornada ordinaria de trabajo...",
                article_ref: Some("Artículo 12"),
                company: "iberia",
                intents: &[Intent::General],
                fragment_type: FragmentType::Article,
                year: 2025,
                version_fingerprint: "a1b2c3",
                is_primary: true,
            })
            .unwrap();

        db.upsert_salary_item(&SalaryLineItem {
            company_slug: "iberia".into(),
            group: "Administrativos".into(),
            level: "Nivel 5".into(),
            concept: "BASE_ANNUAL".into(),
            amount: 24_100.50,
            year: 2025,
        })
        .unwrap();
        fragment_id
    };

    let db = Database::open(&path).unwrap();
    db.initialize().unwrap();

    let fragment = db.get_fragment(fragment_id).unwrap().unwrap();
    assert_eq!(fragment.metadata.company, "iberia");
    assert_eq!(fragment.article_ref.as_deref(), Some("Artículo 12"));

    let amount = db
        .salary_amount("iberia", "Administrativos", "Nivel 5", "BASE_ANNUAL", 2025)
        .unwrap();
    assert_eq!(amount, Some(24_100.50));
}

#[test]
fn test_latest_fingerprint_tracks_newest_insert() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("convenio.sqlite")).unwrap();
    db.initialize().unwrap();

    let doc_id = db
        .insert_document("Convenio Azul", "convenio", "azul")
        .unwrap();
    for fingerprint in ["v1", "v2"] {
        db.insert_fragment(&FragmentInsert {
            document_id: doc_id,
            content: "contenido",
            article_ref: None,
            company: "azul",
            intents: &[Intent::General],
            fragment_type: FragmentType::Text,
            year: 2025,
            version_fingerprint: fingerprint,
            is_primary: false,
        })
        .unwrap();
    }

    assert_eq!(db.latest_fingerprint("azul").unwrap().as_deref(), Some("v2"));
    assert_eq!(db.latest_fingerprint("swissport").unwrap(), None);
}

#[test]
fn test_salary_upsert_replaces_amount() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("convenio.sqlite")).unwrap();
    db.initialize().unwrap();

    let mut item = SalaryLineItem {
        company_slug: "azul".into(),
        group: "Rampa".into(),
        level: "Nivel 2".into(),
        concept: "BASE_ANNUAL".into(),
        amount: 21_000.0,
        year: 2025,
    };
    db.upsert_salary_item(&item).unwrap();
    item.amount = 21_850.75;
    db.upsert_salary_item(&item).unwrap();

    let amount = db
        .salary_amount("azul", "Rampa", "Nivel 2", "BASE_ANNUAL", 2025)
        .unwrap();
    assert_eq!(amount, Some(21_850.75));

    let levels = db
        .levels_with_amount("azul", "Rampa", "BASE_ANNUAL", 2025)
        .unwrap();
    assert_eq!(levels.len(), 1);
}

#[test]
fn test_list_levels_with_and_without_group() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("convenio.sqlite")).unwrap();
    db.initialize().unwrap();

    for (group, level) in [
        ("Rampa", "Nivel 2"),
        ("Rampa", "Nivel 3"),
        ("Administrativos", "Nivel 5"),
    ] {
        db.upsert_salary_item(&SalaryLineItem {
            company_slug: "azul".into(),
            group: group.into(),
            level: level.into(),
            concept: "BASE_ANNUAL".into(),
            amount: 20_000.0,
            year: 2025,
        })
        .unwrap();
    }

    let all = db.list_levels("azul", None).unwrap();
    assert_eq!(all, vec!["Nivel 2", "Nivel 3", "Nivel 5"]);

    let rampa = db.list_levels("azul", Some("Rampa")).unwrap();
    assert_eq!(rampa, vec!["Nivel 2", "Nivel 3"]);

    assert!(db.list_levels("swissport", None).unwrap().is_empty());
}
