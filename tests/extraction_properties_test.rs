use lab_report_etl::core::catalog::AliasGroup;
use lab_report_etl::domain::model::{
    CatalogEntry, ExtractionResult, ExtractionStatus, SerologyOutcome,
};
use lab_report_etl::{
    adequacy_from_results, extract, AliasTable, ExtractorSettings, ReferenceCatalog,
    SerologyInterpreter, ValueExtractor,
};

const SAMPLE_REPORT: &str = "RENAL BIOCHEMISTRY  Blood Urea 19.7 mmol/L  Creatinine 642 µmol/L \
    Potassium 6.2 mmol/L  Sodium 138 mmol/L  Albumin 36 g/L  Calcium 2.31 mmol/L \
    Phosphate 1.92 mmol/L  Postdialysis Urea 4.0 mmol/L  Ferritin 412 µg/L \
    SEROLOGY  HIV 1/2 antibody Not Detected  Hepatitis B Surface antigen Negative \
    Hepatitis B Surface antibody 15.3 IU/L  Hepatitis C antibody Not Detected";

fn builtin_extract(text: &str) -> Vec<ExtractionResult> {
    extract(
        text,
        &ReferenceCatalog::builtin(),
        &AliasTable::builtin(),
        ExtractorSettings::default(),
    )
    .unwrap()
}

fn row<'a>(results: &'a [ExtractionResult], item: &str) -> &'a ExtractionResult {
    results
        .iter()
        .find(|result| result.item == item)
        .unwrap_or_else(|| panic!("no row for {}", item))
}

#[test]
fn test_every_catalog_item_yields_one_row_in_order() {
    let catalog = ReferenceCatalog::builtin();
    let results = builtin_extract(SAMPLE_REPORT);

    let items: Vec<&str> = results.iter().map(|r| r.item.as_str()).collect();
    let expected: Vec<&str> = catalog
        .entries()
        .iter()
        .map(|e| e.canonical_name.as_str())
        .collect();
    assert_eq!(items, expected);
}

#[test]
fn test_absent_items_are_not_found() {
    let results = builtin_extract("Sodium 140 mmol/L");

    for result in results.iter().filter(|r| r.item != "Sodium") {
        assert_eq!(result.status, ExtractionStatus::NotFound, "{}", result.item);
        assert_eq!(result.reference_display, "-");
        assert_eq!(result.value, None);
    }
}

#[test]
fn test_in_range_values_are_not_flagged() {
    let results = builtin_extract(SAMPLE_REPORT);

    let sodium = row(&results, "Sodium");
    assert_eq!(sodium.status, ExtractionStatus::Found);
    assert_eq!(sodium.value, Some(138.0));
    assert!(!sodium.flagged);
    assert_eq!(sodium.reference_display, "135-145");

    let calcium = row(&results, "Calcium");
    assert_eq!(calcium.value, Some(2.31));
    assert_eq!(calcium.reference_display, "2.1-2.55");
}

#[test]
fn test_out_of_range_values_are_flagged() {
    let results = builtin_extract("Potassium 6.2");

    let potassium = row(&results, "Potassium");
    assert_eq!(potassium.status, ExtractionStatus::Found);
    assert_eq!(potassium.value, Some(6.2));
    assert!(potassium.flagged);
    assert_eq!(potassium.display_value(), "6.2*");
}

#[test]
fn test_alias_behaves_like_canonical_label() {
    let via_alias = builtin_extract("Urea (BUN) 12.5 mmol/L");
    let via_canonical = builtin_extract("Urea 12.5 mmol/L");

    assert_eq!(row(&via_alias, "Urea"), row(&via_canonical, "Urea"));
    assert_eq!(row(&via_alias, "Urea").value, Some(12.5));
}

#[test]
fn test_alias_alone_resolves_to_its_item() {
    let catalog = ReferenceCatalog::new(vec![CatalogEntry::new(
        "Urea",
        "mmol/L",
        Some(3.0),
        Some(9.0),
    )])
    .unwrap();
    let aliases = AliasTable::new(&[AliasGroup {
        canonical: "Urea".to_string(),
        aliases: vec!["BUN".to_string()],
    }])
    .unwrap();

    let settings = ExtractorSettings::default();
    let via_alias = extract("BUN 12.5 mmol/L", &catalog, &aliases, settings).unwrap();
    let via_canonical = extract("Urea 12.5 mmol/L", &catalog, &aliases, settings).unwrap();

    assert_eq!(via_alias, via_canonical);
    assert_eq!(via_alias[0].status, ExtractionStatus::Found);
    assert_eq!(via_alias[0].value, Some(12.5));
    assert!(via_alias[0].flagged);
}

#[test]
fn test_post_dialysis_alias() {
    let results = builtin_extract("Post BUN 3.9");
    let post = row(&results, "Urea - Post Dialysis");
    assert_eq!(post.status, ExtractionStatus::Found);
    assert_eq!(post.value, Some(3.9));
}

#[test]
fn test_alias_to_unknown_item_is_ignored() {
    // "Serum Creatinine" 指向不存在的 "Sr. Creatinine"，但 "Creatinine" 字面仍可匹配
    let results = builtin_extract("Serum Creatinine 88");
    assert_eq!(row(&results, "Creatinine").value, Some(88.0));
    assert!(results.iter().all(|r| r.item != "Sr. Creatinine"));
}

#[test]
fn test_extraction_is_idempotent() {
    let extractor = ValueExtractor::new(
        &ReferenceCatalog::builtin(),
        &AliasTable::builtin(),
        ExtractorSettings::default(),
    )
    .unwrap();

    assert_eq!(extractor.extract(SAMPLE_REPORT), extractor.extract(SAMPLE_REPORT));
}

#[test]
fn test_substituted_catalog() {
    let catalog = ReferenceCatalog::new(vec![
        lab_report_etl::domain::model::CatalogEntry::new("Magnesium", "mmol/L", Some(0.7), Some(1.0)),
    ])
    .unwrap();

    let results = extract(
        "Magnesium 1.3 mmol/L",
        &catalog,
        &AliasTable::default(),
        ExtractorSettings::default(),
    )
    .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].flagged);
}

#[test]
fn test_sample_report_serology() {
    let serology = SerologyInterpreter::new(ExtractorSettings::default().lookahead_chars)
        .unwrap()
        .interpret(SAMPLE_REPORT);

    assert_eq!(
        serology.get_by_label("Anti HIV antibody"),
        Some(&SerologyOutcome::Negative)
    );
    assert_eq!(
        serology.get_by_label("Hep B antigen (HBsAg)"),
        Some(&SerologyOutcome::Negative)
    );
    assert_eq!(
        serology
            .get_by_label("Hep B antibody (HBsAb)")
            .map(ToString::to_string),
        Some("Positive (15.3 IU/L)".to_string())
    );
    assert_eq!(
        serology.get_by_label("Anti HCV antibody"),
        Some(&SerologyOutcome::Negative)
    );
    assert_eq!(
        serology.get_by_label("Hep B Core antibody (HBcAb)"),
        Some(&SerologyOutcome::NotDone)
    );
}

#[test]
fn test_sample_report_adequacy() {
    let results = builtin_extract(SAMPLE_REPORT);
    let outcome = adequacy_from_results(
        &results,
        lab_report_etl::domain::model::AdequacyParams {
            duration_hours: 4.0,
            uf_volume_liters: 1.7,
            post_weight_kg: 53.65,
        },
    );

    assert_eq!(outcome.urr_display(), "79.7");
    assert_eq!(outcome.ktv_display(), "1.87");
}
