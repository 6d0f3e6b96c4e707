use chrono::NaiveDate;
use ladder_core::catalog::{dedupe, parse_export, CatalogFilter, CatalogReport};
use ladder_core::ladder::planner::{plan_ladder, LadderInput};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TREASURY_EXPORT: &str = r#"Cusip,State,Description,Coupon,Maturity Date,Price Bid,Price Ask,Ask Yield to Worst,Ask Yield to Maturity,Attributes
="912797GK7",,"UNITED STATES TREAS BILLS   ZERO CPN 0.00000% 06/27/2024",--,06/27/2024,97.512,97.522,5.301,5.301,CP
="91282CJL6",,"UNITED STATES TREAS SER BE-2025 4.875% 11/30/2025",4.875,11/30/2025,99.820,99.852,4.954,4.954,CP
="3130AXYZ1",,"FEDERAL HOME LN BKS CALLABLE",5.500,10/15/2028,99.950,100.100,5.470,5.470,CALLABLE
="912828ZZ9",,"MISSING PRICE",1.250,03/31/2026,,,4.100,4.100,CP
="",,"NO IDENTIFIER",1.000,01/31/2026,99.000,99.100,4.000,4.000,CP
"Date downloaded 11/06/2023 2:15 PM ET"
"#;

const CD_EXPORT: &str = r#"Cusip,Description,Coupon,Maturity Date,Price Ask,Ask Yield to Worst,Attributes
="91282CJL6",DUPLICATE OF TREASURY,4.875,11/30/2025,99.900,4.900,CP
="06051XAB8","BANK CD  5.35%",5.350,05/20/2026,100.000,5.350,"CP, SP"
"#;

#[test]
fn test_parse_treasury_export() {
    let mut report = CatalogReport::default();
    let securities = parse_export(
        TREASURY_EXPORT.as_bytes(),
        &CatalogFilter::default(),
        &mut report,
    )
    .unwrap();

    let ids: Vec<&str> = securities.iter().map(|s| s.cusip.as_str()).collect();
    assert_eq!(ids, vec!["912797GK7", "91282CJL6"]);

    let bill = &securities[0];
    assert_eq!(bill.coupon_rate, Decimal::ZERO);
    assert_eq!(bill.price, dec!(97.522));
    assert_eq!(bill.redemption, dec!(100));
    assert_eq!(bill.yield_to_worst, dec!(5.301));
    assert_eq!(bill.maturity_date, NaiveDate::from_ymd_opt(2024, 6, 27).unwrap());
    assert_eq!(
        bill.description,
        "UNITED STATES TREAS BILLS ZERO CPN 0.00000% 06/27/2024"
    );

    assert_eq!(securities[1].coupon_rate, dec!(0.04875));

    assert_eq!(report.rows_read, 6);
    assert_eq!(report.filtered, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.incomplete, 2);
}

#[test]
fn test_filter_can_keep_callable_rows() {
    let mut report = CatalogReport::default();
    let securities =
        parse_export(TREASURY_EXPORT.as_bytes(), &CatalogFilter::all(), &mut report).unwrap();
    assert_eq!(securities.len(), 3);
    assert_eq!(report.filtered, 0);
}

#[test]
fn test_concatenated_exports_keep_first_duplicate() {
    let mut report = CatalogReport::default();
    let filter = CatalogFilter::default();
    let mut all = parse_export(TREASURY_EXPORT.as_bytes(), &filter, &mut report).unwrap();
    all.extend(parse_export(CD_EXPORT.as_bytes(), &filter, &mut report).unwrap());

    let merged = dedupe(all, &mut report);
    assert_eq!(merged.len(), 3);
    assert_eq!(report.duplicates, 1);
    let note = merged.iter().find(|s| s.cusip == "91282CJL6").unwrap();
    assert_eq!(note.price, dec!(99.852));

    let cd = merged.iter().find(|s| s.cusip == "06051XAB8").unwrap();
    assert_eq!(cd.attributes, vec!["CP".to_string(), "SP".to_string()]);
    assert_eq!(cd.description, "BANK CD 5.35%");
}

#[test]
fn test_negative_coupon_row_is_skipped() {
    let csv = r#"Cusip,Description,Coupon,Maturity Date,Price Ask,Ask Yield to Worst,Attributes
="912828AA1",BAD COUPON,-1.250,03/31/2026,99.000,4.100,CP
="912828BB2",GOOD NOTE,1.250,03/31/2026,99.000,4.100,CP
"#;
    let mut report = CatalogReport::default();
    let securities =
        parse_export(csv.as_bytes(), &CatalogFilter::default(), &mut report).unwrap();
    let ids: Vec<&str> = securities.iter().map(|s| s.cusip.as_str()).collect();
    assert_eq!(ids, vec!["912828BB2"]);
    assert_eq!(report.skipped, 1);
}

#[test]
fn test_missing_required_column_is_an_error() {
    let csv = "Cusip,Coupon,Maturity Date,Price Ask,Ask Yield to Worst\n\"X\",1,01/01/2026,99,4\n";
    let mut report = CatalogReport::default();
    assert!(parse_export(csv.as_bytes(), &CatalogFilter::default(), &mut report).is_err());
}

#[test]
fn test_ingested_catalog_feeds_the_planner() {
    let mut report = CatalogReport::default();
    let filter = CatalogFilter::default();
    let mut all = parse_export(TREASURY_EXPORT.as_bytes(), &filter, &mut report).unwrap();
    all.extend(parse_export(CD_EXPORT.as_bytes(), &filter, &mut report).unwrap());
    let securities = dedupe(all, &mut report);

    let input = LadderInput {
        securities,
        target_monthly_cashflow_by_year: [(2025, dec!(2000)), (2026, dec!(2000))].into(),
        cash_yield: dec!(0.01),
        max_idle_months: None,
        allow_partial: true,
    };
    let out = plan_ladder(&input).unwrap();
    assert!(!out.result.purchases.is_empty());
    assert!(out.result.summary.total_investment > Decimal::ZERO);
}
