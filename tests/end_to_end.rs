use bovespa_dash::app::{DashboardRequest, build_dashboard};
use bovespa_dash::app::pipeline::PanelBody;
use bovespa_dash::catalog::MetricGroup;
use bovespa_dash::domain::{Dataset, Indicator};
use bovespa_dash::error::AppError;
use bovespa_dash::filter::FilterSpec;
use bovespa_dash::io::{COMPANY_COLUMN, DatasetCache, DecimalStyle, PERIOD_COLUMN, SEGMENT_COLUMN, load_from_reader};
use bovespa_dash::metrics::Aggregation;
use bovespa_dash::viz::{RenderMode, VizMode};

/// Two companies in segment "Q" reporting 2019-2021, plus one in "V".
fn csv_text() -> String {
    let mut header = vec![SEGMENT_COLUMN, COMPANY_COLUMN, PERIOD_COLUMN];
    header.extend(Indicator::STORED.iter().map(|i| i.header()));
    let mut out = header
        .iter()
        .map(|h| format!("\"{h}\""))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    let rows = [
        ("Q", "ALFA SA", 2019, "1,10", "100"),
        ("Q", "BETA SA", 2019, "2,10", "200"),
        ("Q", "ALFA SA", 2020, "1,20", "110"),
        ("Q", "BETA SA", 2020, "2,20", "210"),
        ("Q", "ALFA SA", 2021, "1,30", "120"),
        ("Q", "BETA SA", 2021, "2,30", "220"),
        ("V", "GAMA SA", 2021, "9,00", "1.000"),
    ];
    for (segment, company, year, current_ratio, current_assets) in rows {
        let mut cells = vec![segment.to_string(), company.to_string(), year.to_string()];
        for ind in Indicator::STORED {
            cells.push(match ind {
                Indicator::CurrentRatio => current_ratio.to_string(),
                Indicator::CurrentAssets => current_assets.to_string(),
                Indicator::CurrentLiabilities => "50".to_string(),
                _ => String::new(),
            });
        }
        out.push_str(&cells.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(","));
        out.push('\n');
    }
    out
}

fn dataset() -> Dataset {
    load_from_reader(csv_text().as_bytes(), DecimalStyle::Comma).unwrap()
}

fn request(min: i32, max: i32, viz: VizMode) -> DashboardRequest {
    DashboardRequest {
        filter: FilterSpec::new(Some("Q".into()), min, max),
        group: MetricGroup::Liquidez,
        viz,
        aggregation: Aggregation::Mean,
    }
}

#[test]
fn multi_period_line_request_renders_lines() {
    let ds = dataset();
    let d = build_dashboard(&ds, &request(2019, 2021, VizMode::Line)).unwrap();

    assert_eq!(d.rows, 6);
    assert_eq!(d.periods, [2019, 2020, 2021]);
    assert_eq!(d.period_label, "2019-2021");
    assert_eq!(d.companies, ["ALFA SA", "BETA SA"]);

    let panel = d.panels.iter().find(|p| p.title == "Liquidez corrente").unwrap();
    assert_eq!(panel.mode, Some(RenderMode::Line));
    let PanelBody::Line(series) = &panel.body else {
        panic!("expected line body, got {:?}", panel.body);
    };
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].points, [(2019, Some(1.1)), (2020, Some(1.2)), (2021, Some(1.3))]);
}

#[test]
fn single_period_degenerates_to_raw_values() {
    let ds = dataset();
    let d = build_dashboard(&ds, &request(2020, 2020, VizMode::Line)).unwrap();

    let panel = d.panels.iter().find(|p| p.title == "Liquidez corrente").unwrap();
    assert_eq!(panel.mode, Some(RenderMode::DegenerateBar));
    assert_eq!(panel.aggregation, None);
    let PanelBody::Bar(bars) = &panel.body else {
        panic!("expected bar body, got {:?}", panel.body);
    };
    let values: Vec<(&str, Option<f64>)> = bars.iter().map(|b| (b.company.as_str(), b.value)).collect();
    assert_eq!(values, [("ALFA SA", Some(1.2)), ("BETA SA", Some(2.2))]);
}

#[test]
fn derived_working_capital_flows_through_catalog() {
    let ds = dataset();
    let mut req = request(2019, 2021, VizMode::Bar);
    req.group = MetricGroup::Estrutura;
    req.aggregation = Aggregation::Sum;
    let d = build_dashboard(&ds, &req).unwrap();

    let panel = d.panels.iter().find(|p| p.title == "Capital de giro").unwrap();
    let PanelBody::Bar(bars) = &panel.body else {
        panic!("expected bar body, got {:?}", panel.body);
    };
    // ALFA: (100-50) + (110-50) + (120-50)
    assert_eq!(bars[0].value, Some(180.0));
}

#[test]
fn company_filter_and_empty_results() {
    let ds = dataset();
    let mut req = request(2019, 2021, VizMode::Heatmap);
    req.filter = req.filter.with_companies(["BETA SA"]);
    let d = build_dashboard(&ds, &req).unwrap();
    assert_eq!(d.companies, ["BETA SA"]);

    let panel = d.panels.iter().find(|p| p.title == "Liquidez corrente").unwrap();
    let PanelBody::Heatmap(m) = &panel.body else {
        panic!("expected heatmap body, got {:?}", panel.body);
    };
    assert_eq!(m.companies, ["BETA SA"]);
    assert_eq!(m.cells, [[Some(2.1), Some(2.2), Some(2.3)]]);

    let mut empty = request(2019, 2021, VizMode::Line);
    empty.filter = empty.filter.with_companies(["NOT LISTED"]);
    let d = build_dashboard(&ds, &empty).unwrap();
    assert_eq!(d.rows, 0);
    assert!(d.panels.iter().all(|p| p.body == PanelBody::NoData));
}

#[test]
fn inverted_range_propagates() {
    let ds = dataset();
    let err = build_dashboard(&ds, &request(2021, 2019, VizMode::Line)).unwrap_err();
    assert!(matches!(err, AppError::InvalidRange { min: 2021, max: 2019 }));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn every_group_builds_against_the_same_dataset() {
    let cache = DatasetCache::preloaded(dataset());
    let ds = cache.get().unwrap();
    for group in MetricGroup::ALL {
        for viz in VizMode::ALL {
            let mut req = request(2019, 2021, viz);
            req.group = group;
            let d = build_dashboard(ds, &req).unwrap();
            assert_eq!(d.panels.len(), group.charts().len(), "{group}");
        }
    }
}

#[test]
fn malformed_csv_is_rejected_with_line_number() {
    let mut text = csv_text();
    text.push_str("\"Q\",\"DELTA SA\",\"2020\"\n");
    let err = load_from_reader(text.as_bytes(), DecimalStyle::Comma).unwrap_err();
    assert!(matches!(err, AppError::DataLoad(_)));
    assert!(err.to_string().contains("line 9"), "{err}");
}
