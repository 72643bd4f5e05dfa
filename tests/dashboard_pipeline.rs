use std::fs;
use std::path::Path;
use volatility_dashboard::data::{DataLoader, RangeError, WeekRange};
use volatility_dashboard::report::{export_report, ReportOptions};
use volatility_dashboard::stats::Dashboard;

const PANEL: &str = "\
product_id,date_value,performance_label
p1,1,low
p1,2,high
p1,3,high
p2,1,non
p2,2,top
p2,3,
p3,1,non
p3,2,non
";

fn write_panel(dir: &Path) {
    fs::write(dir.join("panel_TH_toys.csv"), PANEL).unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();
}

fn options(dir: &Path, pptx: bool) -> ReportOptions {
    ReportOptions {
        output_dir: dir.join("report"),
        width: 800,
        height: 400,
        pptx,
    }
}

#[test]
fn test_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    write_panel(dir.path());

    let files = DataLoader::list_panel_files(dir.path(), "panel_TH_", ".csv").unwrap();
    assert_eq!(files, vec!["panel_TH_toys.csv"]);

    let mut loader = DataLoader::new(dir.path());
    let panel = loader.get_or_load(&files[0]).unwrap();
    assert_eq!(panel.dates(), vec!["1", "2", "3"]);

    let range = WeekRange::from_bounds(&panel.dates(), None, None).unwrap();
    let dashboard = Dashboard::build(&files[0], panel, range, Some("p2"), 10);

    let overview = dashboard.overview.as_ref().unwrap();
    assert_eq!(overview.product_count, 2);
    assert_eq!(overview.week_count, 3);
    let expected = ((4.0f64 / 3.0).sqrt() + 8.0f64.sqrt()) / 2.0;
    assert!((overview.mean_volatility.unwrap() - expected).abs() < 1e-9);

    assert_eq!(dashboard.products, vec!["p1", "p2", "p3"]);
    let view = dashboard.product.as_ref().unwrap();
    assert_eq!(view.product_id, "p2");
    assert_eq!(view.deltas.points.len(), 1);
    assert_eq!(view.deltas.counts.up, 1);
    assert_eq!(view.periods.len(), 3);

    let written = export_report(&dashboard, &options(dir.path(), true)).unwrap();
    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    for expected in [
        "composition.png",
        "volatility.png",
        "delta.png",
        "trend.png",
        "periods.csv",
        "composition.csv",
        "summary.json",
        "dashboard.pptx",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
    for path in &written {
        assert!(path.exists());
    }

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report/summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["product"], "p2");
    assert_eq!(summary["eligible_total"], 2);
    assert_eq!(summary["delta_counts"]["up"], 1);

    let periods = fs::read_to_string(dir.path().join("report/periods.csv")).unwrap();
    assert!(periods.starts_with("performance_label,start_date,end_date,duration"));
}

#[test]
fn test_reversed_range_exports_summary_only() {
    let dir = tempfile::tempdir().unwrap();
    write_panel(dir.path());

    let panel = DataLoader::load_panel(&dir.path().join("panel_TH_toys.csv")).unwrap();
    let range = WeekRange::select(&panel.dates(), "3", "1").unwrap();
    assert!(range.is_empty());

    let dashboard = Dashboard::build("panel_TH_toys.csv", &panel, range, None, 10);
    assert!(dashboard.overview.is_none());
    assert!(dashboard.product.is_none());

    let written = export_report(&dashboard, &options(dir.path(), true)).unwrap();
    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("summary.json"));
}

#[test]
fn test_unknown_week_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_panel(dir.path());

    let panel = DataLoader::load_panel(&dir.path().join("panel_TH_toys.csv")).unwrap();
    let err = WeekRange::from_bounds(&panel.dates(), Some("9"), None).unwrap_err();
    assert_eq!(err, RangeError::UnknownWeek("9".to_string()));
}
