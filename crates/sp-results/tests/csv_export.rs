use sp_project::schema::*;
use sp_results::{CSV_HEADER, write_csv, write_csv_file};
use sp_sim::{CyclingSolver, DegradationConfig, ProtocolPreset};

fn config(degradation: bool) -> RunConfig {
    RunConfig {
        version: 1,
        name: "csv".to_string(),
        cell: CellDef {
            preset: Some("guo_2011".to_string()),
            soc_p: Some(0.6),
            soc_n: Some(0.6),
            ..CellDef::default()
        },
        solver: SolverDef {
            dt_s: 1.0,
            degradation: degradation.then(DegradationConfig::default),
            termination: TerminationDef::Time { duration_s: 10.0 },
            ..SolverDef::default()
        },
        protocol: ProtocolDef {
            preset: Some(ProtocolPreset::Charge),
            ..ProtocolDef::default()
        },
    }
}

fn export(degradation: bool) -> (usize, String) {
    let setup = config(degradation).build().unwrap();
    let mut solver = CyclingSolver::new(setup.cell, setup.options).unwrap();
    let trace = solver.solve(&setup.protocol).unwrap();
    let mut buf = Vec::new();
    write_csv(&trace, &mut buf).unwrap();
    (trace.len(), String::from_utf8(buf).unwrap())
}

#[test]
fn header_and_rows_follow_column_order() {
    let (len, text) = export(false);
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, CSV_HEADER);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), len);
    let first = &rows[0];
    assert_eq!(first.get(0).unwrap().parse::<f64>().unwrap(), 1.0);
    assert_eq!(first.get(1).unwrap(), "0");
    assert_eq!(first.get(2).unwrap(), "charge");
    assert!(first.get(3).unwrap().parse::<f64>().unwrap() > 0.0);
    assert_eq!(first.get(13).unwrap(), "");
}

#[test]
fn side_reaction_flux_is_written_when_degrading() {
    let (_, text) = export(true);
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let row = reader.records().next().unwrap().unwrap();
    let j_s: f64 = row.get(13).unwrap().parse().unwrap();
    assert!(j_s < 0.0);
}

#[test]
fn file_export_matches_writer() {
    let setup = config(false).build().unwrap();
    let mut solver = CyclingSolver::new(setup.cell, setup.options).unwrap();
    let trace = solver.solve(&setup.protocol).unwrap();

    let path = std::env::temp_dir().join("sp_results_export.csv");
    write_csv_file(&trace, &path).unwrap();
    let mut buf = Vec::new();
    write_csv(&trace, &mut buf).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), buf);
}
