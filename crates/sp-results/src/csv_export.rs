//! CSV export of a solution trace.
//!
//! Column order and headings match the cycling analysis scripts that
//! consume these files, so they must not be reordered or renamed.

use crate::ResultsResult;
use sp_sim::SolutionTrace;
use std::io::Write;
use std::path::Path;

pub const CSV_HEADER: [&str; 14] = [
    "Time [s]",
    "Cycle No",
    "Step Name",
    "I [A]",
    "SOC_p",
    "SOC_n",
    "V [V]",
    "Temp [K]",
    "capacity [Ahr]",
    "Charge cap. [Ahr]",
    "Discharge cap. [Ahr]",
    "R_cell [ohm]",
    "Battery cap [Ahr]",
    "j_s [A/m2]",
];

/// Write one row per sample. `j_s` is left empty for runs without SEI growth.
pub fn write_csv<W: Write>(trace: &SolutionTrace, out: W) -> ResultsResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for s in trace.samples() {
        writer.write_record([
            s.t.to_string(),
            s.cycle_no.to_string(),
            s.step.name().to_string(),
            s.current.to_string(),
            s.soc_p.to_string(),
            s.soc_n.to_string(),
            s.voltage.to_string(),
            s.temp_k.to_string(),
            s.cumulative_cap.to_string(),
            s.charge_cap.to_string(),
            s.discharge_cap.to_string(),
            s.r_cell.to_string(),
            s.battery_cap.to_string(),
            s.j_s.map(|j| j.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(trace: &SolutionTrace, path: &Path) -> ResultsResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv(trace, std::io::BufWriter::new(file))
}
