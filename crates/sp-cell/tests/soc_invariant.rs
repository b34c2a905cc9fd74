//! Electrode SOC must stay strictly inside (0, 1).

use proptest::prelude::*;
use sp_cell::{CellError, ElectrodeRole, preset};

proptest! {
    #[test]
    fn interior_soc_is_accepted(soc in 1e-9_f64..(1.0 - 1e-9)) {
        let mut cell = preset("guo_2011").unwrap().default_cell().unwrap();
        for role in [ElectrodeRole::Positive, ElectrodeRole::Negative] {
            cell.electrode_mut(role).set_soc(soc).unwrap();
            prop_assert_eq!(cell.electrode(role).soc(), soc);
        }
    }

    #[test]
    fn exterior_soc_is_rejected(soc in prop_oneof![-10.0_f64..=0.0, 1.0_f64..10.0]) {
        let mut cell = preset("guo_2011").unwrap().default_cell().unwrap();
        let before = cell.negative().soc();
        let err = cell.electrode_mut(ElectrodeRole::Negative).set_soc(soc).unwrap_err();
        prop_assert_eq!(err, CellError::InvalidSoc { role: ElectrodeRole::Negative, value: soc });
        prop_assert_eq!(cell.negative().soc(), before);
    }
}

#[test]
fn exact_bounds_are_rejected() {
    let mut cell = preset("guo_2011").unwrap().default_cell().unwrap();
    for soc in [0.0, 1.0] {
        assert!(matches!(
            cell.electrode_mut(ElectrodeRole::Positive).set_soc(soc),
            Err(CellError::InvalidSoc { .. })
        ));
    }
}
