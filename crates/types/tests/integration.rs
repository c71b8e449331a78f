//! Integration tests for types

#[cfg(test)]
mod tests {
    use dlsim_types::*;

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&Mode::Detection).unwrap();
        assert_eq!(json, r#""detection""#);

        let deserialized: Mode = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, Mode::Detection);
    }

    #[test]
    fn test_vector_serializes_as_list() {
        let v = ResourceVector::from([3, 3, 2]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[3,3,2]");
    }

    #[test]
    fn test_report_counts() {
        let report = SimulationReport {
            mode: Mode::Detection,
            seed: 42,
            total: ResourceVector::from([1, 1]),
            available: ResourceVector::from([1, 1]),
            processes: vec![
                ProcessSummary {
                    id: ProcessId(0),
                    max_demand: ResourceVector::from([1, 1]),
                    state: ProcessState::Finished,
                    grants: 2,
                    waits: 1,
                },
                ProcessSummary {
                    id: ProcessId(1),
                    max_demand: ResourceVector::from([1, 1]),
                    state: ProcessState::Aborted,
                    grants: 1,
                    waits: 1,
                },
            ],
            cycles: vec![vec![ProcessId(0), ProcessId(1)]],
            victims: vec![ProcessId(1)],
            swept: vec![],
            duration_ms: 10,
        };
        assert_eq!(report.count(ProcessState::Finished), 1);
        assert_eq!(report.count(ProcessState::Aborted), 1);
        assert!(report.all_terminal());
    }

    #[test]
    fn test_color_choice_default() {
        assert_eq!(ColorChoice::default(), ColorChoice::Auto);
    }
}

#[cfg(test)]
mod proptests {
    use dlsim_types::ResourceVector;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn add_then_sub_is_identity(a in prop::collection::vec(0u32..1000, 3), b in prop::collection::vec(0u32..1000, 3)) {
            let a = ResourceVector::new(a);
            let b = ResourceVector::new(b);
            let sum = a.checked_add(&b).unwrap();
            prop_assert!(a.fits_within(&sum));
            prop_assert_eq!(sum.checked_sub(&b).unwrap(), a);
        }
    }
}
