//! Property tests for ledger conservation

use dlsim_resources::{Delta, ResourceLedger};
use dlsim_types::{ProcessId, ResourceVector};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Acquire(usize, Vec<u32>),
    Release(usize, Vec<u32>),
    ReleaseAll(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, prop::collection::vec(0u32..4, 3)).prop_map(|(p, v)| Op::Acquire(p, v)),
        (0usize..4, prop::collection::vec(0u32..4, 3)).prop_map(|(p, v)| Op::Release(p, v)),
        (0usize..4).prop_map(Op::ReleaseAll),
    ]
}

proptest! {
    #[test]
    fn every_commit_conserves_units(ops in prop::collection::vec(op(), 1..64)) {
        let total = ResourceVector::from([5, 4, 6]);
        let mut ledger = ResourceLedger::new(total.clone(), 4);

        for op in ops {
            let before = ledger.snapshot();
            let result = match &op {
                Op::Acquire(p, v) => {
                    ledger.commit(ProcessId(*p), Delta::Acquire(&ResourceVector::new(v.clone())))
                }
                Op::Release(p, v) => {
                    ledger.commit(ProcessId(*p), Delta::Release(&ResourceVector::new(v.clone())))
                }
                Op::ReleaseAll(p) => ledger.release_all(ProcessId(*p)).map(|_| ()),
            };

            prop_assert!(ledger.check_conservation().is_ok());
            if result.is_err() {
                // Rejected commits must not leave partial updates behind.
                prop_assert_eq!(ledger.snapshot(), before);
            }
            prop_assert!(ledger.available().fits_within(&total));
        }
    }
}
