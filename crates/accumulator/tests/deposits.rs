//! Deposit registration commutes across chains and depositors.

use alloy_primitives::{Address, U256};
use omni_accumulator::JobAccumulator;
use proptest::prelude::*;

fn register_all(deposits: &[(u64, u8, u64)]) -> JobAccumulator {
    let mut accumulator = JobAccumulator::new(Address::repeat_byte(0xaa));
    accumulator.initialize(U256::from(1), Address::ZERO).unwrap();
    for (chain_id, depositor, amount) in deposits {
        accumulator
            .register_deposit(
                U256::from(1),
                *chain_id,
                Address::repeat_byte(*depositor),
                U256::from(*amount),
            )
            .unwrap();
    }
    accumulator
}

#[test]
fn test_two_chain_deposits_commute() {
    let forward = register_all(&[(10, 1, 10), (137, 2, 5)]);
    let backward = register_all(&[(137, 2, 5), (10, 1, 10)]);

    assert_eq!(forward, backward);
    let state = forward.job(U256::from(1)).unwrap();
    assert_eq!(state.received, U256::from(15));
    assert_eq!(state.source_chains.iter().copied().collect::<Vec<_>>(), vec![10, 137]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn fuzz_deposit_order_is_irrelevant(
        deposits in prop::collection::vec((1u64..6, 1u8..4, 1u64..1_000_000), 1..24),
        seed in any::<u64>(),
    ) {
        let mut shuffled = deposits.clone();
        let len = shuffled.len();
        for i in (1..len).rev() {
            let j = (seed.rotate_left(i as u32) as usize) % (i + 1);
            shuffled.swap(i, j);
        }

        let ordered = register_all(&deposits);
        let reordered = register_all(&shuffled);
        prop_assert_eq!(&ordered, &reordered);

        let total: u64 = deposits.iter().map(|(_, _, amount)| amount).sum();
        prop_assert_eq!(ordered.job(U256::from(1)).unwrap().received, U256::from(total));
    }
}
