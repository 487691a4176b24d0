//! Job lifecycles driven through funding, approval, execution and refund.

use alloy_primitives::{address, bytes, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use omni_accumulator::{
    test_utils::{memory_contexts, MemoryContexts, Responder},
    AccumulatorError, Call, ChainCalls, JobAccumulator, JobStatus, IERC20,
};

const APPROVER: Address = address!("00000000000000000000000000000000000000aa");
const TOKEN: Address = address!("00000000000000000000000000000000000000e2");
const TARGET: Address = address!("000000000000000000000000000000000000000c");
const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0000000000000000000000000000000000000b0b");

fn job() -> U256 {
    U256::from(1)
}

/// initialize → deposits of 60 on chain 10 and 40 on chain 137 → accumulated at 100.
fn accumulated(input_token: Address) -> JobAccumulator {
    let mut accumulator = JobAccumulator::new(APPROVER);
    accumulator.initialize(job(), input_token).unwrap();
    accumulator.register_deposit(job(), 10, ALICE, U256::from(60)).unwrap();
    accumulator.register_deposit(job(), 137, BOB, U256::from(40)).unwrap();
    accumulator.mark_accumulated(job(), U256::from(100)).unwrap();
    accumulator
}

fn contexts() -> MemoryContexts {
    memory_contexts(&[10, 137], 5_000_000)
}

/// Contexts where `TOKEN` is deployed on both chains and answers every call with `responder`.
fn token_contexts(responder: Responder) -> MemoryContexts {
    let mut contexts = contexts();
    for ledger in contexts.values_mut() {
        ledger.respond(TOKEN, responder.clone());
    }
    contexts
}

fn call(target: Address, data: Bytes) -> Call {
    Call { target, value: U256::ZERO, data }
}

#[test]
fn test_execute_success() {
    let mut accumulator = accumulated(TOKEN);
    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Accumulated);
    accumulator.approve(APPROVER, job()).unwrap();

    let mut contexts = contexts();
    let chain_calls = [ChainCalls { chainId: 10, calls: vec![call(TARGET, bytes!("abcd"))] }];
    accumulator.execute(job(), &chain_calls, &mut contexts).unwrap();

    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Executed);
    let journal = contexts[&10].journal();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].target, TARGET);
    assert_eq!(journal[0].input, bytes!("abcd"));
    assert_eq!(journal[0].gas_limit, 5_000_000);
    assert_eq!(contexts[&10].open_checkpoints(), 0);
}

#[test]
fn test_execute_revert_keeps_job_accumulated() {
    let mut accumulator = accumulated(TOKEN);
    accumulator.approve(APPROVER, job()).unwrap();

    let mut contexts = contexts();
    contexts.get_mut(&10).unwrap().respond(TARGET, Responder::Revert(bytes!("dead")));
    let chain_calls = [ChainCalls { chainId: 10, calls: vec![call(TARGET, bytes!("abcd"))] }];

    assert_eq!(
        accumulator.execute(job(), &chain_calls, &mut contexts),
        Err(AccumulatorError::CallFailed {
            chain_id: 10,
            call_index: 0,
            revert_data: bytes!("dead")
        })
    );
    let state = accumulator.job(job()).unwrap();
    assert_eq!(state.status, JobStatus::Accumulated);
    assert_eq!(state.received, U256::from(100));
}

#[test]
fn test_execute_rolls_back_every_chain() {
    let mut accumulator = accumulated(TOKEN);
    accumulator.approve(APPROVER, job()).unwrap();

    let failing = Address::repeat_byte(0xfa);
    let mut contexts = contexts();
    contexts.get_mut(&137).unwrap().respond(failing, Responder::Revert(bytes!("01")));
    let chain_calls = [
        ChainCalls {
            chainId: 10,
            calls: vec![call(TARGET, bytes!("01")), call(TARGET, bytes!("02"))],
        },
        ChainCalls {
            chainId: 137,
            calls: vec![call(TARGET, bytes!("03")), call(failing, bytes!("04"))],
        },
    ];

    let err = accumulator.execute(job(), &chain_calls, &mut contexts).unwrap_err();
    assert!(matches!(err, AccumulatorError::CallFailed { chain_id: 137, call_index: 1, .. }));
    assert!(contexts[&10].journal().is_empty());
    assert!(contexts[&137].journal().is_empty());
    assert_eq!(contexts[&10].open_checkpoints(), 0);
}

#[test]
fn test_execute_preserves_declared_order() {
    let mut accumulator = accumulated(TOKEN);
    accumulator.approve(APPROVER, job()).unwrap();

    let mut contexts = contexts();
    let chain_calls = [ChainCalls {
        chainId: 10,
        calls: (0u8..5).map(|i| call(TARGET, Bytes::from(vec![i]))).collect(),
    }];
    accumulator.execute(job(), &chain_calls, &mut contexts).unwrap();

    let inputs: Vec<_> = contexts[&10].journal().iter().map(|entry| entry.input.clone()).collect();
    assert_eq!(inputs, (0u8..5).map(|i| Bytes::from(vec![i])).collect::<Vec<_>>());
}

#[test]
fn test_execute_revert_data_is_bounded() {
    let mut accumulator = accumulated(TOKEN).with_max_revert_data_len(8);
    accumulator.approve(APPROVER, job()).unwrap();

    let mut contexts = contexts();
    contexts.get_mut(&10).unwrap().respond(TARGET, Responder::Revert(vec![0xee; 10_000].into()));
    let chain_calls = [ChainCalls { chainId: 10, calls: vec![call(TARGET, Bytes::new())] }];

    let Err(AccumulatorError::CallFailed { revert_data, .. }) =
        accumulator.execute(job(), &chain_calls, &mut contexts)
    else {
        panic!("expected CallFailed");
    };
    assert_eq!(revert_data, Bytes::from(vec![0xee; 8]));
}

#[test]
fn test_execute_after_executed() {
    let mut accumulator = accumulated(TOKEN);
    accumulator.approve(APPROVER, job()).unwrap();
    accumulator.execute(job(), &[], &mut contexts()).unwrap();

    assert!(matches!(
        accumulator.execute(job(), &[], &mut contexts()),
        Err(AccumulatorError::InvalidTransition { from: JobStatus::Executed, .. })
    ));
    assert!(matches!(
        accumulator.refund(job(), &mut contexts()),
        Err(AccumulatorError::InvalidTransition { from: JobStatus::Executed, .. })
    ));
}

#[test]
fn test_refund_before_threshold_then_execute() {
    let mut accumulator = JobAccumulator::new(APPROVER);
    accumulator.initialize(job(), Address::ZERO).unwrap();
    accumulator.register_deposit(job(), 10, ALICE, U256::from(60)).unwrap();

    let mut contexts = contexts();
    accumulator.refund(job(), &mut contexts).unwrap();
    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Refunded);
    assert_eq!(contexts[&10].balance(ALICE), U256::from(60));

    assert!(matches!(
        accumulator.execute(job(), &[], &mut contexts),
        Err(AccumulatorError::InvalidTransition { from: JobStatus::Refunded, .. })
    ));
}

#[test]
fn test_refund_token_deposits() {
    let mut accumulator = accumulated(TOKEN);
    let mut contexts = token_contexts(Responder::erc20_success());

    accumulator.refund(job(), &mut contexts).unwrap();

    let on_10 = contexts[&10].journal();
    assert_eq!(on_10.len(), 1);
    assert_eq!(on_10[0].target, TOKEN);
    assert_eq!(on_10[0].value, U256::ZERO);
    let transfer = IERC20::transferCall::abi_decode(&on_10[0].input, true).unwrap();
    assert_eq!((transfer.to, transfer.amount), (ALICE, U256::from(60)));

    let transfer = IERC20::transferCall::abi_decode(&contexts[&137].journal()[0].input, true).unwrap();
    assert_eq!((transfer.to, transfer.amount), (BOB, U256::from(40)));
}

#[test]
fn test_refund_token_returning_false_is_atomic() {
    let mut accumulator = accumulated(TOKEN);
    let mut contexts = token_contexts(Responder::erc20_success());
    contexts.get_mut(&137).unwrap().respond(TOKEN, Responder::erc20_false());

    let err = accumulator.refund(job(), &mut contexts).unwrap_err();
    assert!(matches!(
        err,
        AccumulatorError::RefundFailed { chain_id: 137, depositor: BOB, .. }
    ));
    assert!(contexts[&10].journal().is_empty());
    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Accumulated);
}

#[test]
fn test_refund_token_with_small_revert_bound() {
    let mut accumulator = accumulated(TOKEN).with_max_revert_data_len(4);
    let mut contexts = token_contexts(Responder::erc20_success());

    accumulator.refund(job(), &mut contexts).unwrap();

    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Refunded);
    assert_eq!(contexts[&10].journal().len(), 1);
    assert_eq!(contexts[&137].journal().len(), 1);
}

#[test]
fn test_refund_token_returning_nothing() {
    let mut accumulator = accumulated(TOKEN);
    let mut contexts = token_contexts(Responder::Return(Bytes::new()));

    accumulator.refund(job(), &mut contexts).unwrap();
    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Refunded);
}

#[test]
fn test_refund_to_token_without_code_is_atomic() {
    let mut accumulator = accumulated(TOKEN);
    let mut contexts = contexts();

    let err = accumulator.refund(job(), &mut contexts).unwrap_err();
    assert_eq!(
        err,
        AccumulatorError::RefundFailed { chain_id: 10, depositor: ALICE, revert_data: Bytes::new() }
    );
    assert_eq!(accumulator.job(job()).unwrap().status, JobStatus::Accumulated);
    assert!(contexts.values().all(|ledger| ledger.journal().is_empty()));
    assert!(contexts.values().all(|ledger| ledger.open_checkpoints() == 0));

    // Deployed on chain 10 only: the transfer there is rolled back when chain 137 fails.
    contexts.get_mut(&10).unwrap().respond(TOKEN, Responder::erc20_success());
    let err = accumulator.refund(job(), &mut contexts).unwrap_err();
    assert!(matches!(err, AccumulatorError::RefundFailed { chain_id: 137, depositor: BOB, .. }));
    assert!(contexts[&10].journal().is_empty());
}

#[test]
fn test_token_revert_data_is_bounded() {
    let mut accumulator = accumulated(TOKEN).with_max_revert_data_len(4);
    let mut contexts = token_contexts(Responder::Revert(vec![0xab; 64].into()));

    let err = accumulator.refund(job(), &mut contexts).unwrap_err();
    assert_eq!(
        err,
        AccumulatorError::RefundFailed {
            chain_id: 10,
            depositor: ALICE,
            revert_data: Bytes::from(vec![0xab; 4]),
        }
    );
}
