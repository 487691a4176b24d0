use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;

use crate::{CallHost, ChainId};

/// How a scripted callee answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Responder {
    /// Succeed with this return data.
    Return(Bytes),
    /// Revert with this payload.
    Revert(Bytes),
}

impl Responder {
    /// A token whose `transfer` returns `true`.
    pub fn erc20_success() -> Self {
        Self::Return(true.abi_encode().into())
    }

    /// A token whose `transfer` returns `false` without reverting.
    pub fn erc20_false() -> Self {
        Self::Return(false.abi_encode().into())
    }
}

/// A call recorded by [`MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Callee.
    pub target: Address,
    /// Value sent.
    pub value: U256,
    /// Calldata.
    pub input: Bytes,
    /// Gas forwarded.
    pub gas_limit: u64,
}

/// An in-memory [`CallHost`] with scripted callees.
///
/// Scripted callees are contracts. Callees without a script behave like accounts without code:
/// calls to them succeed with empty return data. Successful calls are journaled and credit their
/// value to the callee; both are rolled back by [`CallHost::checkpoint_revert`].
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    gas_left: u64,
    responders: HashMap<Address, Responder>,
    journal: Vec<JournalEntry>,
    balances: HashMap<Address, U256>,
    return_data: Bytes,
    checkpoints: Vec<(usize, HashMap<Address, U256>)>,
}

impl MemoryLedger {
    /// Creates a ledger whose frame has `gas_left` gas.
    pub fn new(gas_left: u64) -> Self {
        Self { gas_left, ..Default::default() }
    }

    /// Scripts the answer of `target`.
    pub fn respond(&mut self, target: Address, responder: Responder) {
        self.responders.insert(target, responder);
    }

    /// Scripts the answer of `target`.
    pub fn responder(mut self, target: Address, responder: Responder) -> Self {
        self.respond(target, responder);
        self
    }

    /// Successful calls that are not rolled back, in order.
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Value credited to `address`.
    pub fn balance(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Number of unresolved checkpoints.
    pub fn open_checkpoints(&self) -> usize {
        self.checkpoints.len()
    }
}

impl CallHost for MemoryLedger {
    type Checkpoint = usize;

    fn call(&mut self, target: Address, value: U256, input: &[u8], gas_limit: u64) -> bool {
        match self.responders.get(&target).cloned() {
            Some(Responder::Revert(data)) => {
                self.return_data = data;
                false
            }
            Some(Responder::Return(data)) => {
                self.record(target, value, input, gas_limit);
                self.return_data = data;
                true
            }
            None => {
                self.record(target, value, input, gas_limit);
                self.return_data = Bytes::new();
                true
            }
        }
    }

    fn return_data(&self) -> &[u8] {
        &self.return_data
    }

    fn gas_left(&self) -> u64 {
        self.gas_left
    }

    fn code_size(&self, address: Address) -> usize {
        usize::from(self.responders.contains_key(&address))
    }

    fn checkpoint(&mut self) -> usize {
        self.checkpoints.push((self.journal.len(), self.balances.clone()));
        self.checkpoints.len() - 1
    }

    fn checkpoint_commit(&mut self, checkpoint: usize) {
        self.checkpoints.truncate(checkpoint);
    }

    fn checkpoint_revert(&mut self, checkpoint: usize) {
        if let Some((journal_len, balances)) = self.checkpoints.get(checkpoint).cloned() {
            self.journal.truncate(journal_len);
            self.balances = balances;
        }
        self.checkpoints.truncate(checkpoint);
    }
}

impl MemoryLedger {
    fn record(&mut self, target: Address, value: U256, input: &[u8], gas_limit: u64) {
        *self.balances.entry(target).or_default() += value;
        self.journal.push(JournalEntry {
            target,
            value,
            input: Bytes::copy_from_slice(input),
            gas_limit,
        });
    }
}

/// Execution contexts backed by [`MemoryLedger`]s.
pub type MemoryContexts = BTreeMap<ChainId, MemoryLedger>;

/// One empty ledger with `gas_left` gas for each chain in `chain_ids`.
pub fn memory_contexts(chain_ids: &[ChainId], gas_left: u64) -> MemoryContexts {
    chain_ids.iter().map(|chain_id| (*chain_id, MemoryLedger::new(gas_left))).collect()
}
