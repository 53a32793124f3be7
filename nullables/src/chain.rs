//! Nullable chain: scripted chain state with a submission log.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use elector_toolchain::{BocFile, ChainQuery, ToolError};
use elector_types::{AccountAddress, ElectionTiming, Nanotons, StakeBounds};

use crate::injected;

struct ChainState {
    elector: AccountAddress,
    active_election: u64,
    timing: ElectionTiming,
    bounds: StakeBounds,
    balances: HashMap<AccountAddress, Nanotons>,
    seqnos: HashMap<AccountAddress, u32>,
    staked: HashMap<String, Nanotons>,
    rewards: HashMap<String, Nanotons>,
    last_seqno_query: Option<AccountAddress>,
    submitted: Vec<BocFile>,
    calls: Vec<&'static str>,
    failing_methods: HashSet<&'static str>,
    failing_accounts: HashSet<AccountAddress>,
}

/// A deterministic [`ChainQuery`].
///
/// Every query reads scripted state. A submission bumps the seqno of the
/// wallet whose seqno was read last, which is how a wallet contract
/// behaves once the transfer built from that seqno lands.
pub struct NullChain {
    state: Mutex<ChainState>,
}

impl NullChain {
    pub const ELECTOR: AccountAddress = AccountAddress::new(-1, [0x33; 32]);

    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                elector: Self::ELECTOR,
                active_election: 0,
                timing: ElectionTiming {
                    validators_elected_for: 65_536,
                    elections_start_before: 32_768,
                    elections_end_before: 8_192,
                    stake_held_for: 32_768,
                },
                bounds: StakeBounds {
                    min_stake: Nanotons::from_coins(10_000),
                    max_stake: Nanotons::from_coins(10_000_000),
                    min_total_stake: Nanotons::from_coins(100_000),
                    max_stake_factor: 196_608,
                },
                balances: HashMap::new(),
                seqnos: HashMap::new(),
                staked: HashMap::new(),
                rewards: HashMap::new(),
                last_seqno_query: None,
                submitted: Vec::new(),
                calls: Vec::new(),
                failing_methods: HashSet::new(),
                failing_accounts: HashSet::new(),
            }),
        }
    }

    /// Active election id as the elector reports it; 0 for none.
    pub fn set_active_election(&self, id: u64) {
        self.state.lock().unwrap().active_election = id;
    }

    pub fn set_timing(&self, timing: ElectionTiming) {
        self.state.lock().unwrap().timing = timing;
    }

    pub fn set_bounds(&self, bounds: StakeBounds) {
        self.state.lock().unwrap().bounds = bounds;
    }

    pub fn set_balance(&self, account: AccountAddress, balance: Nanotons) {
        self.state.lock().unwrap().balances.insert(account, balance);
    }

    pub fn set_seqno(&self, account: AccountAddress, seqno: u32) {
        self.state.lock().unwrap().seqnos.insert(account, seqno);
    }

    /// Stake the elector holds for a validator public key (hex).
    pub fn set_staked(&self, public_key_hex: &str, amount: Nanotons) {
        self.state
            .lock()
            .unwrap()
            .staked
            .insert(public_key_hex.to_string(), amount);
    }

    /// Reward the elector would return to an account hash (hex).
    pub fn set_reward(&self, account_hash_hex: &str, amount: Nanotons) {
        self.state
            .lock()
            .unwrap()
            .rewards
            .insert(account_hash_hex.to_string(), amount);
    }

    /// Make every call of `method` (a [`ChainQuery`] method name) fail.
    pub fn fail_method(&self, method: &'static str) {
        self.state.lock().unwrap().failing_methods.insert(method);
    }

    /// Make balance and seqno queries for `account` fail.
    pub fn fail_account(&self, account: AccountAddress) {
        self.state.lock().unwrap().failing_accounts.insert(account);
    }

    pub fn submitted(&self) -> Vec<BocFile> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == method)
            .count()
    }

    fn enter(
        &self,
        method: &'static str,
        account: Option<&AccountAddress>,
    ) -> Result<std::sync::MutexGuard<'_, ChainState>, ToolError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method);
        if state.failing_methods.contains(method)
            || account.is_some_and(|a| state.failing_accounts.contains(a))
        {
            return Err(injected("lite-client"));
        }
        Ok(state)
    }
}

impl Default for NullChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainQuery for NullChain {
    fn elector_address(&self) -> Result<AccountAddress, ToolError> {
        Ok(self.enter("elector_address", None)?.elector)
    }

    fn active_election_id(&self, _elector: &AccountAddress) -> Result<u64, ToolError> {
        Ok(self.enter("active_election_id", None)?.active_election)
    }

    fn election_timing(&self) -> Result<ElectionTiming, ToolError> {
        Ok(self.enter("election_timing", None)?.timing)
    }

    fn stake_bounds(&self) -> Result<StakeBounds, ToolError> {
        Ok(self.enter("stake_bounds", None)?.bounds)
    }

    fn account_balance(&self, account: &AccountAddress) -> Result<Nanotons, ToolError> {
        let state = self.enter("account_balance", Some(account))?;
        Ok(state.balances.get(account).copied().unwrap_or_default())
    }

    fn wallet_seqno(&self, wallet: &AccountAddress) -> Result<u32, ToolError> {
        let mut state = self.enter("wallet_seqno", Some(wallet))?;
        state.last_seqno_query = Some(*wallet);
        Ok(state.seqnos.get(wallet).copied().unwrap_or_default())
    }

    fn staked_amount(
        &self,
        _elector: &AccountAddress,
        public_key_hex: &str,
    ) -> Result<Nanotons, ToolError> {
        let state = self.enter("staked_amount", None)?;
        Ok(state.staked.get(public_key_hex).copied().unwrap_or_default())
    }

    fn claimable_reward(
        &self,
        _elector: &AccountAddress,
        account_hash_hex: &str,
    ) -> Result<Nanotons, ToolError> {
        let state = self.enter("claimable_reward", None)?;
        Ok(state.rewards.get(account_hash_hex).copied().unwrap_or_default())
    }

    fn submit(&self, message: &BocFile) -> Result<(), ToolError> {
        let mut state = self.enter("submit", None)?;
        state.submitted.push(message.clone());
        if let Some(wallet) = state.last_seqno_query {
            *state.seqnos.entry(wallet).or_default() += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_advances_last_queried_wallet() {
        let chain = NullChain::new();
        let wallet = AccountAddress::new(0, [1; 32]);
        chain.set_seqno(wallet, 4);
        assert_eq!(chain.wallet_seqno(&wallet).unwrap(), 4);
        chain.submit(&BocFile::new("a.boc")).unwrap();
        assert_eq!(chain.wallet_seqno(&wallet).unwrap(), 5);
        assert_eq!(chain.call_count("wallet_seqno"), 2);
    }

    #[test]
    fn failing_account_only_affects_that_account() {
        let chain = NullChain::new();
        let bad = AccountAddress::new(0, [1; 32]);
        let good = AccountAddress::new(0, [2; 32]);
        chain.fail_account(bad);
        assert!(chain.account_balance(&bad).is_err());
        assert!(chain.account_balance(&good).is_ok());
    }
}
