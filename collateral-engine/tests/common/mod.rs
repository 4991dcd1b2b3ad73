//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use collateral_engine::oracle::FeedError;
use collateral_engine::{
    AccountId, AssetId, AssetMover, Clock, CollateralEngine, Config, PriceFeed, RoundData,
    SyntheticToken, SystemRegistry, U256,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// $2000 at 8 decimals
pub const ETH_USD: i128 = 2000_0000_0000;
/// $1000 at 8 decimals
pub const BTC_USD: i128 = 1000_0000_0000;
/// Harness start time
pub const START: u64 = 1_700_000_000;

pub fn e18(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn user() -> AccountId {
    AccountId::new("user")
}

pub fn liquidator() -> AccountId {
    AccountId::new("liquidator")
}

pub fn weth() -> AssetId {
    AssetId::new("WETH")
}

pub fn wbtc() -> AssetId {
    AssetId::new("WBTC")
}

/// Settable clock
#[derive(Debug)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Round-based feed with 8 decimals
pub struct MockFeed {
    round: Mutex<RoundData>,
    unavailable: AtomicBool,
}

impl MockFeed {
    pub fn new(answer: i128, updated_at: u64) -> Self {
        Self {
            round: Mutex::new(RoundData {
                round_id: 1,
                answer,
                started_at: updated_at,
                updated_at,
                answered_in_round: 1,
            }),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Publish a new round
    pub fn update_answer(&self, answer: i128, updated_at: u64) {
        let mut round = self.round.lock();
        round.round_id += 1;
        round.answered_in_round = round.round_id;
        round.answer = answer;
        round.started_at = updated_at;
        round.updated_at = updated_at;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl PriceFeed for MockFeed {
    fn decimals(&self) -> u8 {
        8
    }

    fn description(&self) -> String {
        "MOCK / USD".to_string()
    }

    fn latest_round_data(&self) -> Result<RoundData, FeedError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FeedError("feed offline".to_string()));
        }
        Ok(*self.round.lock())
    }
}

type Hook = Box<dyn Fn() -> bool + Send + Sync>;

/// Fungible balances shared by the asset and token mocks
#[derive(Default)]
struct Balances(Mutex<HashMap<AccountId, U256>>);

impl Balances {
    fn of(&self, account: &AccountId) -> U256 {
        self.0.lock().get(account).copied().unwrap_or_default()
    }

    fn credit(&self, account: &AccountId, amount: U256) {
        *self.0.lock().entry(account.clone()).or_default() += amount;
    }

    fn move_funds(&self, from: &AccountId, to: &AccountId, amount: U256) -> bool {
        let mut balances = self.0.lock();
        let available = balances.get(from).copied().unwrap_or_default();
        if available < amount {
            return false;
        }
        balances.insert(from.clone(), available - amount);
        *balances.entry(to.clone()).or_default() += amount;
        true
    }

    fn destroy(&self, from: &AccountId, amount: U256) -> bool {
        let mut balances = self.0.lock();
        let available = balances.get(from).copied().unwrap_or_default();
        if available < amount {
            return false;
        }
        balances.insert(from.clone(), available - amount);
        true
    }
}

/// Collateral asset with wallet balances, failure switches and a call hook
pub struct MockMover {
    custody: AccountId,
    balances: Balances,
    fail_pull: AtomicBool,
    fail_push: AtomicBool,
    hook: Mutex<Option<Hook>>,
}

impl MockMover {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: Balances::default(),
            fail_pull: AtomicBool::new(false),
            fail_push: AtomicBool::new(false),
            hook: Mutex::new(None),
        }
    }

    pub fn fund(&self, account: &AccountId, amount: U256) {
        self.balances.credit(account, amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> U256 {
        self.balances.of(account)
    }

    pub fn set_fail_pull(&self, fail: bool) {
        self.fail_pull.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    /// Run `hook` inside every transfer; its return value becomes the transfer result
    pub fn set_hook(&self, hook: impl Fn() -> bool + Send + Sync + 'static) {
        *self.hook.lock() = Some(Box::new(hook));
    }

    fn run_hook(&self) -> bool {
        match self.hook.lock().as_ref() {
            Some(hook) => hook(),
            None => true,
        }
    }
}

impl AssetMover for MockMover {
    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: U256) -> bool {
        if !self.run_hook() || self.fail_pull.load(Ordering::SeqCst) {
            return false;
        }
        self.balances.move_funds(from, to, amount)
    }

    fn transfer(&self, to: &AccountId, amount: U256) -> bool {
        if !self.run_hook() || self.fail_push.load(Ordering::SeqCst) {
            return false;
        }
        self.balances.move_funds(&self.custody, to, amount)
    }
}

/// Synthetic token with balances and failure switches
pub struct MockToken {
    custody: AccountId,
    balances: Balances,
    supply: Mutex<U256>,
    fail_mint: AtomicBool,
    fail_burn: AtomicBool,
    fail_transfer: AtomicBool,
}

impl MockToken {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: Balances::default(),
            supply: Mutex::new(U256::zero()),
            fail_mint: AtomicBool::new(false),
            fail_burn: AtomicBool::new(false),
            fail_transfer: AtomicBool::new(false),
        }
    }

    pub fn balance_of(&self, account: &AccountId) -> U256 {
        self.balances.of(account)
    }

    pub fn total_supply(&self) -> U256 {
        *self.supply.lock()
    }

    pub fn set_fail_mint(&self, fail: bool) {
        self.fail_mint.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_burn(&self, fail: bool) {
        self.fail_burn.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_transfer(&self, fail: bool) {
        self.fail_transfer.store(fail, Ordering::SeqCst);
    }
}

impl SyntheticToken for MockToken {
    fn symbol(&self) -> String {
        "SYN".to_string()
    }

    fn mint(&self, to: &AccountId, amount: U256) -> bool {
        if self.fail_mint.load(Ordering::SeqCst) {
            return false;
        }
        self.balances.credit(to, amount);
        *self.supply.lock() += amount;
        true
    }

    fn burn(&self, amount: U256) -> bool {
        if self.fail_burn.load(Ordering::SeqCst) || !self.balances.destroy(&self.custody, amount) {
            return false;
        }
        *self.supply.lock() -= amount;
        true
    }

    fn transfer(&self, to: &AccountId, amount: U256) -> bool {
        if self.fail_transfer.load(Ordering::SeqCst) {
            return false;
        }
        self.balances.move_funds(&self.custody, to, amount)
    }

    fn transfer_from(&self, from: &AccountId, to: &AccountId, amount: U256) -> bool {
        if self.fail_transfer.load(Ordering::SeqCst) {
            return false;
        }
        self.balances.move_funds(from, to, amount)
    }
}

/// Engine wired to mocks: WETH at $2000, WBTC at $1000
pub struct Harness {
    pub engine: Arc<CollateralEngine>,
    pub clock: Arc<ManualClock>,
    pub weth_feed: Arc<MockFeed>,
    pub wbtc_feed: Arc<MockFeed>,
    pub weth: Arc<MockMover>,
    pub wbtc: Arc<MockMover>,
    pub token: Arc<MockToken>,
}

impl Harness {
    pub fn new() -> Self {
        let config = Config::default();
        let custody = AccountId::new(config.custody_account.clone());

        let clock = Arc::new(ManualClock::new(START));
        let weth_feed = Arc::new(MockFeed::new(ETH_USD, START));
        let wbtc_feed = Arc::new(MockFeed::new(BTC_USD, START));
        let weth_mover = Arc::new(MockMover::new(custody.clone()));
        let wbtc_mover = Arc::new(MockMover::new(custody.clone()));
        let token = Arc::new(MockToken::new(custody));

        let registry = SystemRegistry::new(
            vec![weth(), wbtc()],
            vec![
                weth_feed.clone() as Arc<dyn PriceFeed>,
                wbtc_feed.clone() as Arc<dyn PriceFeed>,
            ],
            vec![
                weth_mover.clone() as Arc<dyn AssetMover>,
                wbtc_mover.clone() as Arc<dyn AssetMover>,
            ],
            token.clone(),
            clock.clone(),
            &config,
        )
        .unwrap();

        let engine = Arc::new(CollateralEngine::new(registry, config).unwrap());

        for account in [user(), liquidator()] {
            weth_mover.fund(&account, e18(100));
            wbtc_mover.fund(&account, e18(100));
        }

        Self {
            engine,
            clock,
            weth_feed,
            wbtc_feed,
            weth: weth_mover,
            wbtc: wbtc_mover,
            token,
        }
    }

    /// User holds 10 WETH and 100 SYN of debt (health factor 100)
    pub fn with_user_position() -> Self {
        let harness = Self::new();
        harness
            .engine
            .deposit_and_mint(&user(), &weth(), e18(10), e18(100))
            .unwrap();
        harness
    }

    /// Move the WETH price at the current clock time
    pub fn set_eth_price(&self, answer: i128) {
        self.weth_feed.update_answer(answer, self.clock.now());
    }
}
