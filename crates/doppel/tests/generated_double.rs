//! Behaviour of a generated double, end to end.
//!
//! `MockAccount` below is laid out exactly as `doppel` renders it for the
//! `Account` type: one call-record struct per method, a wrapper holding the
//! target by value, and one `MethodMock` per method. `balance` (from the
//! `Balance` impl on `Ledger`) and `post` are promoted through the `Deref`
//! field `ledger`; `label` is declared directly on `Account` and therefore
//! has no delegate.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use doppel::{registry, MethodKey, MethodMock, Scope, TestScope};
use proptest::prelude::*;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

// =============================================================================
// Target types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: Vec<i64>,
}

impl Ledger {
    pub fn post(&mut self, amount: i64, memo: &str) -> Result<usize, String> {
        if memo.is_empty() {
            return Err("memo required".to_string());
        }
        self.entries.push(amount);
        Ok(self.entries.len())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Account {
    ledger: Ledger,
    owner: String,
}

impl Account {
    pub fn label(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.owner)
    }
}

impl Deref for Account {
    type Target = Ledger;

    fn deref(&self) -> &Ledger {
        &self.ledger
    }
}

impl DerefMut for Account {
    fn deref_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

pub trait Balance {
    fn balance(&self) -> i64;
}

impl Balance for Ledger {
    fn balance(&self) -> i64 {
        self.entries.iter().sum()
    }
}

// =============================================================================
// Rendered double
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalanceCall {}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountLabelCall {
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountPostCall {
    pub amount: i64,
    pub memo: String,
}

pub struct MockAccount {
    inner: Account,
    balance_mock: ::doppel::MethodMock<AccountBalanceCall, i64>,
    label_mock: ::doppel::MethodMock<AccountLabelCall, String>,
    post_mock: ::doppel::MethodMock<AccountPostCall, Result<usize, String>>,
}

impl MockAccount {
    pub fn new(inner: Account) -> Self {
        Self {
            inner,
            balance_mock: ::doppel::MethodMock::new(
                ::doppel::MethodKey::of::<Account>("balance"),
                || Default::default(),
            ),
            label_mock: ::doppel::MethodMock::without_delegate(
                ::doppel::MethodKey::of::<Account>("label"),
                || Default::default(),
            ),
            post_mock: ::doppel::MethodMock::new(
                ::doppel::MethodKey::of::<Account>("post"),
                || Ok(Default::default()),
            ),
        }
    }

    pub fn inner(&self) -> &Account {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut Account {
        &mut self.inner
    }

    pub fn into_inner(self) -> Account {
        self.inner
    }

    pub fn balance(&self) -> i64 {
        let call = AccountBalanceCall {};
        self.balance_mock
            .invoke(call, |_call| self.inner.ledger.balance())
    }

    pub fn balance_mock(&self) -> &::doppel::MethodMock<AccountBalanceCall, i64> {
        &self.balance_mock
    }

    pub fn balance_return(&self, r0: i64) {
        self.balance_mock.return_values(r0);
    }

    pub fn label(&self, prefix: &str) -> String {
        let call = AccountLabelCall {
            prefix: ::std::borrow::ToOwned::to_owned(&*prefix),
        };
        self.label_mock.invoke_stubbed(call)
    }

    pub fn label_mock(&self) -> &::doppel::MethodMock<AccountLabelCall, String> {
        &self.label_mock
    }

    pub fn label_return(&self, r0: String) {
        self.label_mock.return_values(r0);
    }

    pub fn post(&mut self, amount: i64, memo: &str) -> Result<usize, String> {
        let call = AccountPostCall {
            amount,
            memo: ::std::borrow::ToOwned::to_owned(&*memo),
        };
        self.post_mock
            .invoke(call, |call| self.inner.ledger.post(call.amount, memo))
    }

    pub fn post_mock(&self) -> &::doppel::MethodMock<AccountPostCall, Result<usize, String>> {
        &self.post_mock
    }

    pub fn post_return(&self, r0: Result<usize, String>) {
        self.post_mock.return_values(r0);
    }
}

impl From<Account> for MockAccount {
    fn from(inner: Account) -> Self {
        Self::new(inner)
    }
}

impl Balance for MockAccount {
    fn balance(&self) -> i64 {
        Self::balance(self)
    }
}

// =============================================================================
// Helpers
// =============================================================================

// The all layer of `Account` is process-wide: tests that may reach it take
// this guard and start from an empty registry slot.
fn serial() -> MutexGuard<'static, ()> {
    static SERIAL: Mutex<()> = Mutex::new(());
    let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
    registry::reset_type::<Account>();
    guard
}

fn account(owner: &str, entries: &[i64]) -> Account {
    Account {
        ledger: Ledger {
            entries: entries.to_vec(),
        },
        owner: owner.to_string(),
    }
}

// =============================================================================
// Instance layer
// =============================================================================

#[test]
fn test_unconfigured_double_passes_through() {
    let _serial = serial();
    let mut mock = MockAccount::new(account("ana", &[10, 5]));
    assert_eq!(mock.balance(), 15);
    assert_eq!(mock.post(7, "tip"), Ok(3));
    assert_eq!(mock.post(1, ""), Err("memo required".to_string()));
    assert_eq!(mock.inner().ledger.entries, vec![10, 5, 7]);
    assert!(mock.balance_mock().calls().is_empty());
    assert!(mock.post_mock().calls().is_empty());
}

#[test]
fn test_stub_active_calls_are_all_recorded_in_order() {
    let _serial = serial();
    let mut mock = MockAccount::new(account("ana", &[]));
    mock.post_mock().stub();
    for i in 0..5 {
        let _ = mock.post(i, &format!("memo {i}"));
    }
    let calls = mock.post_mock().calls();
    assert_eq!(calls.len(), 5);
    for (i, call) in (0..5).zip(&calls) {
        assert_eq!(call.amount, i);
        assert_eq!(call.memo, format!("memo {i}"));
    }
    assert!(mock.inner().ledger.entries.is_empty());
}

#[test]
fn test_queued_results_drain_then_stick() {
    let _serial = serial();
    let mut mock = MockAccount::new(account("ana", &[]));
    mock.post_return(Ok(1));
    mock.post_return(Err("full".to_string()));
    assert_eq!(mock.post(1, "a"), Ok(1));
    assert_eq!(mock.post(2, "b"), Err("full".to_string()));
    assert_eq!(mock.post(3, "c"), Err("full".to_string()));
}

#[test]
fn test_stub_without_values_returns_defaults() {
    let _serial = serial();
    let mut mock = MockAccount::new(account("ana", &[1]));
    mock.balance_mock().stub();
    mock.post_mock().stub();
    assert_eq!(mock.balance(), 0);
    assert_eq!(mock.post(5, "x"), Ok(0));
    assert_eq!(mock.balance_mock().calls(), vec![AccountBalanceCall {}]);
    assert_eq!(mock.post_mock().calls().len(), 1);
}

#[test]
fn test_direct_method_without_delegate_is_always_stubbed() {
    let _serial = serial();
    let mock = MockAccount::new(account("ana", &[]));
    assert_eq!(mock.label("Ms. "), String::new());
    mock.label_return("Dr. ana".to_string());
    assert_eq!(mock.label("Dr. "), "Dr. ana");
    mock.label_mock().unstub();
    assert_eq!(mock.label("Mx. "), String::new());
    let prefixes: Vec<String> = mock
        .label_mock()
        .calls()
        .into_iter()
        .map(|c| c.prefix)
        .collect();
    assert_eq!(prefixes, vec!["Ms. ", "Dr. ", "Mx. "]);
    // The real method stays reachable through the wrapped value.
    assert_eq!(mock.inner().label("Ms. "), "Ms. ana");
}

#[test]
fn test_capability_impl_forwards_through_mock() {
    let _serial = serial();
    let mock = MockAccount::new(account("ana", &[4]));
    let as_trait: &dyn Balance = &mock;
    assert_eq!(as_trait.balance(), 4);
    mock.balance_return(100);
    assert_eq!(as_trait.balance(), 100);
    assert_eq!(mock.balance_mock().calls().len(), 1);
}

#[test]
fn test_bound_instance_configuration_reverts_with_subtest() {
    let _serial = serial();
    let mock = MockAccount::new(account("ana", &[2, 2]));
    let test = TestScope::new("test_bound_instance_configuration");
    test.run("subtest", |sub| {
        mock.balance_mock().bind_to(sub);
        mock.balance_return(-1);
        assert_eq!(mock.balance(), -1);
    });
    assert_eq!(mock.balance(), 4);
}

#[test]
fn test_into_inner_returns_wrapped_value() {
    let _serial = serial();
    let mut mock: MockAccount = account("bo", &[]).into();
    mock.inner_mut().owner = "cy".to_string();
    let back = mock.into_inner();
    assert_eq!(back.owner, "cy");
}

// =============================================================================
// All layer
// =============================================================================

#[test]
fn test_stub_all_records_on_all_layer_only() {
    let _serial = serial();
    let first = MockAccount::new(account("a", &[1]));
    let second = MockAccount::new(account("b", &[2]));
    let test = TestScope::new("test_stub_all");

    first.balance_mock().stub_all(&test);
    assert_eq!(first.balance(), 0);
    assert_eq!(second.balance(), 0);

    assert_eq!(first.balance_mock().all_calls().len(), 2);
    assert!(first.balance_mock().calls().is_empty());
    assert!(second.balance_mock().calls().is_empty());

    second.balance_mock().reset_all_calls();
    assert!(first.balance_mock().all_calls().is_empty());
}

#[test]
fn test_instance_configuration_does_not_leak_to_other_instances() {
    let _serial = serial();
    let configured = MockAccount::new(account("a", &[1]));
    let governed = MockAccount::new(account("b", &[2]));
    let test = TestScope::new("test_instance_isolation");

    configured.balance_mock().return_all(&test, 50);
    configured.balance_return(7);

    assert_eq!(configured.balance(), 7);
    assert_eq!(governed.balance(), 50);
    assert_eq!(configured.balance_mock().calls().len(), 1);
    assert_eq!(governed.balance_mock().all_calls().len(), 1);
}

#[test]
fn test_subtest_configuration_restores_enclosing_behaviour() {
    let _serial = serial();
    let mock = MockAccount::new(account("a", &[3]));
    let test = TestScope::new("test_restore");

    mock.balance_mock().return_all(&test, 10);
    test.run("override", |sub| {
        mock.balance_mock().return_all(sub, 20);
        assert_eq!(mock.balance(), 10);
        assert_eq!(mock.balance(), 20);
        mock.balance_mock().do_all(sub, None);
        assert_eq!(mock.balance(), 3);
    });
    // Back to what the enclosing test configured.
    assert_eq!(mock.balance(), 10);

    drop(test);
    assert_eq!(mock.balance(), 3);
}

#[test]
fn test_subtest_panic_still_restores() {
    let _serial = serial();
    let mock = MockAccount::new(account("a", &[9]));
    let test = TestScope::new("test_panic");
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        test.run("boom", |sub| {
            mock.balance_mock().stub_all(sub);
            assert_eq!(mock.balance(), 0);
            panic!("subtest failure");
        })
    }));
    assert!(outcome.is_err());
    assert_eq!(mock.balance(), 9);
}

#[test]
fn test_all_layer_created_lazily() {
    let _serial = serial();
    let key = MethodKey::of::<Account>("post");
    let mock = MockAccount::new(account("a", &[]));
    assert!(mock.post_mock().all_calls().is_empty());
    assert!(!registry::contains(&key));

    let test = TestScope::new("test_lazy");
    mock.post_mock().stub_all(&test);
    assert!(registry::contains(&key));
    assert_eq!(test.name(), "test_lazy");
}

#[test]
fn test_concurrent_all_layer_calls_are_all_recorded() {
    let _serial = serial();
    let mocks: Vec<MockAccount> = (0..8).map(|i| MockAccount::new(account("t", &[i]))).collect();
    let test = TestScope::new("test_concurrent_all");
    mocks[0].balance_mock().stub_all(&test);

    std::thread::scope(|s| {
        for mock in &mocks {
            s.spawn(move || mock.balance());
        }
    });
    assert_eq!(mocks[0].balance_mock().all_calls().len(), mocks.len());
}

// =============================================================================
// Concurrency properties
// =============================================================================

proptest! {
    /// N threads each calling once while stub-active leave exactly N records.
    #[test]
    fn prop_concurrent_calls_are_all_recorded(threads in 1usize..24) {
        let mock = MockAccount::new(account("p", &[]));
        mock.label_return("x".to_string());

        std::thread::scope(|s| {
            for i in 0..threads {
                let mock = &mock;
                s.spawn(move || mock.label(&i.to_string()));
            }
        });

        let calls = mock.label_mock().calls();
        prop_assert_eq!(calls.len(), threads);
        let mut seen: Vec<usize> = calls.iter().map(|c| c.prefix.parse().unwrap()).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..threads).collect::<Vec<_>>());
    }

    /// Every queued value is handed out exactly once across racing callers.
    #[test]
    fn prop_queue_dequeues_each_value_once(values in proptest::collection::vec(1i64..1000, 1..16)) {
        let mock = MockAccount::new(account("q", &[]));
        for v in &values {
            mock.balance_return(*v);
        }

        let got = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for _ in 0..values.len() {
                s.spawn(|| {
                    let v = mock.balance();
                    got.lock().unwrap().push(v);
                });
            }
        });

        let mut got = got.into_inner().unwrap();
        let mut expected = values.clone();
        got.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(got, expected);
    }
}

#[test]
fn test_method_mock_is_usable_without_a_double() {
    struct Standalone;
    let m: MethodMock<u8, u8> = MethodMock::new(MethodKey::of::<Standalone>("m"), || 0);
    assert_eq!(m.invoke(3, |c| c * 2), 6);
}
