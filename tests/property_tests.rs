//! Randomized connect/disconnect/switch sequences. The session invariants
//! must hold after every step, and a reload must always start disconnected.

mod common;

use common::*;
use cribwallet::session::PersistedSession;
use cribwallet::{
    ActiveWallet, ConnectionStatus, SessionConfig, SessionStorage, WalletKind, WalletSession,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Connect(WalletKind),
    Disconnect(WalletKind),
    Switch(WalletKind),
    /// Toggle whether the next connect of this wallet succeeds.
    Break(WalletKind),
    Refresh,
}

fn kind() -> impl Strategy<Value = WalletKind> {
    prop_oneof![Just(WalletKind::Metamask), Just(WalletKind::Gem)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => kind().prop_map(Op::Connect),
        2 => kind().prop_map(Op::Disconnect),
        2 => kind().prop_map(Op::Switch),
        1 => kind().prop_map(Op::Break),
        1 => Just(Op::Refresh),
    ]
}

fn active() -> impl Strategy<Value = ActiveWallet> {
    prop_oneof![Just(ActiveWallet::None), Just(ActiveWallet::Metamask), Just(ActiveWallet::Gem)]
}

fn persisted() -> impl Strategy<Value = PersistedSession> {
    (
        active(),
        proptest::option::of("0x[0-9a-f]{4}"),
        any::<bool>(),
        proptest::option::of("r[1-9A-HJ-NP-Za-km-z]{24}"),
        any::<bool>(),
    )
        .prop_map(|(active_wallet, mm, mm_on, gem, gem_on)| PersistedSession {
            active_wallet,
            metamask_address: mm,
            metamask_balance: Some("1.0000".into()),
            metamask_connected: mm_on,
            gem_address: gem,
            gem_balance: None,
            gem_connected: gem_on,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_under_random_interleavings(ops in prop::collection::vec(op(), 1..40)) {
        run_local(async {
            let (h, evm, gem) = both_wallets(SessionConfig::new());
            let mut evm_broken = false;

            for op in &ops {
                match op {
                    Op::Connect(WalletKind::Metamask) => {
                        let result = h.manager.connect_metamask().await;
                        assert_eq!(result.is_ok(), !evm_broken);
                    }
                    Op::Connect(WalletKind::Gem) => {
                        let result = h.manager.connect_gem().await;
                        assert_eq!(result.is_ok(), gem.installed.get());
                    }
                    Op::Disconnect(kind) => {
                        h.manager.disconnect(*kind);
                        assert!(!h.manager.session().is_connected(*kind));
                    }
                    Op::Switch(kind) => {
                        let connected = h.manager.session().is_connected(*kind);
                        assert_eq!(h.manager.switch_wallet(*kind).is_ok(), connected);
                    }
                    Op::Break(WalletKind::Metamask) => {
                        evm_broken = !evm_broken;
                        let accounts = if evm_broken {
                            Err(cribwallet::ProviderError::user_rejected())
                        } else {
                            Ok(serde_json::json!([EVM_ADDRESS]))
                        };
                        evm.respond("eth_requestAccounts", accounts);
                    }
                    Op::Break(WalletKind::Gem) => gem.installed.set(!gem.installed.get()),
                    Op::Refresh => h.manager.refresh_balances().await,
                }

                let session = h.manager.session();
                assert_eq!(session.check_invariants(), Ok(()), "after {op:?}");
                if let Some(active) = session.active_wallet.kind() {
                    assert!(session.is_connected(active));
                }
                assert!(h.manager.history().len() <= 10);
                if !session.any_connected() {
                    assert!(h.storage.get("walletHistory").unwrap().is_none());
                    assert!(h.storage.get("walletSession").unwrap().is_none());
                    assert!(h.manager.history().is_empty());
                }
            }

            // Reload from whatever was persisted
            let reloaded = HarnessBuilder::new(SessionConfig::new()).storage(h.storage.clone()).build();
            reloaded.manager.hydrate();
            let session = reloaded.manager.session();
            assert_eq!(session.connection_status, ConnectionStatus::Disconnected);
            assert_eq!(session.check_invariants(), Ok(()));
            assert_eq!(
                session.connected_kinds(),
                h.manager.session().connected_kinds(),
            );
        });
    }

    #[test]
    fn hydrated_sessions_are_consistent(persisted in persisted()) {
        let session = WalletSession::from_persisted(persisted.clone());

        prop_assert_eq!(session.connection_status, ConnectionStatus::Disconnected);
        prop_assert_eq!(session.last_error.clone(), None);
        prop_assert!(session.check_invariants().is_ok());
        prop_assert_eq!(
            session.is_connected(WalletKind::Metamask),
            persisted.metamask_connected && persisted.metamask_address.is_some()
        );
        prop_assert_eq!(
            session.is_connected(WalletKind::Gem),
            persisted.gem_connected && persisted.gem_address.is_some()
        );
        prop_assert_eq!(session.pending_restores(), session.connected_kinds());
    }

    #[test]
    fn pure_transitions_keep_invariants(
        steps in prop::collection::vec((0u8..5, kind()), 1..60)
    ) {
        let mut session = WalletSession::new();
        for (step, kind) in steps {
            match step {
                0 => {
                    session.begin_connect();
                    session.complete_connect(kind, format!("{kind}-addr"), Some("1".into()));
                }
                1 => {
                    session.begin_connect();
                    session.fail_connect("nope");
                }
                2 => {
                    session.disconnect(kind);
                }
                3 => {
                    let _ = session.switch_to(kind);
                }
                _ => {
                    session.set_balance(kind, "2");
                }
            }
            prop_assert!(session.check_invariants().is_ok(), "{:?}", session);
        }
    }
}
