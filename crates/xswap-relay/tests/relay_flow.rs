//! Cross swap from ledger A settled on ledger B through the relay.

mod common;

use common::{EID_A, EID_B, LostAck, NOW, RELAY_FEE, TwoLedgers};
use xswap_crypto::generate_nonce;
use xswap_relay::accounts::ENDPOINT_QUOTE_ACCOUNTS;
use xswap_relay::{LocalSubmitter, Relay, SubmitOutcome, SymbolMap, translate};
use xswap_types::constants::QUOTE_REMAINING_ACCOUNTS_COUNT;
use xswap_types::{
    CrossOrder, CrossSwapParams, Instruction, LzReceiveParams, Pubkey, SwapState, XswapError,
};

struct Trade {
    taker: Pubkey,
    params: CrossSwapParams,
}

fn trade(env: &TwoLedgers, maker_amount: u64) -> Trade {
    let taker = Pubkey::new_unique();
    let mint_a = env.a.mint;
    env.a
        .program
        .with(|p| {
            p.airdrop_lamports(&taker, 1_000_000)?;
            p.mint_tokens(&taker, &mint_a, 2_000).map(|_| ())
        })
        .unwrap()
        .unwrap();
    let order = CrossOrder {
        taker,
        dest_trader: Pubkey::new_unique(),
        maker_symbol: env.b.symbol,
        maker_asset: env.b.mint,
        taker_asset: mint_a,
        maker_amount,
        taker_amount: 2_000,
        nonce: generate_nonce(),
        expiry: u128::try_from(NOW + 600).unwrap(),
        dest_chain_id: EID_B,
    };
    let params = CrossSwapParams {
        signature: env.signer.sign_order(&order).unwrap().to_vec(),
        order,
        endpoint: env.a.network.endpoint_program,
    };
    Trade { taker, params }
}

/// The last packet A sent, as B should receive it.
fn delivery_for_b(env: &TwoLedgers) -> LzReceiveParams {
    let packet = env
        .a
        .program
        .read(|p| p.endpoint().sent().last().cloned())
        .unwrap()
        .unwrap();
    let mut symbols = SymbolMap::with_native().unwrap();
    symbols.insert(env.b.symbol, env.b.mint);
    translate(&packet, EID_A, env.a.portfolio, &symbols).unwrap()
}

#[tokio::test]
async fn cross_swap_settles_on_destination() {
    let env = TwoLedgers::new();
    env.fund_b(10_000);
    let Trade { taker, params } = trade(&env, 5_000);
    let order = params.order.clone();

    let outcome = env.relay_a().cross_swap(taker, params).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Applied { attempts: 1 });
    let (mint_a, mint_b) = (env.a.mint, env.b.mint);
    env.a
        .program
        .read(|p| {
            assert_eq!(p.token_balance(&taker, &mint_a).unwrap(), 0);
            assert_eq!(p.lamports(&taker), 1_000_000 - RELAY_FEE);
            assert_eq!(p.endpoint().sent().len(), 1);
        })
        .unwrap();

    let outcome = env
        .relay_b()
        .deliver(Pubkey::new_unique(), delivery_for_b(&env))
        .await
        .unwrap();
    assert_eq!(outcome, SubmitOutcome::Applied { attempts: 1 });
    env.b
        .program
        .read(|p| {
            assert_eq!(p.token_balance(&order.dest_trader, &mint_b).unwrap(), 5_000);
            assert_eq!(
                p.swap_state(&order.nonce, &order.dest_trader).unwrap(),
                SwapState::Completed
            );
            p.verify_vault_conservation().unwrap();
        })
        .unwrap();
}

#[tokio::test]
async fn short_destination_vault_queues_the_swap() {
    let env = TwoLedgers::new();
    env.fund_b(1_000);
    let Trade { taker, params } = trade(&env, 5_000);
    let order = params.order.clone();

    env.relay_a().cross_swap(taker, params).await.unwrap();
    let relay_b = env.relay_b();
    relay_b
        .deliver(Pubkey::new_unique(), delivery_for_b(&env))
        .await
        .unwrap();

    let pending = relay_b
        .orchestrator()
        .pending_swap(&order.nonce, &order.dest_trader)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.quantity, 5_000);
    assert_eq!(pending.token_mint, env.b.mint);
}

#[tokio::test]
async fn redelivery_is_rejected_as_replay() {
    let env = TwoLedgers::new();
    env.fund_b(10_000);
    let Trade { taker, params } = trade(&env, 100);
    env.relay_a().cross_swap(taker, params).await.unwrap();
    let delivery = delivery_for_b(&env);
    let relay_b = env.relay_b();

    relay_b.deliver(Pubkey::new_unique(), delivery.clone()).await.unwrap();
    let err = relay_b
        .deliver(Pubkey::new_unique(), delivery)
        .await
        .unwrap_err();
    assert!(matches!(err, XswapError::ReplayRejected { .. }));
}

#[tokio::test]
async fn lost_acknowledgement_reports_already_applied() {
    let env = TwoLedgers::new();
    let Trade { taker, params } = trade(&env, 100);
    let reader = TwoLedgers::reader(&env.a, env.libraries_a());
    let orchestrator = TwoLedgers::orchestrator(&env.a, reader);
    let relay = Relay::new(
        orchestrator,
        LostAck::new(LocalSubmitter::new(env.a.program.clone())),
        common::fast_retry(),
    );

    let outcome = relay.cross_swap(taker, params).await.unwrap();

    assert_eq!(outcome, SubmitOutcome::AlreadyApplied { attempts: 2 });
    let sent = env.a.program.read(|p| p.endpoint().sent().len()).unwrap();
    assert_eq!(sent, 1);
    let mint_a = env.a.mint;
    let balance = env
        .a
        .program
        .read(|p| p.token_balance(&taker, &mint_a).unwrap())
        .unwrap();
    assert_eq!(balance, 0);
}

#[tokio::test]
async fn submission_carries_planned_accounts() {
    let env = TwoLedgers::new();
    let Trade { taker, params } = trade(&env, 100);
    let relay = env.relay_a();

    let submission = relay.orchestrator().cross_swap(taker, params).await.unwrap();

    assert!(matches!(submission.instruction, Instruction::CrossSwap(_)));
    assert!(submission.remaining_accounts.len() > QUOTE_REMAINING_ACCOUNTS_COUNT);
    assert_eq!(submission.remaining_accounts[0].pubkey, env.a.network.endpoint_program);
    assert_eq!(submission.remaining_accounts[ENDPOINT_QUOTE_ACCOUNTS - 1].pubkey, env.uln);
    assert!(
        submission
            .remaining_accounts
            .iter()
            .any(|a| a.pubkey == taker && a.is_signer)
    );
}
