//! Inbound transfers and the pending-swap queue, end to end.

mod common;

use common::{Harness, NOW, REMOTE_EID};
use rust_decimal::Decimal;
use xswap_crypto::generate_nonce;
use xswap_ledger::VaultKind;
use xswap_types::constants::{NATIVE_VAULT_MIN_THRESHOLD, PENDING_SWAP_RENT};
use xswap_types::{
    AddDestinationParams, CrossOrder, CrossSwapParams, Nonce, Order, ProtocolEvent, Pubkey,
    QueueAction, RemoveFromSwapQueueParams, SwapKeyParams, SwapParams, SwapState, Symbol, Tx,
    UpdateSwapExpiryParams, XswapError,
};

fn key(nonce: Nonce, trader: Pubkey) -> SwapKeyParams {
    SwapKeyParams { nonce, trader }
}

// =========================================================================
// Queueing
// =========================================================================

#[test]
fn covered_trade_pays_immediately_and_marks_completed() {
    let mut h = Harness::new();
    h.fund_token_vault(10_000);
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();

    h.receive_trade(trader, 4_000, nonce).unwrap();

    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 4_000);
    assert_eq!(h.token_vault(), 6_000);
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Completed);
    assert_eq!(
        h.program.completed_swap(&nonce, &trader).unwrap().unwrap().expiry,
        NOW
    );
    h.program.verify_vault_conservation().unwrap();
}

#[test]
fn short_vault_queues_and_charges_airdrop_vault_for_storage() {
    let mut h = Harness::new();
    h.fund_token_vault(3_000);
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    let airdrop = h.program.deriver().airdrop_vault().unwrap().address;
    let before = h.program.lamports(&airdrop);

    h.receive_trade(trader, 5_000, nonce).unwrap();

    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);
    let pending = h.program.pending_swap(&nonce, &trader).unwrap().unwrap();
    assert_eq!((pending.trader, pending.quantity, pending.token_mint), (trader, 5_000, h.mint));
    assert_eq!(h.program.lamports(&airdrop), before - PENDING_SWAP_RENT);
    assert_eq!(h.token_vault(), 3_000);
    assert!(h.program.events().iter().any(|e| matches!(
        e,
        ProtocolEvent::SwapQueue {
            action: QueueAction::Added,
            quantity: 5_000,
            ..
        }
    )));
}

// =========================================================================
// Finalize
// =========================================================================

#[test]
fn finalize_pays_trader_from_vault() {
    let mut h = Harness::new();
    h.fund_token_vault(3_000);
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 5_000, nonce).unwrap();
    h.fund_token_vault(7_000);

    let details = h.program.token_details(&h.mint).unwrap().unwrap();
    assert_eq!(details.to_units(h.token_vault()), Decimal::new(10, 0));

    h.program.finalize_pending_swap(&trader, &key(nonce, trader)).unwrap();

    assert_eq!(details.to_units(h.token_vault()), Decimal::new(5, 0));
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 5_000);
    assert!(h.program.pending_swap(&nonce, &trader).unwrap().is_none());
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Completed);
    h.program.verify_vault_conservation().unwrap();
}

#[test]
fn finalize_returns_storage_deposit() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    let airdrop = h.program.deriver().airdrop_vault().unwrap().address;
    let before = h.program.lamports(&airdrop);
    h.receive_trade(trader, 500, nonce).unwrap();
    h.fund_token_vault(500);
    let rebalancer = h.rebalancer;
    h.program.finalize_pending_swap(&rebalancer, &key(nonce, trader)).unwrap();
    assert_eq!(h.program.lamports(&airdrop), before);
}

#[test]
fn finalize_requires_trader_or_rebalancer() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    h.fund_token_vault(500);
    let err = h
        .program
        .finalize_pending_swap(&Pubkey::new_unique(), &key(nonce, trader))
        .unwrap_err();
    assert!(matches!(err, XswapError::Unauthorized { .. }));
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);
}

#[test]
fn finalize_with_short_vault_rolls_back() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    let err = h.program.finalize_pending_swap(&trader, &key(nonce, trader)).unwrap_err();
    assert!(matches!(err, XswapError::InsufficientFunds { .. }));
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);
    h.program.verify_vault_conservation().unwrap();
}

// =========================================================================
// Remove
// =========================================================================

#[test]
fn remove_pays_once_then_not_found() {
    let mut h = Harness::new();
    h.fund_token_vault(3_000);
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 5_000, nonce).unwrap();
    h.fund_token_vault(7_000);

    let destination = h
        .program
        .deriver()
        .associated_token_account(&trader, &h.mint)
        .unwrap()
        .address;
    let params = RemoveFromSwapQueueParams {
        nonce,
        dest_trader: trader,
        destination,
    };
    h.program.remove_from_swap_queue(&trader, &params).unwrap();

    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 5_000);
    assert_eq!(h.token_vault(), 5_000);
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Expired);

    let err = h.program.remove_from_swap_queue(&trader, &params).unwrap_err();
    assert!(matches!(err, XswapError::NotFound { what: "pending swap", .. }));
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 5_000);
    assert_eq!(h.token_vault(), 5_000);
    h.program.verify_vault_conservation().unwrap();
}

#[test]
fn remove_rejects_unbound_destination() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    h.fund_token_vault(500);

    let attacker = Pubkey::new_unique();
    let attacker_ata = h
        .program
        .deriver()
        .associated_token_account(&attacker, &h.mint)
        .unwrap()
        .address;
    let rebalancer = h.rebalancer;
    let err = h
        .program
        .remove_from_swap_queue(
            &rebalancer,
            &RemoveFromSwapQueueParams {
                nonce,
                dest_trader: trader,
                destination: attacker_ata,
            },
        )
        .unwrap_err();
    assert!(matches!(err, XswapError::InvalidDestination { .. }));
    assert_eq!(h.token_vault(), 500);
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);
}

#[test]
fn remove_rejects_destination_with_foreign_owner() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    h.fund_token_vault(500);

    let destination = h
        .program
        .deriver()
        .associated_token_account(&trader, &h.mint)
        .unwrap()
        .address;
    let mint = h.mint;
    h.program
        .open_token_account(&destination, &Pubkey::new_unique(), &mint)
        .unwrap();
    let err = h
        .program
        .remove_from_swap_queue(
            &trader,
            &RemoveFromSwapQueueParams {
                nonce,
                dest_trader: trader,
                destination,
            },
        )
        .unwrap_err();
    assert!(matches!(err, XswapError::InvalidTokenOwner { .. }));
}

#[test]
fn native_remove_keeps_vault_threshold() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    let message = Harness::payload(Tx::CCTrade, trader, Pubkey::ZERO, 50_000, nonce);
    let params = h.delivery(message);
    h.receive(&params).unwrap();
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);

    let rebalancer = h.rebalancer;
    let remove = RemoveFromSwapQueueParams {
        nonce,
        dest_trader: trader,
        destination: trader,
    };
    h.program.fund_sol(&rebalancer, NATIVE_VAULT_MIN_THRESHOLD).unwrap();
    assert!(matches!(
        h.program.remove_from_swap_queue(&trader, &remove),
        Err(XswapError::InsufficientFunds { .. })
    ));
    h.program.fund_sol(&rebalancer, 50_000).unwrap();
    h.program.remove_from_swap_queue(&trader, &remove).unwrap();
    assert_eq!(h.program.lamports(&trader), 50_000);
    assert_eq!(
        h.program.vault_balance(VaultKind::Trading, &Pubkey::ZERO).unwrap(),
        NATIVE_VAULT_MIN_THRESHOLD
    );
}

// =========================================================================
// Replay and expiry
// =========================================================================

#[test]
fn replayed_delivery_is_rejected() {
    let mut h = Harness::new();
    h.fund_token_vault(10_000);
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    let message = Harness::payload(Tx::CCTrade, trader, h.mint, 1_000, nonce);
    let params = h.delivery(message);
    h.receive(&params).unwrap();

    let err = h.receive(&params).unwrap_err();
    assert!(matches!(err, XswapError::ReplayRejected { .. }));
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 1_000);

    // A different order reusing the endpoint nonce is caught by the clear.
    let mut reused = params.clone();
    reused.message = Harness::payload(Tx::CCTrade, trader, h.mint, 1_000, other_nonce(nonce));
    let err = h.receive(&reused).unwrap_err();
    assert!(matches!(err, XswapError::MessageAlreadyCleared { .. }));
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 1_000);
    h.program.verify_vault_conservation().unwrap();
}

fn other_nonce(other: Nonce) -> Nonce {
    let mut bytes = other.0;
    bytes[0] ^= 0xff;
    Nonce(bytes)
}

#[test]
fn removed_swap_cannot_be_received_again() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    h.fund_token_vault(1_000);
    let destination = h
        .program
        .deriver()
        .associated_token_account(&trader, &h.mint)
        .unwrap()
        .address;
    h.program
        .remove_from_swap_queue(
            &trader,
            &RemoveFromSwapQueueParams {
                nonce,
                dest_trader: trader,
                destination,
            },
        )
        .unwrap();
    let err = h.receive_trade(trader, 500, nonce).unwrap_err();
    assert!(matches!(err, XswapError::ReplayRejected { .. }));
}

#[test]
fn expiry_update_refused_while_pending() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 500, nonce).unwrap();
    let rebalancer = h.rebalancer;
    let update = UpdateSwapExpiryParams {
        nonce,
        trader,
        expiry: NOW + 86_400,
    };
    assert!(matches!(
        h.program.update_swap_expiry(&rebalancer, &update),
        Err(XswapError::SwapStillPending { .. })
    ));
    assert!(h.program.completed_swap(&nonce, &trader).unwrap().is_none());

    h.fund_token_vault(500);
    h.program.finalize_pending_swap(&trader, &key(nonce, trader)).unwrap();
    h.program.update_swap_expiry(&rebalancer, &update).unwrap();
    assert_eq!(
        h.program.completed_swap(&nonce, &trader).unwrap().unwrap().expiry,
        NOW + 86_400
    );
}

// =========================================================================
// Signed orders against queued pairs
// =========================================================================

/// Native to `dest_trader` for the test token, settled under `nonce`.
fn signed_swap(h: &Harness, taker: Pubkey, dest_trader: Pubkey, nonce: Nonce) -> SwapParams {
    let order = Order {
        maker_asset: Pubkey::ZERO,
        taker_asset: h.mint,
        taker,
        maker_amount: 9_000,
        taker_amount: 3_000,
        expiry: u128::try_from(NOW + 600).unwrap(),
        dest_trader,
        nonce,
    };
    SwapParams {
        signature: h.signer.sign_order(&order).unwrap().to_vec(),
        order,
        is_partial: false,
        taker_amount: 0,
    }
}

/// A queued `(nonce, trader)` plus a taker able to pay for a swap to it.
fn queued_pair(h: &mut Harness) -> (Pubkey, Nonce, Pubkey) {
    let rebalancer = h.rebalancer;
    h.program.fund_sol(&rebalancer, 2_000_000).unwrap();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    h.receive_trade(trader, 5_000, nonce).unwrap();
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);

    let taker = Pubkey::new_unique();
    let mint = h.mint;
    h.program.airdrop_lamports(&taker, 1_000_000).unwrap();
    h.program.mint_tokens(&taker, &mint, 3_000).unwrap();
    (trader, nonce, taker)
}

#[test]
fn swap_rejected_while_pair_is_pending() {
    let mut h = Harness::new();
    let (trader, nonce, taker) = queued_pair(&mut h);

    let err = h
        .program
        .swap(&taker, &signed_swap(&h, taker, trader, nonce))
        .unwrap_err();

    assert!(matches!(err, XswapError::ReplayRejected { .. }));
    assert!(h.program.completed_swap(&nonce, &trader).unwrap().is_none());
    assert!(h.program.pending_swap(&nonce, &trader).unwrap().is_some());
    assert_eq!(h.program.token_balance(&taker, &h.mint).unwrap(), 3_000);
    assert_eq!(h.program.lamports(&trader), 0);

    // The queued entry still settles once the vault is funded.
    h.fund_token_vault(5_000);
    h.program.finalize_pending_swap(&trader, &key(nonce, trader)).unwrap();
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 5_000);
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Completed);
    h.program.verify_vault_conservation().unwrap();
}

#[test]
fn cross_swap_rejected_while_pair_is_pending() {
    let mut h = Harness::new();
    let (trader, nonce, taker) = queued_pair(&mut h);
    let admin = h.admin;
    let maker_asset = Pubkey::new_unique();
    h.program
        .add_destination(
            &admin,
            &AddDestinationParams {
                eid: REMOTE_EID,
                token_address: maker_asset,
            },
        )
        .unwrap();
    let order = CrossOrder {
        taker,
        dest_trader: trader,
        maker_symbol: Symbol::new("ALOT").unwrap(),
        maker_asset,
        taker_asset: h.mint,
        maker_amount: 7,
        taker_amount: 2_000,
        nonce,
        expiry: u128::try_from(NOW + 600).unwrap(),
        dest_chain_id: REMOTE_EID,
    };
    let params = CrossSwapParams {
        signature: h.signer.sign_order(&order).unwrap().to_vec(),
        order,
        endpoint: h.program.network().endpoint_program,
    };

    let err = h
        .program
        .cross_swap(&taker, &params, &Harness::relay_accounts())
        .unwrap_err();

    assert!(matches!(err, XswapError::ReplayRejected { .. }));
    assert!(h.program.completed_swap(&nonce, &trader).unwrap().is_none());
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Pending);
    assert!(h.program.endpoint().sent().is_empty());
    assert_eq!(h.program.token_balance(&taker, &h.mint).unwrap(), 3_000);
    assert_eq!(h.program.lamports(&taker), 1_000_000);
}

#[test]
fn swap_rejected_after_pair_was_removed() {
    let mut h = Harness::new();
    let (trader, nonce, taker) = queued_pair(&mut h);
    h.fund_token_vault(5_000);
    let destination = h
        .program
        .deriver()
        .associated_token_account(&trader, &h.mint)
        .unwrap()
        .address;
    h.program
        .remove_from_swap_queue(
            &trader,
            &RemoveFromSwapQueueParams {
                nonce,
                dest_trader: trader,
                destination,
            },
        )
        .unwrap();

    let err = h
        .program
        .swap(&taker, &signed_swap(&h, taker, trader, nonce))
        .unwrap_err();

    assert!(matches!(err, XswapError::ReplayRejected { .. }));
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Expired);
    assert!(h.program.completed_swap(&nonce, &trader).unwrap().is_none());
}

// =========================================================================
// Receive gates
// =========================================================================

#[test]
fn unregistered_sender_rejected() {
    let mut h = Harness::new();
    let message = Harness::payload(Tx::CCTrade, Pubkey::new_unique(), h.mint, 1, generate_nonce());
    let mut params = h.delivery(message);
    params.sender = Pubkey::new_unique();
    assert!(matches!(
        h.receive(&params),
        Err(XswapError::UnauthorizedRemote { .. })
    ));
}

#[test]
fn unsupported_payloads_rejected() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();

    let message = Harness::payload(Tx::Deposit, trader, h.mint, 1, generate_nonce());
    let params = h.delivery(message);
    assert!(matches!(
        h.receive(&params),
        Err(XswapError::UnsupportedTransaction { code: 1 })
    ));

    let message = Harness::payload(Tx::CCTrade, trader, Pubkey::new_unique(), 1, generate_nonce());
    let params = h.delivery(message);
    assert!(matches!(h.receive(&params), Err(XswapError::TokenNotSupported { .. })));

    let message = Harness::payload(Tx::CCTrade, trader, h.mint, 0, generate_nonce());
    let params = h.delivery(message);
    assert!(matches!(h.receive(&params), Err(XswapError::ZeroAmount)));

    let params = h.delivery(vec![0u8; 10]);
    assert!(matches!(h.receive(&params), Err(XswapError::MalformedPayload { .. })));
}

#[test]
fn paused_program_rejects_delivery() {
    let mut h = Harness::new();
    let admin = h.admin;
    h.program.set_paused(&admin, true).unwrap();
    assert!(matches!(
        h.receive_trade(Pubkey::new_unique(), 1, generate_nonce()),
        Err(XswapError::ProgramPaused)
    ));
}

#[test]
fn withdraw_pays_from_user_funds_and_never_queues() {
    let mut h = Harness::new();
    let trader = Pubkey::new_unique();
    let nonce = generate_nonce();
    let message = Harness::payload(Tx::Withdraw, trader, h.mint, 700, nonce);
    let params = h.delivery(message);
    assert!(matches!(
        h.receive(&params),
        Err(XswapError::InsufficientFunds { .. })
    ));
    assert_eq!(h.program.swap_state(&nonce, &trader).unwrap(), SwapState::Absent);
}

#[test]
fn airdrop_flag_pays_configured_amount() {
    let mut h = Harness::new();
    h.fund_token_vault(1_000);
    let trader = Pubkey::new_unique();
    let mut message = Harness::payload(Tx::CCTrade, trader, h.mint, 1_000, generate_nonce());
    message[0] |= 0x80;
    let params = h.delivery(message);
    h.receive(&params).unwrap();
    let airdrop_amount = h.program.get_global_config().unwrap().airdrop_amount;
    assert_eq!(h.program.lamports(&trader), airdrop_amount);
    assert_eq!(h.program.token_balance(&trader, &h.mint).unwrap(), 1_000);
    h.program.verify_vault_conservation().unwrap();
}
