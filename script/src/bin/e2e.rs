//! End-to-end run: lock → mint → batch lock → batch mint → burn → unlock,
//! with both ledgers in-process and the relay polling between them.
//!
//! Runs the full bridge lifecycle:
//!   1. Mints four originals to a random user on the source ledger
//!   2. Locks one, relay mints its wrapped representation
//!   3. Batch-locks the other three, relay mints them behind one root
//!   4. Replays a mint to confirm the destination refuses it
//!   5. Burns the first wrapped asset, relay unlocks the original
//!   6. Verifies final state on both ledgers and writes the relay journal
//!
//! Usage:
//!   cargo run --release -p nft-bridge-script --bin e2e
//!
//! Configuration comes from the environment (see `config.rs`), optionally
//! loaded from `.env`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, U256};
use anyhow::{anyhow, ensure, Context, Result};
use nft_bridge_lib::{
    verify_root, AssetRef, BridgeError, Custody, DestinationLedger, NftRegistry,
    PlaceholderGate, SourceLedger, TransferId, TxContext,
};
use nft_bridge_script::config::ScriptConfig;
use nft_bridge_script::relay::{RelayAction, Relayer};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};

/// How long to wait for the relay to carry one step across.
const STEP_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Poll `check` until it holds or `STEP_TIMEOUT` passes.
async fn wait_for<F, Fut>(what: &str, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(STEP_TIMEOUT, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .with_context(|| format!("timed out waiting for {what}"))
}

// ---------------------------------------------------------------------------
// Journal, saved to disk for the operator
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Journal {
    source_chain_id: u64,
    destination_chain_id: u64,
    user: Address,
    collection: Address,
    single_transfer: TransferId,
    batch_transfers: Vec<TransferId>,
    batch_root: B256,
    actions: Vec<RelayAction>,
}

fn save_journal(journal: &Journal) -> Result<()> {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .context("manifest dir has no parent")?
        .join("fixtures");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("relay_journal.json");
    let json = serde_json::to_string_pretty(journal)?;
    std::fs::write(&path, &json)?;
    println!("    Relay journal saved to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    nft_bridge_script::setup_logger();

    // ── Step 0: Load config ────────────────────────────────────────────
    println!("\n=== NFT Bridge E2E Run ===\n");

    let config = ScriptConfig::from_env()?;
    let bridge = &config.bridge;
    println!("Source chain:       {}", bridge.source_chain_id);
    println!("Destination chain:  {}", bridge.destination_chain_id);
    println!("Bridge custody:     {}", bridge.bridge_address);
    println!("Relayer:            {}", bridge.relayer);
    println!("Batch mint policy:  {:?}", bridge.batch_mint_policy);
    println!("Poll interval:      {:?}\n", config.poll_interval);

    // ── Step 1: Originals ──────────────────────────────────────────────
    let mut rng = rand::thread_rng();
    let user = Address::from(rng.gen::<[u8; 20]>());
    let collection = Address::from(rng.gen::<[u8; 20]>());
    let token_ids: Vec<U256> = (0..4).map(|_| U256::from(rng.gen::<u64>())).collect();
    let assets: Vec<AssetRef> = token_ids
        .iter()
        .map(|token_id| AssetRef::new(collection, *token_id))
        .collect();

    let mut registry = NftRegistry::new();
    for asset in &assets {
        registry.mint(*asset, user);
    }
    println!("[1] User {user} owns {} originals in {collection}", assets.len());

    // ── Step 2: Ledgers + relay ────────────────────────────────────────
    let gate = PlaceholderGate::new(config.proof_len);
    let source = Arc::new(Mutex::new(SourceLedger::new(bridge, gate, registry)));
    let destination = Arc::new(Mutex::new(DestinationLedger::new(bridge, gate)));

    let relayer = Relayer::new(
        source.clone(),
        destination.clone(),
        bridge.relayer,
        gate.well_formed_proof(),
    );
    let (stop_relay, stop_rx) = oneshot::channel();
    let relay_task = tokio::spawn(relayer.run(config.poll_interval, stop_rx));
    println!("[2] Relay polling every {:?}", config.poll_interval);

    // ── Step 3: Single lock ────────────────────────────────────────────
    let single = assets[0];
    let t1 = source
        .lock()
        .await
        .lock(&TxContext::new(user, now()), single)?;
    println!("[3] Locked {single}");
    println!("    Transfer id: {t1}");

    wait_for("single mint", || {
        let destination = destination.clone();
        async move {
            let minted = destination.lock().await.is_minted(&t1);
            minted
        }
    })
    .await?;
    let w1 = destination
        .lock()
        .await
        .find_by_transfer(&t1)
        .map(|w| w.wrapped_id)
        .context("minted transfer has no wrapped asset")?;
    println!("    Minted wrapped id {w1}");

    // ── Step 4: Batch lock ─────────────────────────────────────────────
    let batch = &assets[1..];
    let collections: Vec<Address> = batch.iter().map(|a| a.collection).collect();
    let batch_token_ids: Vec<U256> = batch.iter().map(|a| a.token_id).collect();
    let (batch_ids, batch_root) = source.lock().await.batch_lock(
        &TxContext::new(user, now()),
        &collections,
        &batch_token_ids,
    )?;
    println!("[4] Batch locked {} originals", batch_ids.len());
    println!("    Root: {batch_root}");

    let leaves: Vec<B256> = batch_ids.iter().map(TransferId::as_b256).collect();
    ensure!(verify_root(&leaves, &batch_root), "batch root does not verify locally");

    wait_for("batch mint", || {
        let destination = destination.clone();
        let ids = batch_ids.clone();
        async move {
            let destination = destination.lock().await;
            let minted = ids.iter().all(|id| destination.is_minted(id));
            minted
        }
    })
    .await?;
    println!("    All batch transfers minted");

    // ── Step 5: Replay ─────────────────────────────────────────────────
    let replay = destination.lock().await.mint(
        &TxContext::new(bridge.relayer, now()),
        user,
        single,
        t1,
        &gate.well_formed_proof(),
    );
    ensure!(
        replay == Err(BridgeError::AlreadyMinted(t1)),
        "replayed mint was not rejected: {replay:?}"
    );
    println!("[5] Replayed mint rejected: AlreadyMinted");

    // ── Step 6: Burn and return ────────────────────────────────────────
    destination
        .lock()
        .await
        .burn(&TxContext::new(user, now()), w1, t1, &gate.well_formed_proof())?;
    println!("[6] Burned wrapped id {w1}");

    wait_for("unlock", || {
        let source = source.clone();
        async move {
            let locked = source.lock().await.is_locked(&single);
            !locked
        }
    })
    .await?;
    println!("    Original {single} unlocked");

    // ── Step 7: Stop relay ─────────────────────────────────────────────
    stop_relay
        .send(())
        .map_err(|_| anyhow!("relay already stopped"))?;
    let actions = relay_task.await.context("relay task panicked")?;
    println!("[7] Relay stopped after {} actions", actions.len());

    save_journal(&Journal {
        source_chain_id: bridge.source_chain_id,
        destination_chain_id: bridge.destination_chain_id,
        user,
        collection,
        single_transfer: t1,
        batch_transfers: batch_ids.clone(),
        batch_root,
        actions,
    })?;

    // ── Step 8: Verify final state ─────────────────────────────────────
    println!("\n[8] Verifying final state...");
    {
        let source = source.lock().await;
        ensure!(!source.is_locked(&single), "single asset still locked");
        ensure!(
            source.custody().owner_of(&single) == Some(user),
            "single asset not returned to user"
        );
        for asset in batch {
            ensure!(source.is_locked(asset), "batch asset {asset} not locked");
            ensure!(
                source.custody().owner_of(asset) == Some(bridge.bridge_address),
                "bridge does not hold {asset}"
            );
        }
        ensure!(source.nonce() == 4, "expected nonce 4, got {}", source.nonce());
        println!("     Source custody: OK");
    }
    {
        let destination = destination.lock().await;
        ensure!(destination.is_minted(&t1), "single transfer not marked minted");
        ensure!(
            destination.wrapped_asset_info(w1).is_none(),
            "burned wrapped asset still exists"
        );
        ensure!(
            destination.wrapped_count() == batch_ids.len(),
            "expected {} live wrapped assets, got {}",
            batch_ids.len(),
            destination.wrapped_count()
        );
        println!("     Destination registry: OK");
    }

    println!("\n=== E2E Run Passed! ===\n");
    Ok(())
}
