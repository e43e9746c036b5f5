#[cfg(test)]
mod tests {
    use nft_bridge_lib::*;
    use rand::Rng;

    const COLLECTION: Address = Address::new([0xC0; 20]);
    const BRIDGE: Address = Address::new([0xB1; 20]);
    const RELAYER: Address = Address::new([0x4E; 20]);
    const USER: Address = Address::new([0xAA; 20]);

    /// Both ledgers plus the relay's view of them, wired the way a deployment is.
    struct Bridge {
        source: SourceLedger<PlaceholderGate, NftRegistry>,
        destination: DestinationLedger<PlaceholderGate>,
        proof: Vec<u8>,
    }

    impl Bridge {
        fn new(tokens: &[u64], policy: BatchMintPolicy) -> Self {
            let config = BridgeConfig {
                bridge_address: BRIDGE,
                relayer: RELAYER,
                batch_mint_policy: policy,
                ..BridgeConfig::default()
            };
            let gate = PlaceholderGate::default();
            let mut registry = NftRegistry::new();
            for token in tokens {
                registry.mint(asset(*token), USER);
            }
            Bridge {
                source: SourceLedger::new(&config, gate, registry),
                destination: DestinationLedger::new(&config, gate),
                proof: gate.well_formed_proof(),
            }
        }
    }

    fn asset(token_id: u64) -> AssetRef {
        AssetRef::new(COLLECTION, U256::from(token_id))
    }

    fn user() -> TxContext {
        TxContext::new(USER, 1_700_000_000)
    }

    fn relayer() -> TxContext {
        TxContext::new(RELAYER, 1_700_000_060)
    }

    fn leaves(ids: &[TransferId]) -> Vec<B256> {
        ids.iter().map(TransferId::as_b256).collect()
    }

    #[test]
    fn test_lock_mint_replay_scenario() {
        let mut bridge = Bridge::new(&[1], BatchMintPolicy::Atomic);

        let t1 = bridge.source.lock(&user(), asset(1)).unwrap();
        let events = bridge.source.drain_events();
        let SourceEvent::Locked(lock) = &events[0] else {
            panic!("expected a lock event, got {events:?}");
        };
        assert_eq!(lock.transfer_id, t1);
        assert_eq!(lock.owner, USER);

        let w = bridge
            .destination
            .mint(&relayer(), USER, asset(1), t1, &bridge.proof)
            .unwrap();
        assert_eq!(w, 1);
        assert!(bridge.destination.is_minted(&t1));

        assert_eq!(
            bridge
                .destination
                .mint(&relayer(), USER, asset(1), t1, &bridge.proof),
            Err(BridgeError::AlreadyMinted(t1))
        );
    }

    #[test]
    fn test_lock_unlock_toggles_is_locked() {
        let mut bridge = Bridge::new(&[1], BatchMintPolicy::Atomic);
        assert!(!bridge.source.is_locked(&asset(1)));

        let t1 = bridge.source.lock(&user(), asset(1)).unwrap();
        assert!(bridge.source.is_locked(&asset(1)));
        assert_eq!(
            bridge.source.lock(&user(), asset(1)),
            Err(BridgeError::AlreadyLocked(asset(1)))
        );

        bridge
            .source
            .unlock(&relayer(), asset(1), USER, t1, &bridge.proof)
            .unwrap();
        assert!(!bridge.source.is_locked(&asset(1)));
    }

    #[test]
    fn test_batch_lock_then_batch_mint_scenario() {
        let mut bridge = Bridge::new(&[1, 2], BatchMintPolicy::Atomic);

        let (ids, root) = bridge
            .source
            .batch_lock(&user(), &[COLLECTION; 2], &[U256::from(1), U256::from(2)])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(verify_root(&leaves(&ids), &root));

        let wrong = B256::repeat_byte(0x01);
        assert_eq!(
            bridge.destination.batch_mint(
                &relayer(),
                &[USER, USER],
                &[asset(1), asset(2)],
                &ids,
                wrong,
                &bridge.proof,
            ),
            Err(BridgeError::BadMerkleRoot {
                claimed: wrong,
                computed: root
            })
        );
        assert!(!bridge.destination.is_minted(&ids[0]));

        let outcome = bridge
            .destination
            .batch_mint(
                &relayer(),
                &[USER, USER],
                &[asset(1), asset(2)],
                &ids,
                root,
                &bridge.proof,
            )
            .unwrap();
        assert_eq!(outcome.wrapped_ids, vec![1, 2]);
        assert!(ids.iter().all(|id| bridge.destination.is_minted(id)));
        assert_eq!(bridge.destination.wrapped_asset_info(2), Some(asset(2)));
    }

    #[test]
    fn test_burn_unlock_round_trip() {
        let mut bridge = Bridge::new(&[1], BatchMintPolicy::Atomic);
        let t1 = bridge.source.lock(&user(), asset(1)).unwrap();
        let w = bridge
            .destination
            .mint(&relayer(), USER, asset(1), t1, &bridge.proof)
            .unwrap();
        assert_eq!(bridge.source.custody().owner_of(&asset(1)), Some(BRIDGE));

        bridge
            .destination
            .burn(&user(), w, t1, &bridge.proof)
            .unwrap();
        assert_eq!(bridge.destination.wrapped_asset_info(w), None);

        let returned = bridge
            .destination
            .drain_events()
            .into_iter()
            .find_map(|event| match event {
                DestinationEvent::Returned(ret) => Some(ret),
                _ => None,
            })
            .expect("burn emits a return event");
        assert_eq!(returned.transfer_id, t1);

        bridge
            .source
            .unlock(
                &relayer(),
                returned.original,
                returned.owner,
                returned.transfer_id,
                &bridge.proof,
            )
            .unwrap();
        assert!(!bridge.source.is_locked(&asset(1)));
        assert_eq!(bridge.source.custody().owner_of(&asset(1)), Some(USER));

        // The consumed id can neither be minted nor unlocked again
        assert_eq!(
            bridge
                .destination
                .mint(&relayer(), USER, asset(1), t1, &bridge.proof),
            Err(BridgeError::AlreadyMinted(t1))
        );
        assert_eq!(
            bridge
                .source
                .unlock(&relayer(), asset(1), USER, t1, &bridge.proof),
            Err(BridgeError::NotLocked(asset(1)))
        );
    }

    #[test]
    fn test_round_trip_then_bridge_again() {
        let mut bridge = Bridge::new(&[1], BatchMintPolicy::Atomic);
        let t1 = bridge.source.lock(&user(), asset(1)).unwrap();
        let w1 = bridge
            .destination
            .mint(&relayer(), USER, asset(1), t1, &bridge.proof)
            .unwrap();
        bridge.destination.burn(&user(), w1, t1, &bridge.proof).unwrap();
        bridge
            .source
            .unlock(&relayer(), asset(1), USER, t1, &bridge.proof)
            .unwrap();

        let t2 = bridge.source.lock(&user(), asset(1)).unwrap();
        assert_ne!(t1, t2);
        let w2 = bridge
            .destination
            .mint(&relayer(), USER, asset(1), t2, &bridge.proof)
            .unwrap();
        assert_eq!(w2, 2, "wrapped ids are never reused");
    }

    #[test]
    fn test_third_party_cannot_race_relay() {
        let mut bridge = Bridge::new(&[1], BatchMintPolicy::Atomic);
        let t1 = bridge.source.lock(&user(), asset(1)).unwrap();
        let thief = Address::repeat_byte(0x66);
        let ctx = TxContext::new(thief, 1);

        assert_eq!(
            bridge
                .destination
                .mint(&ctx, thief, asset(1), t1, &bridge.proof),
            Err(BridgeError::Unauthorized(thief))
        );
        assert_eq!(
            bridge
                .source
                .unlock(&ctx, asset(1), thief, t1, &bridge.proof),
            Err(BridgeError::Unauthorized(thief))
        );
        assert!(!bridge.destination.is_minted(&t1));
    }

    #[test]
    fn test_skip_policy_partial_batch() {
        let mut bridge = Bridge::new(&[1, 2, 3], BatchMintPolicy::SkipMinted);
        let (ids, root) = bridge
            .source
            .batch_lock(
                &user(),
                &[COLLECTION; 3],
                &[U256::from(1), U256::from(2), U256::from(3)],
            )
            .unwrap();

        // The relay delivered the middle transfer on its own first
        bridge
            .destination
            .mint(&relayer(), USER, asset(2), ids[1], &bridge.proof)
            .unwrap();

        let outcome = bridge
            .destination
            .batch_mint(
                &relayer(),
                &[USER; 3],
                &[asset(1), asset(2), asset(3)],
                &ids,
                root,
                &bridge.proof,
            )
            .unwrap();
        assert_eq!(outcome.skipped, vec![ids[1]]);
        assert_eq!(outcome.wrapped_ids.len(), 2);
        assert!(ids.iter().all(|id| bridge.destination.is_minted(id)));
    }

    #[test]
    fn test_batch_member_inclusion_proofs() {
        let tokens: Vec<u64> = (1..=5).collect();
        let mut bridge = Bridge::new(&tokens, BatchMintPolicy::Atomic);
        let token_ids: Vec<U256> = tokens.iter().map(|t| U256::from(*t)).collect();
        let (ids, root) = bridge
            .source
            .batch_lock(&user(), &[COLLECTION; 5], &token_ids)
            .unwrap();

        let leaves = leaves(&ids);
        for (i, id) in ids.iter().enumerate() {
            let proof = compute_proof(&leaves, i).unwrap();
            assert!(verify_merkle_proof(id.as_b256(), &proof, root));
        }
    }

    #[test]
    fn test_random_lock_sequences_issue_unique_ids() {
        let mut rng = rand::thread_rng();
        let tokens: Vec<u64> = (0..32).map(|_| rng.gen()).collect();
        let mut bridge = Bridge::new(&tokens, BatchMintPolicy::Atomic);

        let mut seen = std::collections::HashSet::new();
        for token in &tokens {
            if bridge.source.is_locked(&asset(*token)) {
                continue;
            }
            let ctx = TxContext::new(USER, 1_700_000_000);
            let id = bridge.source.lock(&ctx, asset(*token)).unwrap();
            assert!(seen.insert(id), "transfer id issued twice");
        }
        assert_eq!(bridge.source.nonce() as usize, seen.len());
    }

    #[test]
    fn test_events_serialize_for_relay() {
        let mut bridge = Bridge::new(&[1, 2], BatchMintPolicy::Atomic);
        let (ids, root) = bridge
            .source
            .batch_lock(&user(), &[COLLECTION; 2], &[U256::from(1), U256::from(2)])
            .unwrap();

        let events = bridge.source.drain_events();
        let json = serde_json::to_string_pretty(&events).unwrap();
        let parsed: Vec<SourceEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, events);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[2]["event"], "batch_locked");
        assert_eq!(value[2]["merkle_root"], root.to_string());
        assert_eq!(value[0]["transfer_id"], ids[0].to_string());
    }

    #[test]
    fn test_transfer_ids_parse_from_hex_list() {
        let hex_ids = [hex::encode([0x11u8; 32]), format!("0x{}", hex::encode([0x22u8; 32]))];
        let ids: Vec<TransferId> = hex_ids.iter().map(|h| h.parse().unwrap()).collect();
        assert_eq!(ids[0].as_b256(), B256::repeat_byte(0x11));
        assert_eq!(ids[1].as_b256(), B256::repeat_byte(0x22));
        assert!("0x1234".parse::<TransferId>().is_err());
    }

    #[test]
    fn test_config_file_round_trip() -> anyhow::Result<()> {
        let config = BridgeConfig {
            relayer: RELAYER,
            batch_mint_policy: BatchMintPolicy::SkipMinted,
            ..BridgeConfig::default()
        };
        let json = serde_json::to_string(&config)?;
        let parsed: BridgeConfig = serde_json::from_str(&json)?;
        anyhow::ensure!(parsed == config, "config changed across JSON: {json}");
        Ok(())
    }
}

#[cfg(test)]
mod merkle_properties {
    use nft_bridge_lib::{compute_root, verify_root, B256};
    use proptest::prelude::*;

    fn leaves_strategy() -> impl Strategy<Value = Vec<B256>> {
        prop::collection::vec(any::<[u8; 32]>().prop_map(B256::from), 1..24)
    }

    proptest! {
        #[test]
        fn root_verifies_against_itself(leaves in leaves_strategy()) {
            let root = compute_root(&leaves);
            prop_assert!(verify_root(&leaves, &root));
        }

        #[test]
        fn single_bit_flip_breaks_verification(
            leaves in leaves_strategy(),
            pick in any::<prop::sample::Index>(),
            bit in 0usize..256,
        ) {
            let root = compute_root(&leaves);
            let mut mutated = leaves.clone();
            let i = pick.index(mutated.len());
            mutated[i].0[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(!verify_root(&mutated, &root));
        }

        #[test]
        fn reordering_breaks_verification(
            leaves in prop::collection::vec(any::<[u8; 32]>().prop_map(B256::from), 2..24),
            a in any::<prop::sample::Index>(),
            b in any::<prop::sample::Index>(),
        ) {
            let (i, j) = (a.index(leaves.len()), b.index(leaves.len()));
            prop_assume!(leaves[i] != leaves[j]);
            let root = compute_root(&leaves);
            let mut reordered = leaves.clone();
            reordered.swap(i, j);
            prop_assert!(!verify_root(&reordered, &root));
        }
    }
}
