use proptest::prelude::*;

use elector_types::{
    AccountAddress, ElectionId, ElectionTiming, ElectionWindow, Nanotons, Timestamp,
};

proptest! {
    /// Raw address text survives a parse/display cycle.
    #[test]
    fn raw_address_roundtrip(wc in -1i32..=0, hash in prop::array::uniform32(0u8..)) {
        let addr = AccountAddress::new(wc, hash);
        let parsed = AccountAddress::parse(&addr.to_string()).unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Addresses serialize as their raw string and decode back.
    #[test]
    fn address_bincode_roundtrip(hash in prop::array::uniform32(0u8..)) {
        let addr = AccountAddress::new(0, hash);
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: AccountAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// Displayed amounts parse back to the same number of nanocoins.
    #[test]
    fn amount_display_parses_back(nanos in 0u64..u64::MAX / 2) {
        let amount = Nanotons::new(nanos);
        prop_assert_eq!(Nanotons::parse_coins(&amount.to_string()).unwrap(), amount);
    }

    /// Windows are ordered start <= close <= id < next whenever end_before <= start_before.
    #[test]
    fn window_ordering(
        id in 100_000u64..u32::MAX as u64,
        start_before in 1u64..50_000,
        end_fraction in 0u64..=100,
    ) {
        let end_before = start_before * end_fraction / 100;
        let timing = ElectionTiming {
            validators_elected_for: 65_536,
            elections_start_before: start_before,
            elections_end_before: end_before,
            stake_held_for: 32_768,
        };
        let w = ElectionWindow::derive(ElectionId::new(id), &timing);
        prop_assert!(w.start_at <= w.close_at);
        prop_assert!(w.close_at <= id);
        prop_assert!(id < w.next_elections_at);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// has_expired agrees with elapsed_since.
    #[test]
    fn timestamp_expiry(start in 0u64..1_000_000, dur in 0u64..1_000_000, now in 0u64..3_000_000) {
        let ts = Timestamp::new(start);
        let now = Timestamp::new(now);
        prop_assert_eq!(ts.has_expired(dur, now), now.as_secs() >= start + dur);
    }
}
