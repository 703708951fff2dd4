//! Unit tests for the Identifiers module

use core_kernel::{VendorId, InvoiceId, PaymentId, LiabilityId, SettlementId};
use uuid::Uuid;

mod creation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(VendorId::new(), VendorId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = SettlementId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = SettlementId::new_v7();
        assert!(id1 < id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = InvoiceId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }
}

mod formatting {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(VendorId::prefix(), "VND");
        assert_eq!(InvoiceId::prefix(), "INV");
        assert_eq!(PaymentId::prefix(), "PAY");
        assert_eq!(LiabilityId::prefix(), "LIA");
        assert_eq!(SettlementId::prefix(), "STL");
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        let original = PaymentId::new();
        let parsed: PaymentId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("INV-not-a-uuid".parse::<InvoiceId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let uuid = Uuid::from_u128(7);
        let id = LiabilityId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}

mod ordering {
    use super::*;

    #[test]
    fn test_sorting_is_by_uuid() {
        let mut ids = vec![
            LiabilityId::from_uuid(Uuid::from_u128(30)),
            LiabilityId::from_uuid(Uuid::from_u128(10)),
            LiabilityId::from_uuid(Uuid::from_u128(20)),
        ];
        ids.sort();
        let raw: Vec<u128> = ids.iter().map(|id| id.as_uuid().as_u128()).collect();
        assert_eq!(raw, vec![10, 20, 30]);
    }
}
