//! Tests for the call payload codec
//!
//! Payloads that do not decode are never fatal; these tests pin down which
//! payloads count as recognized calls.

use iou_ledger_core::chain::codec::{decode_call, encode_call, selector, DecodeError};
use iou_ledger_core::{Address, CallArg, FunctionName, LedgerCall};

fn addr(n: u8) -> Address {
    format!("0x{:040x}", n).parse().unwrap()
}

#[test]
fn test_decode_recovers_each_function() {
    let calls = vec![
        LedgerCall::RecordDebt {
            creditor: addr(2),
            amount: 10,
        },
        LedgerCall::ReduceDebt {
            debtor: addr(3),
            amount: u32::MAX,
        },
        LedgerCall::Lookup {
            debtor: addr(4),
            creditor: addr(5),
        },
    ];

    for call in calls {
        let decoded = decode_call(&encode_call(&call)).expect("known call should decode");
        assert_eq!(decoded, call);
    }
}

#[test]
fn test_decoded_args_in_declaration_order() {
    let call = LedgerCall::RecordDebt {
        creditor: addr(7),
        amount: 42,
    };
    assert_eq!(call.args(), vec![CallArg::Address(addr(7)), CallArg::Uint(42)]);
    assert_eq!(call.function(), FunctionName::RecordDebt);
    assert_eq!(call.function().as_str(), "record_debt");
}

#[test]
fn test_unknown_selector_rejected() {
    let mut payload = encode_call(&LedgerCall::RecordDebt {
        creditor: addr(2),
        amount: 1,
    });
    payload[0] ^= 0xff;

    assert!(matches!(
        decode_call(&payload),
        Err(DecodeError::UnknownSelector(_))
    ));
}

#[test]
fn test_truncated_payload_rejected() {
    assert!(matches!(
        decode_call(&[0x01, 0x02]),
        Err(DecodeError::Truncated { actual: 2, .. })
    ));

    let mut payload = selector(FunctionName::Lookup).to_vec();
    payload.extend_from_slice(&[0u8; 40]);
    assert!(matches!(
        decode_call(&payload),
        Err(DecodeError::Truncated { actual: 44, .. })
    ));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut payload = encode_call(&LedgerCall::Lookup {
        debtor: addr(1),
        creditor: addr(2),
    });
    payload.push(0);

    assert_eq!(decode_call(&payload), Err(DecodeError::TrailingBytes(1)));
}

#[test]
fn test_dirty_address_padding_rejected() {
    let mut payload = encode_call(&LedgerCall::Lookup {
        debtor: addr(1),
        creditor: addr(2),
    });
    // First padding byte of the first argument word
    payload[4] = 0x01;

    assert!(matches!(
        decode_call(&payload),
        Err(DecodeError::InvalidArgument { index: 0, .. })
    ));
}

#[test]
fn test_mixed_case_addresses_encode_identically() {
    let upper: Address = "0x00000000000000000000000000000000000000AB".parse().unwrap();
    let lower: Address = "0x00000000000000000000000000000000000000ab".parse().unwrap();

    let a = encode_call(&LedgerCall::RecordDebt {
        creditor: upper,
        amount: 5,
    });
    let b = encode_call(&LedgerCall::RecordDebt {
        creditor: lower,
        amount: 5,
    });
    assert_eq!(a, b);
}
